use atlas_repacker_core::prelude::*;
use atlas_repacker_core::RepackError;

#[test]
fn defaults_match_the_command_line_tool() {
    let cfg = RepackConfig::default();
    assert_eq!((cfg.width, cfg.height), (512, 512));
    assert_eq!(cfg.margin, 1);
    assert_eq!(cfg.alignment, Alignment::Center);
    assert_eq!(cfg.offset(), 0);
    assert!(!cfg.diagonal);
    assert!(!cfg.multi_sheet);
    assert!(cfg.validate().is_ok());
}

#[test]
fn zero_sized_sheet_is_rejected() {
    let cfg = RepackConfig::builder().with_dimensions(0, 64).build();
    assert!(matches!(
        cfg.validate(),
        Err(RepackError::InvalidDimensions { width: 0, height: 64 })
    ));
    // the square search picks the size itself
    let cfg = RepackConfig::builder()
        .with_dimensions(0, 0)
        .min_square(Some(8))
        .build();
    assert!(cfg.validate().is_ok());
}

#[test]
fn conflicting_options_are_rejected() {
    let zero_multiple = RepackConfig::builder().min_square(Some(0)).build();
    assert!(matches!(zero_multiple.validate(), Err(RepackError::InvalidConfig(_))));

    let spill_and_square = RepackConfig::builder()
        .min_square(Some(4))
        .multi_sheet(true)
        .build();
    assert!(spill_and_square.validate().is_err());

    let spill_and_margin = RepackConfig::builder()
        .find_max_margin(true)
        .multi_sheet(true)
        .build();
    assert!(spill_and_margin.validate().is_err());

    let empty_filter = RepackConfig::builder().name_filter(Vec::<String>::new()).build();
    assert!(empty_filter.validate().is_err());
}

#[test]
fn alignment_codes_and_offsets() {
    assert_eq!("0".parse::<Alignment>(), Ok(Alignment::TopLeft));
    assert_eq!("Center".parse::<Alignment>(), Ok(Alignment::Center));
    assert_eq!("br".parse::<Alignment>(), Ok(Alignment::BottomRight));
    assert!("3".parse::<Alignment>().is_err());
    assert_eq!(Alignment::from_index(2), Some(Alignment::BottomRight));
    assert_eq!(Alignment::from_index(3), None);

    assert_eq!(Alignment::TopLeft.offset(5), 0);
    assert_eq!(Alignment::Center.offset(5), 2);
    assert_eq!(Alignment::BottomRight.offset(5), 5);
}

#[test]
fn region_source_parses() {
    assert_eq!("atlas".parse::<RegionSource>(), Ok(RegionSource::Manifest));
    assert_eq!("Islands".parse::<RegionSource>(), Ok(RegionSource::Islands));
    assert!("both".parse::<RegionSource>().is_err());
}

#[test]
fn partial_config_fills_in_defaults() {
    let cfg: RepackConfig =
        serde_json::from_str(r#"{"margin": 4, "alignment": "bottom_right", "name_filter": ["a"]}"#)
            .unwrap();
    assert_eq!(cfg.margin, 4);
    assert_eq!(cfg.offset(), 4);
    assert_eq!(cfg.width, 512);
    assert!(cfg.name_filter.unwrap().contains("a"));
}
