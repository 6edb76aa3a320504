use atlas_repacker_core::model::{PackBox, Rect};
use atlas_repacker_core::sheets::{pack_sheets, pack_single_sheet};

fn squares(n: usize, side: u32) -> Vec<PackBox> {
    (0..n)
        .map(|i| PackBox::new(0, Rect::new(i as u32 * side, 0, side, side), false))
        .collect()
}

#[test]
fn spills_leftovers_into_new_sheets() {
    // four 16x16 cells per 32x32 sheet
    let boxes = squares(10, 16);
    let layout = pack_sheets(&boxes, 32, 32, 0, 0);
    assert_eq!(layout.sheets.len(), 3);
    assert_eq!(layout.unpacked(), 0);
    assert_eq!(layout.packed(), 10);
    let per_sheet: Vec<usize> = layout.sheets.iter().map(|s| s.boxes.len()).collect();
    assert_eq!(per_sheet, [4, 4, 2]);
    for (i, s) in layout.sheets.iter().enumerate() {
        assert_eq!(s.id, i);
        assert!(s.boxes.iter().all(|b| b.packed));
    }
}

#[test]
fn input_is_left_untouched() {
    let boxes = squares(5, 8);
    let before = boxes.clone();
    let _ = pack_sheets(&boxes, 16, 16, 0, 0);
    assert_eq!(boxes, before);
}

#[test]
fn oversized_boxes_are_excluded_not_looped_on() {
    let mut boxes = squares(3, 8);
    boxes.push(PackBox::new(0, Rect::new(0, 0, 100, 4), false));
    let layout = pack_sheets(&boxes, 16, 16, 0, 0);
    assert_eq!(layout.sheets.len(), 1);
    assert_eq!(layout.unpacked(), 1);
    assert_eq!(layout.excluded[0].source().w, 100);
    assert!(!layout.excluded[0].packed);
}

#[test]
fn nothing_fits_gives_no_sheets() {
    let boxes = squares(2, 64);
    let layout = pack_sheets(&boxes, 16, 16, 0, 0);
    assert!(layout.sheets.is_empty());
    assert_eq!(layout.unpacked(), 2);
}

#[test]
fn single_sheet_reports_overflow() {
    let boxes = squares(6, 16);
    let layout = pack_single_sheet(&boxes, 32, 32, 0, 0);
    assert_eq!(layout.sheets.len(), 1);
    assert_eq!(layout.sheets[0].boxes.len(), 4);
    assert_eq!(layout.unpacked(), 2);
}
