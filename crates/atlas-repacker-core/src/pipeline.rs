use image::{DynamicImage, RgbaImage};
use tracing::{info, instrument, warn};

use crate::compositing::render_new_sheet;
use crate::config::{RegionSource, RepackConfig};
use crate::error::{RepackError, Result};
use crate::islands::{detect_islands, detect_islands_all};
use crate::manifest::parse_manifest;
use crate::model::{PackBox, PackStats, Sheet};
use crate::regions::{Regions, normalize};
use crate::search::{MarginSearch, SquareFit, find_max_margin, find_min_square};
use crate::sheets::{SheetLayout, pack_sheets, pack_single_sheet};

/// In-memory image to repack (key + decoded image + optional manifest text).
#[derive(Debug)]
pub struct InputImage {
    pub key: String,
    pub image: DynamicImage,
    /// Contents of the image's `.atlas` file, read when regions come from manifests.
    pub manifest: Option<String>,
}

impl InputImage {
    pub fn new(key: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            key: key.into(),
            image,
            manifest: None,
        }
    }

    pub fn with_manifest(mut self, text: impl Into<String>) -> Self {
        self.manifest = Some(text.into());
        self
    }
}

/// Rendered sheet and its placement record.
#[derive(Debug)]
pub struct OutputSheet {
    pub sheet: Sheet,
    pub rgba: RgbaImage,
}

/// Output of a repack run.
#[derive(Debug)]
pub struct RepackOutput {
    pub sheets: Vec<OutputSheet>,
    /// Boxes that fit on no sheet.
    pub unpacked: Vec<PackBox>,
    /// Input keys, indexed by `PackBox::source_image`.
    pub keys: Vec<String>,
    /// Final sheet size, after an optional square search.
    pub width: u32,
    pub height: u32,
    /// Final margin, after an optional margin search.
    pub margin: u32,
    pub offset: u32,
    /// Result of the square search when one was requested.
    pub square: Option<SquareFit>,
}

impl RepackOutput {
    pub fn stats(&self) -> PackStats {
        let sheets: Vec<Sheet> = self.sheets.iter().map(|s| s.sheet.clone()).collect();
        PackStats::from_sheets(&sheets, self.unpacked.len())
    }

    /// Every box of the run: packed ones sheet by sheet, then the unpacked ones.
    pub fn boxes(&self) -> impl Iterator<Item = &PackBox> {
        self.sheets
            .iter()
            .flat_map(|s| s.sheet.boxes.iter())
            .chain(self.unpacked.iter())
    }
}

/// Finds the regions of every input according to `cfg.region_source`.
///
/// A manifest that is missing or fails to parse is reported with a warning and
/// the image falls back to island detection. Islands carry no names, so a
/// name filter only applies to manifest regions.
pub fn detect_regions(inputs: &[InputImage], rgba: &[RgbaImage], cfg: &RepackConfig) -> Vec<Regions> {
    if cfg.region_source == RegionSource::Islands {
        if cfg.name_filter.is_some() {
            warn!("name filter ignored, islands have no names");
        }
        return detect_islands_all(rgba, cfg.diagonal)
            .into_iter()
            .map(Regions::Islands)
            .collect();
    }

    inputs
        .iter()
        .zip(rgba)
        .map(|(input, img)| {
            match input.manifest.as_deref().map(parse_manifest) {
                Some(Ok(mut manifest)) => {
                    if let Some(filter) = &cfg.name_filter {
                        manifest.retain_names(filter);
                    }
                    return Regions::Manifest(manifest);
                }
                Some(Err(e)) => {
                    warn!(key = %input.key, error = %e, "manifest rejected, detecting islands instead");
                }
                None => {
                    warn!(key = %input.key, "no manifest supplied, detecting islands instead");
                }
            }
            Regions::Islands(detect_islands(img, cfg.diagonal))
        })
        .collect()
}

/// Repacks the regions of `inputs` into new sheets using `cfg`.
///
/// Steps: find regions, flatten them into boxes, optionally search the
/// smallest square sheet, optionally grow the margin, lay the boxes out on one
/// or more sheets, then render every sheet.
#[instrument(skip_all)]
pub fn repack(inputs: Vec<InputImage>, cfg: RepackConfig) -> Result<RepackOutput> {
    cfg.validate()?;
    if inputs.is_empty() {
        return Err(RepackError::Empty);
    }

    let sources: Vec<RgbaImage> = inputs.iter().map(|i| i.image.to_rgba8()).collect();
    let regions = detect_regions(&inputs, &sources, &cfg);
    let mut boxes = normalize(&regions)?;
    info!(images = inputs.len(), boxes = boxes.len(), "regions collected");

    let (mut width, mut height) = (cfg.width, cfg.height);
    let mut margin = cfg.margin;
    let mut square = None;

    if let Some(multiple) = cfg.min_square {
        let fit = find_min_square(&mut boxes, multiple, margin, cfg.alignment.offset(margin))?;
        width = fit.side;
        height = fit.side;
        square = Some(fit);
    }

    if cfg.find_max_margin {
        match find_max_margin(&boxes, width, height, margin, cfg.alignment)? {
            MarginSearch::Found { margin: m, boxes: b } => {
                margin = m;
                boxes = b;
            }
            MarginSearch::Skipped { unpacked } => {
                warn!(unpacked, margin, "not everything fits at the starting margin, margin search skipped");
            }
        }
    }

    let offset = cfg.alignment.offset(margin);
    let SheetLayout { sheets, excluded } = if cfg.multi_sheet {
        pack_sheets(&boxes, width, height, margin, offset)
    } else {
        pack_single_sheet(&boxes, width, height, margin, offset)
    };
    if !excluded.is_empty() {
        warn!(count = excluded.len(), "boxes could not be packed");
    }

    let mut out_sheets = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        let rgba = render_new_sheet(&sources, &sheet.boxes, sheet.width, sheet.height)?;
        out_sheets.push(OutputSheet { sheet, rgba });
    }

    Ok(RepackOutput {
        sheets: out_sheets,
        unpacked: excluded,
        keys: inputs.into_iter().map(|i| i.key).collect(),
        width,
        height,
        margin,
        offset,
        square,
    })
}
