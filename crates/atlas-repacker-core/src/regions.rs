//! Turns per-image region lists into one ordered box collection.

use crate::error::{RepackError, Result};
use crate::manifest::Manifest;
use crate::model::{PackBox, Rect};

/// Regions found in one input image, by whichever source produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regions {
    Islands(Vec<Rect>),
    Manifest(Manifest),
}

impl Regions {
    pub fn len(&self) -> usize {
        match self {
            Self::Islands(rects) => rects.len(),
            Self::Manifest(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Boxes for these regions, all pointing at `source_image`.
    pub fn to_boxes(&self, source_image: usize) -> Vec<PackBox> {
        match self {
            Self::Islands(rects) => rects
                .iter()
                .map(|r| PackBox::new(source_image, *r, false))
                .collect(),
            Self::Manifest(m) => m.to_boxes(source_image),
        }
    }
}

/// Flattens `per_image` into boxes: image 0's regions first, each in its own
/// order. An entry's position in `per_image` is the image index its boxes
/// refer to.
///
/// Fails with [`RepackError::Empty`] when no image contributed a region.
pub fn normalize(per_image: &[Regions]) -> Result<Vec<PackBox>> {
    let boxes: Vec<PackBox> = per_image
        .iter()
        .enumerate()
        .flat_map(|(i, regions)| regions.to_boxes(i))
        .collect();
    if boxes.is_empty() {
        return Err(RepackError::Empty);
    }
    Ok(boxes)
}
