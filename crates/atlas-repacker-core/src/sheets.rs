//! Spreading boxes over one or more sheets of a fixed size.

use tracing::{debug, warn};

use crate::model::{PackBox, Sheet};
use crate::packer::pack_boxes;

/// Result of laying boxes out on sheets.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    pub sheets: Vec<Sheet>,
    /// Boxes that could not be placed; their `packed` flag is false.
    pub excluded: Vec<PackBox>,
}

impl SheetLayout {
    pub fn unpacked(&self) -> usize {
        self.excluded.len()
    }
    pub fn packed(&self) -> usize {
        self.sheets.iter().map(|s| s.boxes.len()).sum()
    }
}

/// Packs `boxes` into as many `width` x `height` sheets as needed.
///
/// Each round packs the leftovers of the previous one into a fresh sheet. It
/// stops when everything is placed or a round places nothing, which means the
/// remaining boxes are larger than a sheet. The input slice is not modified.
pub fn pack_sheets(
    boxes: &[PackBox],
    width: u32,
    height: u32,
    margin: u32,
    offset: u32,
) -> SheetLayout {
    let mut remaining: Vec<PackBox> = boxes.to_vec();
    let mut sheets: Vec<Sheet> = Vec::new();
    let mut unpacked = remaining.len();

    while unpacked > 0 {
        let previous = unpacked;
        unpacked = pack_boxes(&mut remaining, width, height, margin, offset);
        if unpacked == previous {
            break;
        }
        let (placed, rest): (Vec<PackBox>, Vec<PackBox>) =
            remaining.into_iter().partition(|b| b.packed);
        debug!(sheet = sheets.len(), placed = placed.len(), left = rest.len(), "sheet filled");
        sheets.push(Sheet {
            id: sheets.len(),
            width,
            height,
            boxes: placed,
        });
        remaining = rest;
    }

    if !remaining.is_empty() {
        warn!(
            count = remaining.len(),
            width, height, margin, "boxes larger than a sheet were left out"
        );
    }
    SheetLayout {
        sheets,
        excluded: remaining,
    }
}

/// Packs `boxes` into exactly one sheet; whatever does not fit is excluded.
pub fn pack_single_sheet(
    boxes: &[PackBox],
    width: u32,
    height: u32,
    margin: u32,
    offset: u32,
) -> SheetLayout {
    let mut working: Vec<PackBox> = boxes.to_vec();
    pack_boxes(&mut working, width, height, margin, offset);
    let (placed, excluded): (Vec<PackBox>, Vec<PackBox>) =
        working.into_iter().partition(|b| b.packed);
    SheetLayout {
        sheets: vec![Sheet {
            id: 0,
            width,
            height,
            boxes: placed,
        }],
        excluded,
    }
}
