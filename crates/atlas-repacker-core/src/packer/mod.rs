use tracing::debug;

use crate::model::{PackBox, Rect};

pub mod skyline;

use skyline::SkylinePacker;

/// A packer reserves rectangular cells inside one sheet.
///
/// Implementations must never hand out overlapping cells and must keep every
/// cell inside the sheet; an empty cell still gets an origin inside it.
/// `pack` returns `None` when the cell cannot be placed.
pub trait Packer {
    fn pack(&mut self, w: u32, h: u32) -> Option<Rect>;
}

/// Packs `boxes` in place into one `width` x `height` sheet and returns how
/// many did not fit.
///
/// Every box reserves its footprint plus `margin` on each axis; its `dest` is
/// the footprint-sized rect at `offset` pixels right and down from the cell
/// origin. `offset` is clamped to `margin` so content never leaves its cell.
/// Previous placements are cleared first. The slice order is never changed.
pub fn pack_boxes(boxes: &mut [PackBox], width: u32, height: u32, margin: u32, offset: u32) -> usize {
    let mut packer = SkylinePacker::new(width, height);
    pack_boxes_with(&mut packer, boxes, margin, offset)
}

/// Same as [`pack_boxes`] with a caller-supplied packer.
///
/// Boxes are offered tallest reserved cell first, then widest, with the slice
/// index breaking ties.
pub fn pack_boxes_with<P: Packer>(
    packer: &mut P,
    boxes: &mut [PackBox],
    margin: u32,
    offset: u32,
) -> usize {
    let offset = offset.min(margin);
    for b in boxes.iter_mut() {
        b.clear_placement();
    }

    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| {
        let (aw, ah) = boxes[a].reserved(margin);
        let (bw, bh) = boxes[b].reserved(margin);
        bh.cmp(&ah).then(bw.cmp(&aw)).then(a.cmp(&b))
    });

    let mut unpacked = 0;
    for idx in order {
        let (w, h) = boxes[idx].reserved(margin);
        match packer.pack(w, h) {
            Some(cell) => {
                let (fw, fh) = boxes[idx].footprint();
                boxes[idx].place(Rect::new(cell.x + offset, cell.y + offset, fw, fh));
            }
            None => unpacked += 1,
        }
    }
    debug!(
        boxes = boxes.len(),
        unpacked, margin, offset, "packing attempt finished"
    );
    unpacked
}
