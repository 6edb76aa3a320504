//! Searches wrapped around the packer: smallest square sheet and largest margin.

use tracing::{debug, info, instrument};

use crate::config::Alignment;
use crate::error::{RepackError, Result};
use crate::model::{PackBox, reserved_area};
use crate::packer::pack_boxes;

/// Outcome of [`find_min_square`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareFit {
    /// Side of the smallest tested square that packed every box.
    pub side: u32,
    /// First side that was tried.
    pub start: u32,
    /// Number of packing attempts, including the successful one.
    pub attempts: u32,
}

/// Finds the smallest square, with a side that is a multiple of `multiple`,
/// that packs every box.
///
/// The search starts at `floor(sqrt(reserved area) / multiple) * multiple`
/// (which may be zero) and grows by `multiple` per attempt. On success the
/// boxes hold the placements of the winning square.
///
/// A square whose side reaches the total reserved width and the tallest
/// reserved height fits every box on a single skyline row, so sides past that
/// bound are never tried and [`RepackError::SearchExhausted`] is returned.
#[instrument(skip_all, fields(boxes = boxes.len(), multiple = multiple, margin = margin))]
pub fn find_min_square(
    boxes: &mut [PackBox],
    multiple: u32,
    margin: u32,
    offset: u32,
) -> Result<SquareFit> {
    if multiple == 0 {
        return Err(RepackError::InvalidConfig(
            "square side multiple must be at least 1".into(),
        ));
    }
    if boxes.is_empty() {
        return Err(RepackError::Empty);
    }

    let n = multiple as u64;
    let start = (reserved_area(boxes, margin).isqrt() / n) * n;
    let limit = square_bound(boxes, margin).div_ceil(n) * n;
    let Ok(start) = u32::try_from(start) else {
        return Err(RepackError::SearchExhausted {
            side: u32::MAX,
            limit: u32::MAX,
            unpacked: boxes.len(),
        });
    };
    let limit_u32 = u32::try_from(limit).unwrap_or(u32::MAX);

    let mut side = start;
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let unpacked = pack_boxes(boxes, side, side, margin, offset);
        debug!(side, unpacked, "square attempt");
        if unpacked == 0 {
            info!(side, attempts, start, "smallest square found");
            return Ok(SquareFit {
                side,
                start,
                attempts,
            });
        }
        let next = side.checked_add(multiple);
        match next {
            Some(next) if u64::from(next) <= limit => side = next,
            _ => {
                return Err(RepackError::SearchExhausted {
                    side,
                    limit: limit_u32,
                    unpacked,
                });
            }
        }
    }
}

fn square_bound(boxes: &[PackBox], margin: u32) -> u64 {
    let mut total_w = 0u64;
    let mut max_h = 0u64;
    for b in boxes {
        let (w, h) = b.reserved(margin);
        total_w += u64::from(w);
        max_h = max_h.max(u64::from(h));
    }
    // an empty cell still needs a one-pixel sheet to hold its origin
    total_w.max(max_h).max(1)
}

/// Outcome of [`find_max_margin`].
#[derive(Debug, Clone)]
pub enum MarginSearch {
    /// `margin` is the largest margin that still packs everything; `boxes`
    /// hold the placements made with it.
    Found { margin: u32, boxes: Vec<PackBox> },
    /// Nothing was searched because `unpacked` boxes already failed at the
    /// starting margin.
    Skipped { unpacked: usize },
}

/// Grows the margin from `start_margin` one pixel at a time while every box
/// still fits a `width` x `height` sheet.
///
/// Works on a copy of `boxes`. The offset for each margin comes from
/// `alignment`, so centered content stays centered as the margin grows.
#[instrument(skip_all, fields(boxes = boxes.len(), width = width, height = height, start_margin = start_margin))]
pub fn find_max_margin(
    boxes: &[PackBox],
    width: u32,
    height: u32,
    start_margin: u32,
    alignment: Alignment,
) -> Result<MarginSearch> {
    if boxes.is_empty() {
        return Err(RepackError::Empty);
    }
    let mut best: Vec<PackBox> = boxes.to_vec();
    let unpacked = pack_boxes(
        &mut best,
        width,
        height,
        start_margin,
        alignment.offset(start_margin),
    );
    if unpacked > 0 {
        info!(unpacked, start_margin, "margin search skipped");
        return Ok(MarginSearch::Skipped { unpacked });
    }

    let mut margin = start_margin;
    let mut trial = best.clone();
    while let Some(next) = margin.checked_add(1) {
        if pack_boxes(&mut trial, width, height, next, alignment.offset(next)) > 0 {
            break;
        }
        margin = next;
        best.clone_from(&trial);
    }
    info!(margin, "largest margin found");
    Ok(MarginSearch::Found {
        margin,
        boxes: best,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rect;

    fn square_boxes(n: usize, side: u32) -> Vec<PackBox> {
        (0..n)
            .map(|i| PackBox::new(0, Rect::new(0, 0, side, side), false).named(format!("b{i}")))
            .collect()
    }

    #[test]
    fn zero_multiple_is_rejected() {
        let mut boxes = square_boxes(1, 4);
        assert!(matches!(
            find_min_square(&mut boxes, 0, 0, 0),
            Err(RepackError::InvalidConfig(_))
        ));
    }

    #[test]
    fn exact_tiling_is_found_first_try() {
        let mut boxes = square_boxes(4, 8);
        let fit = find_min_square(&mut boxes, 16, 0, 0).unwrap();
        assert_eq!(fit.side, 16);
        assert_eq!(fit.attempts, 1);
        assert!(boxes.iter().all(|b| b.packed));
    }

    #[test]
    fn bound_covers_a_single_row() {
        let boxes = square_boxes(3, 5);
        assert_eq!(square_bound(&boxes, 1), 18);
    }

    #[test]
    fn empty_boxes_fit_the_first_nonzero_square() {
        let mut boxes = square_boxes(3, 0);
        let fit = find_min_square(&mut boxes, 8, 0, 0).unwrap();
        assert_eq!(fit.start, 0);
        assert_eq!(fit.side, 8);
        assert!(boxes.iter().all(|b| b.packed && b.dest.x < 8 && b.dest.y < 8));
    }

    #[test]
    fn margin_search_reports_skip() {
        let boxes = square_boxes(2, 10);
        let out = find_max_margin(&boxes, 10, 10, 0, Alignment::TopLeft).unwrap();
        assert!(matches!(out, MarginSearch::Skipped { unpacked: 1 }));
    }
}
