use super::Packer;
use crate::model::Rect;

#[derive(Clone, Copy, Debug)]
struct SkylineNode {
    x: u32,
    y: u32,
    w: u32,
}

impl SkylineNode {
    /// Exclusive right edge.
    #[inline]
    fn right(&self) -> u32 {
        self.x + self.w
    }
}

/// Bottom-left skyline packer over a fixed `width` x `height` sheet.
///
/// Each placement picks the skyline segment that yields the lowest bottom
/// edge, breaking ties with the narrowest segment.
pub struct SkylinePacker {
    width: u32,
    height: u32,
    skylines: Vec<SkylineNode>,
}

impl SkylinePacker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            skylines: vec![SkylineNode { x: 0, y: 0, w: width }],
        }
    }

    fn can_put(&self, mut i: usize, w: u32, h: u32) -> Option<Rect> {
        let x = self.skylines[i].x;
        // origin must lie inside the sheet, even for an empty cell
        if x >= self.width || w > self.width - x {
            return None;
        }
        let mut y = 0;
        let mut width_left = w;
        loop {
            y = y.max(self.skylines[i].y);
            if y >= self.height || h > self.height - y {
                return None;
            }
            if self.skylines[i].w >= width_left {
                return Some(Rect::new(x, y, w, h));
            }
            width_left -= self.skylines[i].w;
            i += 1;
            if i >= self.skylines.len() {
                return None;
            }
        }
    }

    fn find_bottom_left(&self, w: u32, h: u32) -> Option<(usize, Rect)> {
        let mut best_bottom = u32::MAX;
        let mut best_width = u32::MAX;
        let mut best: Option<(usize, Rect)> = None;

        for i in 0..self.skylines.len() {
            if let Some(r) = self.can_put(i, w, h) {
                let bottom = r.max_y();
                if best.is_none()
                    || bottom < best_bottom
                    || (bottom == best_bottom && self.skylines[i].w < best_width)
                {
                    best_bottom = bottom;
                    best_width = self.skylines[i].w;
                    best = Some((i, r));
                }
            }
        }
        best
    }

    fn split(&mut self, index: usize, rect: &Rect) {
        let skyline = SkylineNode {
            x: rect.x,
            y: rect.max_y(),
            w: rect.w,
        };
        debug_assert!(skyline.right() <= self.width);
        debug_assert!(skyline.y <= self.height);

        self.skylines.insert(index, skyline);

        // trim the segments now covered by the new one
        let i = index + 1;
        while i < self.skylines.len() {
            let prev_right = self.skylines[i - 1].right();
            if self.skylines[i].x >= prev_right {
                break;
            }
            let shrink = prev_right - self.skylines[i].x;
            if self.skylines[i].w <= shrink {
                self.skylines.remove(i);
            } else {
                self.skylines[i].x += shrink;
                self.skylines[i].w -= shrink;
                break;
            }
        }
    }

    fn merge(&mut self) {
        let mut i = 1;
        while i < self.skylines.len() {
            if self.skylines[i - 1].y == self.skylines[i].y {
                let w = self.skylines[i].w;
                self.skylines[i - 1].w += w;
                self.skylines.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

impl Packer for SkylinePacker {
    fn pack(&mut self, w: u32, h: u32) -> Option<Rect> {
        let (i, place) = self.find_bottom_left(w, h)?;
        // empty cells take a position but no space
        if !place.is_empty() {
            self.split(i, &place);
            self.merge();
        }
        Some(place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_cell_lands_at_origin() {
        let mut p = SkylinePacker::new(100, 100);
        assert_eq!(p.pack(10, 20), Some(Rect::new(0, 0, 10, 20)));
        assert_eq!(p.pack(10, 10), Some(Rect::new(10, 0, 10, 10)));
    }

    #[test]
    fn fills_lowest_gap_first() {
        let mut p = SkylinePacker::new(30, 100);
        p.pack(10, 30).unwrap();
        p.pack(10, 10).unwrap();
        p.pack(10, 20).unwrap();
        // lowest skyline is the 10-high middle column
        assert_eq!(p.pack(10, 5), Some(Rect::new(10, 10, 10, 5)));
    }

    #[test]
    fn spans_multiple_segments() {
        let mut p = SkylinePacker::new(20, 50);
        p.pack(10, 10).unwrap();
        p.pack(10, 5).unwrap();
        assert_eq!(p.pack(20, 5), Some(Rect::new(0, 10, 20, 5)));
    }

    #[test]
    fn rejects_what_does_not_fit() {
        let mut p = SkylinePacker::new(16, 16);
        assert!(p.pack(17, 1).is_none());
        assert!(p.pack(1, 17).is_none());
        assert_eq!(p.pack(16, 16), Some(Rect::new(0, 0, 16, 16)));
        assert!(p.pack(1, 1).is_none());
    }

    #[test]
    fn exact_fit_to_bottom_edge_leaves_no_sliver() {
        let mut p = SkylinePacker::new(4, 4);
        p.pack(4, 3).unwrap();
        assert_eq!(p.pack(4, 1), Some(Rect::new(0, 3, 4, 1)));
        assert!(p.pack(1, 1).is_none());
    }

    #[test]
    fn empty_cells_do_not_consume_space() {
        let mut p = SkylinePacker::new(8, 8);
        assert!(p.pack(0, 0).is_some());
        assert_eq!(p.pack(8, 8), Some(Rect::new(0, 0, 8, 8)));
    }

    #[test]
    fn zero_sized_sheet_packs_nothing() {
        let mut p = SkylinePacker::new(0, 0);
        assert!(p.pack(1, 1).is_none());
        assert!(p.pack(0, 0).is_none());
    }

    #[test]
    fn empty_cell_on_full_sheet_is_rejected() {
        let mut p = SkylinePacker::new(4, 4);
        p.pack(4, 4).unwrap();
        assert!(p.pack(0, 0).is_none());
        assert!(p.pack(4, 0).is_none());
    }

    #[test]
    fn empty_cell_beside_full_column_stays_inside() {
        let mut p = SkylinePacker::new(4, 4);
        p.pack(2, 4).unwrap();
        assert_eq!(p.pack(0, 0), Some(Rect::new(2, 0, 0, 0)));
    }
}
