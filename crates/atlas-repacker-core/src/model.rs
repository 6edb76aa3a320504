use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is the inclusive top-left corner;
/// `x + w`, `y + h` are the exclusive right/bottom edges.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Builds a rect from an inclusive min corner and an exclusive max corner.
    pub fn from_min_max(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            w: max_x.saturating_sub(min_x),
            h: max_y.saturating_sub(min_y),
        }
    }
    /// Exclusive right edge (`x + w`, saturating).
    pub fn max_x(&self) -> u32 {
        self.x.saturating_add(self.w)
    }
    /// Exclusive bottom edge (`y + h`, saturating).
    pub fn max_y(&self) -> u32 {
        self.y.saturating_add(self.h)
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.max_x() <= self.max_x() && r.max_y() <= self.max_y()
    }
    /// True if the two rects share at least one pixel. Empty rects never intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        !(self.x >= other.max_x()
            || other.x >= self.max_x()
            || self.y >= other.max_y()
            || other.y >= self.max_y())
    }
}

/// The packable unit: one island or one manifest region.
///
/// `source` is the canonical, unrotated rectangle inside `images[source_image]`
/// and never changes after construction. When `rotated` is set the region is
/// drawn turned 90° clockwise, so its footprint in the sheet is `source` with
/// width and height swapped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackBox {
    pub source_image: usize,
    source: Rect,
    pub rotated: bool,
    pub name: Option<String>,
    /// Placement within the sheet; only meaningful while `packed` is true.
    pub dest: Rect,
    pub packed: bool,
}

impl PackBox {
    pub fn new(source_image: usize, source: Rect, rotated: bool) -> Self {
        Self {
            source_image,
            source,
            rotated,
            name: None,
            dest: Rect::default(),
            packed: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn source(&self) -> Rect {
        self.source
    }

    /// Width/height the box occupies in the output sheet.
    pub fn footprint(&self) -> (u32, u32) {
        if self.rotated {
            (self.source.h, self.source.w)
        } else {
            (self.source.w, self.source.h)
        }
    }

    /// Cell reserved by the packer: the footprint grown by `margin` on each axis.
    pub fn reserved(&self, margin: u32) -> (u32, u32) {
        let (w, h) = self.footprint();
        (w.saturating_add(margin), h.saturating_add(margin))
    }

    /// Placement if the box was packed by the last attempt.
    pub fn placement(&self) -> Option<Rect> {
        self.packed.then_some(self.dest)
    }

    pub(crate) fn clear_placement(&mut self) {
        self.packed = false;
        self.dest = Rect::default();
    }

    pub(crate) fn place(&mut self, dest: Rect) {
        self.dest = dest;
        self.packed = true;
    }
}

/// Sum of reserved cell areas for `boxes` at the given margin.
pub fn reserved_area(boxes: &[PackBox], margin: u32) -> u64 {
    boxes
        .iter()
        .map(|b| {
            let (w, h) = b.reserved(margin);
            w as u64 * h as u64
        })
        .sum()
}

/// One output sheet and the boxes placed on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub id: usize,
    pub width: u32,
    pub height: u32,
    pub boxes: Vec<PackBox>,
}

/// Statistics about a repack run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    pub num_sheets: usize,
    pub num_packed: usize,
    pub num_unpacked: usize,
    /// Sum of `width * height` over all sheets.
    pub total_sheet_area: u64,
    /// Sum of visible region areas (margins excluded).
    pub used_area: u64,
    /// used_area / total_sheet_area (0.0 to 1.0).
    pub occupancy: f64,
    pub num_rotated: usize,
}

impl PackStats {
    pub fn from_sheets(sheets: &[Sheet], num_unpacked: usize) -> Self {
        let mut num_packed = 0;
        let mut total_sheet_area = 0u64;
        let mut used_area = 0u64;
        let mut num_rotated = 0;

        for sheet in sheets {
            total_sheet_area += sheet.width as u64 * sheet.height as u64;
            for b in sheet.boxes.iter().filter(|b| b.packed) {
                num_packed += 1;
                used_area += b.dest.area();
                if b.rotated {
                    num_rotated += 1;
                }
            }
        }

        let occupancy = if total_sheet_area > 0 {
            used_area as f64 / total_sheet_area as f64
        } else {
            0.0
        };

        Self {
            num_sheets: sheets.len(),
            num_packed,
            num_unpacked,
            total_sheet_area,
            used_area,
            occupancy,
            num_rotated,
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Sheets: {}, Packed: {}, Unpacked: {}, Occupancy: {:.2}%, Total Area: {} px², Used Area: {} px², Rotated: {}",
            self.num_sheets,
            self.num_packed,
            self.num_unpacked,
            self.occupancy * 100.0,
            self.total_sheet_area,
            self.used_area,
            self.num_rotated,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_sheet_area.saturating_sub(self.used_area)
    }
}
