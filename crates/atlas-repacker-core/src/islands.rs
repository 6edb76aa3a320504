//! Island detection: bounding boxes of connected groups of non-transparent pixels.

use crate::model::Rect;
use image::RgbaImage;

const NEIGHBOURS_4: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const NEIGHBOURS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Row-major visited flags, one per pixel.
struct VisitedMap {
    data: Vec<bool>,
    width: usize,
}

impl VisitedMap {
    fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![false; width as usize * height as usize],
            width: width as usize,
        }
    }
    #[inline]
    fn get(&self, x: u32, y: u32) -> bool {
        self.data[y as usize * self.width + x as usize]
    }
    #[inline]
    fn set(&mut self, x: u32, y: u32) {
        self.data[y as usize * self.width + x as usize] = true;
    }
}

#[inline]
fn is_opaque(img: &RgbaImage, x: u32, y: u32) -> bool {
    img.get_pixel(x, y)[3] > 0
}

/// Finds every island in `img` and returns its bounding rect (max exclusive).
///
/// Pixels are scanned column by column (outer loop over x, inner over y), so
/// the output order is fixed for a given image. With `diagonal` set, pixels
/// touching only at a corner belong to the same island.
pub fn detect_islands(img: &RgbaImage, diagonal: bool) -> Vec<Rect> {
    let (w, h) = img.dimensions();
    let mut visited = VisitedMap::new(w, h);
    let mut stack: Vec<(u32, u32)> = Vec::new();
    let mut islands = Vec::new();
    for x in 0..w {
        for y in 0..h {
            if !visited.get(x, y) && is_opaque(img, x, y) {
                islands.push(flood_fill(img, x, y, diagonal, &mut visited, &mut stack));
            }
        }
    }
    islands
}

/// Runs [`detect_islands`] over each image; the outer index matches `images`.
pub fn detect_islands_all(images: &[RgbaImage], diagonal: bool) -> Vec<Vec<Rect>> {
    images
        .iter()
        .map(|img| detect_islands(img, diagonal))
        .collect()
}

fn flood_fill(
    img: &RgbaImage,
    seed_x: u32,
    seed_y: u32,
    diagonal: bool,
    visited: &mut VisitedMap,
    stack: &mut Vec<(u32, u32)>,
) -> Rect {
    let (w, h) = img.dimensions();
    let neighbours: &[(i32, i32)] = if diagonal {
        &NEIGHBOURS_8
    } else {
        &NEIGHBOURS_4
    };

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (seed_x, seed_y, seed_x, seed_y);
    stack.clear();
    stack.push((seed_x, seed_y));

    while let Some((x, y)) = stack.pop() {
        // a pixel can sit on the stack more than once
        if visited.get(x, y) {
            continue;
        }
        visited.set(x, y);
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);

        for &(dx, dy) in neighbours {
            let (Some(nx), Some(ny)) = (x.checked_add_signed(dx), y.checked_add_signed(dy)) else {
                continue;
            };
            if nx >= w || ny >= h {
                continue;
            }
            if !visited.get(nx, ny) && is_opaque(img, nx, ny) {
                stack.push((nx, ny));
            }
        }
    }

    Rect::from_min_max(min_x, min_y, max_x + 1, max_y + 1)
}
