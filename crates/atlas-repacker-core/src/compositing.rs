use image::{Rgba, RgbaImage, imageops};

use crate::error::{RepackError, Result};
use crate::model::{PackBox, Rect};

/// Copies every packed box from its source image into `canvas`.
///
/// Rotated boxes are turned 90° clockwise into their `dest`. Unpacked boxes
/// are skipped. Pixels that land outside the canvas are dropped.
pub fn render_sheet(images: &[RgbaImage], boxes: &[PackBox], canvas: &mut RgbaImage) -> Result<()> {
    for b in boxes.iter().filter(|b| b.packed) {
        let src = source_image(images, b)?;
        blit_box(src, canvas, b);
    }
    Ok(())
}

/// Allocates a transparent `width` x `height` canvas and renders into it.
pub fn render_new_sheet(
    images: &[RgbaImage],
    boxes: &[PackBox],
    width: u32,
    height: u32,
) -> Result<RgbaImage> {
    let mut canvas = RgbaImage::new(width, height);
    render_sheet(images, boxes, &mut canvas)?;
    Ok(canvas)
}

fn source_image<'a>(images: &'a [RgbaImage], b: &PackBox) -> Result<&'a RgbaImage> {
    let img = images.get(b.source_image).ok_or(RepackError::MissingImage {
        index: b.source_image,
        count: images.len(),
    })?;
    let s = b.source();
    let bounds = Rect::new(0, 0, img.width(), img.height());
    if !bounds.contains(&s) {
        return Err(RepackError::SourceOutOfBounds {
            index: b.source_image,
            x: s.x,
            y: s.y,
            w: s.w,
            h: s.h,
            image_width: img.width(),
            image_height: img.height(),
        });
    }
    Ok(img)
}

fn blit_box(src: &RgbaImage, canvas: &mut RgbaImage, b: &PackBox) {
    let s = b.source();
    if s.is_empty() {
        return;
    }
    let block = imageops::crop_imm(src, s.x, s.y, s.w, s.h).to_image();
    let (dx, dy) = (i64::from(b.dest.x), i64::from(b.dest.y));
    if b.rotated {
        let turned = imageops::rotate90(&block);
        imageops::replace(canvas, &turned, dx, dy);
    } else {
        imageops::replace(canvas, &block, dx, dy);
    }
}

/// Which rectangle of each box [`debug_view`] draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugRects {
    /// Where the region was found in its source image.
    Source,
    /// Where the region was placed in the sheet (packed boxes only).
    Destination,
}

/// Draws the rectangles of the boxes that come from `image_index` as solid
/// white on a transparent `width` x `height` canvas.
pub fn debug_view(
    boxes: &[PackBox],
    width: u32,
    height: u32,
    rects: DebugRects,
    image_index: usize,
) -> RgbaImage {
    let mut canvas = RgbaImage::new(width, height);
    let white = Rgba([255, 255, 255, 255]);
    for b in boxes.iter().filter(|b| b.source_image == image_index) {
        let r = match rects {
            DebugRects::Source => b.source(),
            DebugRects::Destination => match b.placement() {
                Some(dest) => dest,
                None => continue,
            },
        };
        let (x1, y1) = (r.max_x().min(width), r.max_y().min(height));
        for y in r.y.min(y1)..y1 {
            for x in r.x.min(x1)..x1 {
                canvas.put_pixel(x, y, white);
            }
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_view_clips_to_canvas() {
        let b = PackBox::new(0, Rect::new(2, 2, 10, 10), false);
        let img = debug_view(&[b], 4, 4, DebugRects::Source, 0);
        assert_eq!(img.get_pixel(3, 3).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(1, 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn debug_view_only_draws_requested_image() {
        let a = PackBox::new(0, Rect::new(0, 0, 1, 1), false);
        let b = PackBox::new(1, Rect::new(1, 1, 1, 1), false);
        let img = debug_view(&[a, b], 2, 2, DebugRects::Source, 1);
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
        assert_eq!(img.get_pixel(1, 1).0[3], 255);
    }

    #[test]
    fn out_of_range_image_is_an_error() {
        let mut b = PackBox::new(2, Rect::new(0, 0, 1, 1), false);
        b.place(Rect::new(0, 0, 1, 1));
        let mut canvas = RgbaImage::new(4, 4);
        let err = render_sheet(&[RgbaImage::new(4, 4)], &[b], &mut canvas).unwrap_err();
        assert!(matches!(err, RepackError::MissingImage { index: 2, count: 1 }));
    }

    #[test]
    fn source_outside_image_is_an_error() {
        let mut b = PackBox::new(0, Rect::new(3, 3, 2, 2), false);
        b.place(Rect::new(0, 0, 2, 2));
        let mut canvas = RgbaImage::new(4, 4);
        assert!(matches!(
            render_sheet(&[RgbaImage::new(4, 4)], &[b], &mut canvas),
            Err(RepackError::SourceOutOfBounds { .. })
        ));
    }

    #[test]
    fn unpacked_boxes_are_not_checked_or_drawn() {
        let b = PackBox::new(9, Rect::new(0, 0, 1, 1), false);
        let mut canvas = RgbaImage::new(2, 2);
        render_sheet(&[], &[b], &mut canvas).unwrap();
        assert!(canvas.pixels().all(|p| p.0[3] == 0));
    }
}
