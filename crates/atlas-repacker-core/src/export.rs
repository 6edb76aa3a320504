use serde_json::{Value, json};

use crate::model::{PackBox, Rect};
use crate::pipeline::RepackOutput;

fn rect_json(r: &Rect) -> Value {
    json!({"x": r.x, "y": r.y, "w": r.w, "h": r.h})
}

fn region_json(b: &PackBox, keys: &[String]) -> Value {
    let mut v = json!({
        "name": b.name,
        "image": b.source_image,
        "imageKey": keys.get(b.source_image),
        "source": rect_json(&b.source()),
        "rotated": b.rotated,
    });
    if let Some(dest) = b.placement() {
        v["frame"] = rect_json(&dest);
    }
    v
}

/// Serializes the placements of a run as `{ sheets, unpacked, meta }`.
///
/// Each region carries its optional name, source image index and key, the
/// source rect, and (for packed regions) the `frame` rect in its sheet.
pub fn to_json(out: &RepackOutput) -> Value {
    let sheets: Vec<Value> = out
        .sheets
        .iter()
        .map(|s| {
            let regions: Vec<Value> = s.sheet.boxes.iter().map(|b| region_json(b, &out.keys)).collect();
            json!({
                "id": s.sheet.id,
                "width": s.sheet.width,
                "height": s.sheet.height,
                "regions": regions,
            })
        })
        .collect();
    let unpacked: Vec<Value> = out.unpacked.iter().map(|b| region_json(b, &out.keys)).collect();
    json!({
        "sheets": sheets,
        "unpacked": unpacked,
        "meta": {
            "app": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "images": &out.keys,
            "width": out.width,
            "height": out.height,
            "margin": out.margin,
            "offset": out.offset,
        },
    })
}
