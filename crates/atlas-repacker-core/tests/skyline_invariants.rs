use atlas_repacker_core::model::{PackBox, Rect};
use atlas_repacker_core::packer::pack_boxes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_boxes(seed: u64, count: usize, max_side: u32) -> Vec<PackBox> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let w = rng.gen_range(1..=max_side);
            let h = rng.gen_range(1..=max_side);
            let rotated = rng.gen_bool(0.25);
            PackBox::new(i % 3, Rect::new(0, 0, w, h), rotated)
        })
        .collect()
}

fn disjoint(rects: &[Rect]) -> bool {
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if rects[i].intersects(&rects[j]) {
                return false;
            }
        }
    }
    true
}

#[test]
fn placements_are_disjoint_and_inside_the_sheet() {
    for seed in 0..8 {
        let mut boxes = random_boxes(seed, 60, 40);
        let (w, h) = (200, 160);
        let margin = 3;
        let unpacked = pack_boxes(&mut boxes, w, h, margin, 1);

        let packed: Vec<&PackBox> = boxes.iter().filter(|b| b.packed).collect();
        assert_eq!(packed.len() + unpacked, boxes.len(), "seed {seed}");

        // the reserved cells (dest shifted back by the offset) never overlap
        let cells: Vec<Rect> = packed
            .iter()
            .map(|b| {
                let (rw, rh) = b.reserved(margin);
                Rect::new(b.dest.x - 1, b.dest.y - 1, rw, rh)
            })
            .collect();
        assert!(disjoint(&cells), "seed {seed}");

        let sheet = Rect::new(0, 0, w, h);
        for c in &cells {
            assert!(sheet.contains(c), "cell {c:?} outside sheet, seed {seed}");
        }
        for b in &packed {
            assert!(b.dest.x < w && b.dest.y < h, "dest {:?} outside sheet, seed {seed}", b.dest);
        }
    }
}

#[test]
fn empty_region_never_lands_past_the_sheet_edge() {
    let mut boxes = vec![
        PackBox::new(0, Rect::new(0, 0, 4, 4), false),
        PackBox::new(0, Rect::new(1, 1, 0, 0), false),
    ];
    let unpacked = pack_boxes(&mut boxes, 4, 4, 0, 0);
    assert_eq!(unpacked, 1);
    assert!(boxes[0].packed);
    assert!(!boxes[1].packed);

    // with room left the empty region is placed inside the sheet
    let unpacked = pack_boxes(&mut boxes, 6, 4, 0, 0);
    assert_eq!(unpacked, 0);
    assert!(boxes[1].dest.x < 6 && boxes[1].dest.y < 4);
}

#[test]
fn dest_size_follows_rotation() {
    let mut boxes = random_boxes(42, 30, 24);
    pack_boxes(&mut boxes, 256, 256, 0, 0);
    for b in boxes.iter().filter(|b| b.packed) {
        let s = b.source();
        if b.rotated {
            assert_eq!((b.dest.w, b.dest.h), (s.h, s.w));
        } else {
            assert_eq!((b.dest.w, b.dest.h), (s.w, s.h));
        }
    }
}

#[test]
fn packing_is_deterministic_and_keeps_order() {
    let original = random_boxes(7, 80, 32);
    let mut a = original.clone();
    let mut b = original.clone();
    pack_boxes(&mut a, 180, 180, 2, 1);
    pack_boxes(&mut b, 180, 180, 2, 1);
    assert_eq!(a, b);
    for (before, after) in original.iter().zip(&a) {
        assert_eq!(before.source(), after.source());
        assert_eq!(before.source_image, after.source_image);
    }
}

#[test]
fn repacking_clears_stale_placements() {
    let mut boxes = random_boxes(3, 20, 30);
    assert_eq!(pack_boxes(&mut boxes, 1024, 1024, 0, 0), 0);
    let unpacked = pack_boxes(&mut boxes, 40, 40, 0, 0);
    assert!(unpacked > 0);
    assert_eq!(boxes.iter().filter(|b| !b.packed).count(), unpacked);
}

#[test]
fn offset_is_clamped_to_margin() {
    let mut boxes = vec![PackBox::new(0, Rect::new(0, 0, 4, 4), false)];
    pack_boxes(&mut boxes, 16, 16, 2, 10);
    assert_eq!(boxes[0].dest, Rect::new(2, 2, 4, 4));
}

#[test]
fn margin_counts_once_per_axis() {
    // two 4x4 boxes with margin 2 need exactly 12 pixels of width
    let mut boxes = vec![
        PackBox::new(0, Rect::new(0, 0, 4, 4), false),
        PackBox::new(0, Rect::new(0, 0, 4, 4), false),
    ];
    assert_eq!(pack_boxes(&mut boxes, 12, 6, 2, 1), 0);
    assert_eq!(boxes[0].dest, Rect::new(1, 1, 4, 4));
    assert_eq!(boxes[1].dest, Rect::new(7, 1, 4, 4));
    assert_eq!(pack_boxes(&mut boxes, 11, 6, 2, 1), 1);
}
