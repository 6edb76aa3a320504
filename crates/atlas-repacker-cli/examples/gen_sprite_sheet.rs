use image::{Rgba, RgbaImage};
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

// Scattered sprites on a transparent sheet, with a matching .atlas manifest.
// Usage: cargo run --example gen_sprite_sheet -p atlas-repacker-cli -- <out_dir> [count] [size]
fn main() -> anyhow::Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        anyhow::bail!("usage: gen_sprite_sheet <out_dir> [count] [size]");
    }
    let out = PathBuf::from(&args[0]);
    let count: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(40);
    let size: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1024);
    fs::create_dir_all(&out)?;

    let mut rng = rand::rngs::StdRng::seed_from_u64(0xA71A5);
    let mut img = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 0]));
    let mut manifest = String::new();
    writeln!(manifest, "\nsprites.png\nsize: {size},{size}\nformat: RGBA8888\nfilter: Linear,Linear\nrepeat: none")?;

    // one sprite per grid cell keeps them apart; a 2px gap stops islands merging
    let cols = (count as f64).sqrt().ceil().max(1.0) as u32;
    let cell = size / cols;
    for i in 0..count as u32 {
        let (cx, cy) = ((i % cols) * cell, (i / cols) * cell);
        if cy + cell > size || cell < 8 {
            break;
        }
        let w = rng.gen_range(4..=cell - 2);
        let h = rng.gen_range(4..=cell - 2);
        let x = cx + rng.gen_range(0..=cell - 2 - w);
        let y = cy + rng.gen_range(0..=cell - 2 - h);
        let color = Rgba([rng.r#gen(), rng.r#gen(), rng.r#gen(), rng.gen_range(96..=255)]);

        // ellipse filling the sprite box, with its bounding rows/columns set so
        // the island bounds match the manifest exactly
        let (rx, ry) = (w as f32 / 2.0, h as f32 / 2.0);
        for yy in 0..h {
            for xx in 0..w {
                let dx = xx as f32 + 0.5 - rx;
                let dy = yy as f32 + 0.5 - ry;
                let inside = (dx * dx) / (rx * rx) + (dy * dy) / (ry * ry) <= 1.0;
                if inside || xx == w / 2 || yy == h / 2 {
                    img.put_pixel(x + xx, y + yy, color);
                }
            }
        }

        let rotate = rng.gen_bool(0.2);
        writeln!(manifest, "sprite_{i:03}")?;
        writeln!(manifest, "  rotate: {rotate}")?;
        writeln!(manifest, "  xy: {x}, {y}")?;
        writeln!(manifest, "  size: {w}, {h}")?;
        writeln!(manifest, "  orig: {w}, {h}")?;
        writeln!(manifest, "  offset: 0, 0")?;
        writeln!(manifest, "  index: -1")?;
    }

    let png = out.join("sprites.png");
    img.save(&png)?;
    fs::write(out.join("sprites.atlas"), manifest)?;
    println!("Done. Wrote {} and its .atlas manifest", png.display());
    Ok(())
}
