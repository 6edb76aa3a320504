//! Reader for `.atlas` region manifests (the libGDX / Spine text format).
//!
//! Only what is needed to locate regions is read: the region name, its
//! geometry (`bounds: x,y,w,h` or `xy: x,y` plus `size: w,h`) and `rotate`.
//! Page headers and every other attribute are skipped.

use std::collections::BTreeSet;
use std::io::BufRead;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ManifestErrorKind, RepackError, Result};
use crate::model::{PackBox, Rect};

/// Lines ending with one of these are page image names, not region names.
pub const IMAGE_SUFFIXES: [&str; 5] = [".png", ".webp", ".jpg", ".jpeg", ".gif"];

/// A named region read from a manifest.
///
/// `rect` holds the width/height exactly as written in the manifest; `rotate`
/// tells the packer and compositor to swap them for the output footprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasRegion {
    pub name: String,
    pub rect: Rect,
    pub rotate: bool,
}

impl AtlasRegion {
    pub fn to_box(&self, source_image: usize) -> PackBox {
        PackBox::new(source_image, self.rect, self.rotate).named(self.name.clone())
    }
}

/// Regions of one manifest in the order their names first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    regions: Vec<AtlasRegion>,
}

impl Manifest {
    pub fn regions(&self) -> &[AtlasRegion] {
        &self.regions
    }
    pub fn get(&self, name: &str) -> Option<&AtlasRegion> {
        self.regions.iter().find(|r| r.name == name)
    }
    pub fn len(&self) -> usize {
        self.regions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
    /// Converts every region into an unpacked box referencing `source_image`.
    pub fn to_boxes(&self, source_image: usize) -> Vec<PackBox> {
        self.regions.iter().map(|r| r.to_box(source_image)).collect()
    }

    /// Keeps only the regions whose name is in `allowed` (exact match).
    pub fn retain_names(&mut self, allowed: &BTreeSet<String>) {
        self.regions.retain(|r| allowed.contains(&r.name));
    }

    // A repeated name keeps its first position but takes the latest geometry.
    fn insert(&mut self, region: AtlasRegion) {
        match self.regions.iter_mut().find(|r| r.name == region.name) {
            Some(existing) => *existing = region,
            None => self.regions.push(region),
        }
    }
}

#[derive(Debug)]
struct PendingRegion {
    name: String,
    line: usize,
    rotate: bool,
    bounds: Option<Rect>,
    xy: Option<(u32, u32)>,
    size: Option<(u32, u32)>,
}

impl PendingRegion {
    fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            line,
            rotate: false,
            bounds: None,
            xy: None,
            size: None,
        }
    }

    fn finish(self) -> Result<AtlasRegion> {
        let rect = match (self.bounds, self.xy, self.size) {
            (Some(b), _, _) => b,
            (None, Some((x, y)), Some((w, h))) => Rect::new(x, y, w, h),
            _ => {
                return Err(manifest_error(
                    self.line,
                    &self.name,
                    ManifestErrorKind::MissingGeometry,
                ));
            }
        };
        Ok(AtlasRegion {
            name: self.name,
            rect,
            rotate: self.rotate,
        })
    }
}

/// Parses manifest text. See the module docs for the accepted subset.
pub fn parse_manifest(text: &str) -> Result<Manifest> {
    let mut parser = Parser::default();
    for (i, line) in text.lines().enumerate() {
        parser.line(i + 1, line)?;
    }
    parser.finish()
}

/// Same as [`parse_manifest`] but reads from a buffered stream.
pub fn parse_manifest_reader<R: BufRead>(reader: R) -> Result<Manifest> {
    let mut parser = Parser::default();
    for (i, line) in reader.lines().enumerate() {
        parser.line(i + 1, &line?)?;
    }
    parser.finish()
}

#[derive(Default)]
struct Parser {
    manifest: Manifest,
    current: Option<PendingRegion>,
}

impl Parser {
    fn line(&mut self, line_no: usize, raw: &str) -> Result<()> {
        let line = raw.trim();
        if line.is_empty() {
            return Ok(());
        }
        if is_image_name(line) {
            // a new page starts; its header attributes are not region data
            self.flush()?;
            return Ok(());
        }
        let Some((key, value)) = line.split_once(':') else {
            self.flush()?;
            self.current = Some(PendingRegion::new(line, line_no));
            return Ok(());
        };
        let Some(region) = self.current.as_mut() else {
            return Ok(());
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            warn!(line = line_no, content = line, "skipping malformed manifest line");
            return Ok(());
        }

        let fail = |kind| manifest_error(line_no, &region.name, kind);
        match key {
            "rotate" => region.rotate = matches!(value, "true" | "90"),
            "xy" => {
                let v = parse_ints(key, value, 2).map_err(fail)?;
                region.xy = Some((v[0], v[1]));
            }
            "size" => {
                let v = parse_ints(key, value, 2).map_err(fail)?;
                region.size = Some((v[0], v[1]));
            }
            "bounds" => {
                let v = parse_ints(key, value, 4).map_err(fail)?;
                region.bounds = Some(Rect::new(v[0], v[1], v[2], v[3]));
            }
            _ => {}
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(pending) = self.current.take() {
            self.manifest.insert(pending.finish()?);
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Manifest> {
        self.flush()?;
        Ok(self.manifest)
    }
}

fn manifest_error(line: usize, region: &str, kind: ManifestErrorKind) -> RepackError {
    RepackError::Manifest {
        line,
        region: region.to_string(),
        kind,
    }
}

fn is_image_name(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    IMAGE_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

fn parse_ints(
    key: &str,
    value: &str,
    expected: usize,
) -> std::result::Result<Vec<u32>, ManifestErrorKind> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != expected {
        return Err(ManifestErrorKind::WrongArity {
            key: key.to_string(),
            expected,
            found: parts.len(),
        });
    }
    parts
        .iter()
        .map(|p| {
            p.parse::<u32>().map_err(|_| ManifestErrorKind::InvalidNumber {
                key: key.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}
