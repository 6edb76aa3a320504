//! Core library for repacking sprite sheets into new atlases.
//!
//! - Regions: pixel islands (`detect_islands`) or `.atlas` manifests (`parse_manifest`)
//! - Packing: one skyline bottom-left strategy, spilled across sheets on request
//! - Searches: smallest square sheet (`find_min_square`) and largest margin (`find_max_margin`)
//! - Pipeline: `repack` takes in-memory images and returns rendered sheets + placements
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use atlas_repacker_core::{InputImage, RepackConfig, repack};
//! # fn main() -> anyhow::Result<()> {
//! let img = ImageReader::open("sprites.png")?.decode()?;
//! let cfg = RepackConfig::builder().with_dimensions(256, 256).margin(2).build();
//! let out = repack(vec![InputImage::new("sprites", img)], cfg)?;
//! println!("{}", out.stats().summary());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod islands;
pub mod manifest;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod regions;
pub mod search;
pub mod sheets;

pub use config::*;
pub use error::*;
pub use export::*;
pub use islands::*;
pub use manifest::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;
pub use regions::*;
pub use search::*;
pub use sheets::*;

/// Convenience prelude for common types and functions.
/// Importing `atlas_repacker_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::compositing::{DebugRects, debug_view, render_sheet};
    pub use crate::config::{Alignment, RegionSource, RepackConfig, RepackConfigBuilder};
    pub use crate::model::{PackBox, PackStats, Rect, Sheet};
    pub use crate::{
        InputImage, OutputSheet, RepackOutput, detect_islands, parse_manifest, repack, to_json,
    };
}
