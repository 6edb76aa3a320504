use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::{RepackError, Result};

/// Where a region sits inside the cell the packer reserved for it.
///
/// The cell is the footprint plus `margin` on each axis, so the margin is
/// split between the sides according to this mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Offset 0: the whole margin goes to the right/bottom.
    TopLeft,
    /// Offset `margin / 2`.
    #[default]
    Center,
    /// Offset `margin`: the whole margin goes to the left/top.
    BottomRight,
}

impl Alignment {
    pub fn offset(self, margin: u32) -> u32 {
        match self {
            Self::TopLeft => 0,
            Self::Center => margin / 2,
            Self::BottomRight => margin,
        }
    }

    /// Maps the numeric codes `0`, `1`, `2` used on the command line.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::TopLeft),
            1 => Some(Self::Center),
            2 => Some(Self::BottomRight),
            _ => None,
        }
    }
}

impl FromStr for Alignment {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "0" | "top_left" | "topleft" | "tl" => Ok(Self::TopLeft),
            "1" | "center" | "centre" | "c" => Ok(Self::Center),
            "2" | "bottom_right" | "bottomright" | "br" => Ok(Self::BottomRight),
            _ => Err(()),
        }
    }
}

/// How regions are found in each input image.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RegionSource {
    /// Connected groups of non-transparent pixels.
    #[default]
    Islands,
    /// Named regions from the image's `.atlas` manifest; images without a
    /// usable manifest fall back to islands.
    Manifest,
}

impl FromStr for RegionSource {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "islands" | "island" | "pixels" => Ok(Self::Islands),
            "manifest" | "atlas" => Ok(Self::Manifest),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepackConfig {
    /// Sheet width in pixels (replaced by the square side when `min_square` is set).
    pub width: u32,
    /// Sheet height in pixels.
    pub height: u32,
    /// Extra pixels reserved per region on each axis (total, not per side).
    pub margin: u32,
    pub alignment: Alignment,
    /// Use 8-connectivity for island detection.
    pub diagonal: bool,
    pub region_source: RegionSource,
    /// Search the smallest square sheet whose side is a multiple of this value.
    pub min_square: Option<u32>,
    /// After sizing, grow the margin as far as the sheet allows.
    pub find_max_margin: bool,
    /// Spill regions that do not fit into additional sheets.
    pub multi_sheet: bool,
    /// Keep only manifest regions with these names (case-sensitive).
    pub name_filter: Option<BTreeSet<String>>,
}

impl Default for RepackConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            margin: 1,
            alignment: Alignment::Center,
            diagonal: false,
            region_source: RegionSource::Islands,
            min_square: None,
            find_max_margin: false,
            multi_sheet: false,
            name_filter: None,
        }
    }
}

impl RepackConfig {
    /// Checks the values the pipeline cannot work with.
    ///
    /// Sheet size is not checked when `min_square` picks it.
    pub fn validate(&self) -> Result<()> {
        if self.min_square.is_none() && (self.width == 0 || self.height == 0) {
            return Err(RepackError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.min_square == Some(0) {
            return Err(RepackError::InvalidConfig(
                "min_square multiple must be at least 1".into(),
            ));
        }
        if self.multi_sheet && self.min_square.is_some() {
            return Err(RepackError::InvalidConfig(
                "multi_sheet cannot be combined with min_square: the square always fits everything"
                    .into(),
            ));
        }
        if self.multi_sheet && self.find_max_margin {
            return Err(RepackError::InvalidConfig(
                "find_max_margin works on a single sheet and cannot be combined with multi_sheet"
                    .into(),
            ));
        }
        if let Some(filter) = &self.name_filter {
            if filter.is_empty() {
                return Err(RepackError::InvalidConfig(
                    "name_filter is set but empty; nothing would be packed".into(),
                ));
            }
        }
        Ok(())
    }

    /// Offset of each region inside its cell for the configured margin.
    pub fn offset(&self) -> u32 {
        self.alignment.offset(self.margin)
    }

    pub fn builder() -> RepackConfigBuilder {
        RepackConfigBuilder::new()
    }
}

/// Fluent construction of a [`RepackConfig`].
#[derive(Debug, Default, Clone)]
pub struct RepackConfigBuilder {
    cfg: RepackConfig,
}

impl RepackConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: RepackConfig::default(),
        }
    }
    pub fn with_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.width = w;
        self.cfg.height = h;
        self
    }
    pub fn margin(mut self, v: u32) -> Self {
        self.cfg.margin = v;
        self
    }
    pub fn alignment(mut self, v: Alignment) -> Self {
        self.cfg.alignment = v;
        self
    }
    pub fn diagonal(mut self, v: bool) -> Self {
        self.cfg.diagonal = v;
        self
    }
    pub fn region_source(mut self, v: RegionSource) -> Self {
        self.cfg.region_source = v;
        self
    }
    pub fn min_square(mut self, v: Option<u32>) -> Self {
        self.cfg.min_square = v;
        self
    }
    pub fn find_max_margin(mut self, v: bool) -> Self {
        self.cfg.find_max_margin = v;
        self
    }
    pub fn multi_sheet(mut self, v: bool) -> Self {
        self.cfg.multi_sheet = v;
        self
    }
    pub fn name_filter<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cfg.name_filter = Some(names.into_iter().map(Into::into).collect());
        self
    }
    pub fn build(self) -> RepackConfig {
        self.cfg
    }
}
