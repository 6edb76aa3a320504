use thiserror::Error;

/// What went wrong while reading a `.atlas` manifest.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestErrorKind {
    #[error("region has neither `bounds` nor both `xy` and `size`")]
    MissingGeometry,
    #[error("`{key}` expects {expected} comma separated values, got {found}")]
    WrongArity {
        key: String,
        expected: usize,
        found: usize,
    },
    #[error("`{key}` has a value that is not a non-negative integer: {value:?}")]
    InvalidNumber { key: String, value: String },
}

#[derive(Debug, Error)]
pub enum RepackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid sheet dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Manifest error at line {line} (region {region:?}): {kind}")]
    Manifest {
        line: usize,
        region: String,
        kind: ManifestErrorKind,
    },
    #[error("Nothing to pack: no regions were detected or loaded")]
    Empty,
    #[error("Box references image {index} but only {count} image(s) were supplied")]
    MissingImage { index: usize, count: usize },
    #[error(
        "Source rect {x},{y} {w}x{h} lies outside image {index} ({image_width}x{image_height})"
    )]
    SourceOutOfBounds {
        index: usize,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        image_width: u32,
        image_height: u32,
    },
    #[error("Square search gave up at side {side} (bound {limit}) with {unpacked} box(es) unpacked")]
    SearchExhausted {
        side: u32,
        limit: u32,
        unpacked: usize,
    },
}

pub type Result<T> = std::result::Result<T, RepackError>;
