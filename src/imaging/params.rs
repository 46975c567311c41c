//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how*. They sit between
//! [`operations`](super::operations), which decides which files to create, and
//! the [`backend`](super::backend), which does the pixel work.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Unsharp-mask parameters.
///
/// - `sigma`: standard deviation of the Gaussian blur
/// - `threshold`: minimum brightness difference to sharpen (0 = every pixel)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Light sharpening suitable for thumbnails.
    pub fn light() -> Self {
        Self {
            sigma: 0.5,
            threshold: 0,
        }
    }
}

/// Resize `source` to exactly `width`x`height` and write `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Thumbnail operation.
///
/// With `crop`, the source is scaled to cover `width`x`height` and
/// center-cropped to exactly that size. Without it, `width`x`height` is a
/// bounding box the thumbnail is scaled to fit.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub crop: bool,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
}
