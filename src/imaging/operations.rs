//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they take
//! configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::fit_within;
use super::params::{Quality, ResizeParams, Sharpening, ThumbnailParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Plan a bounded resize without executing it.
pub fn plan_variant(
    source: &Path,
    output: &Path,
    original_dims: (u32, u32),
    bound: (u32, u32),
    quality: Quality,
) -> ResizeParams {
    let (width, height) = fit_within(original_dims, bound);
    ResizeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality,
    }
}

/// Write a copy of `source` scaled down to fit `bound`.
///
/// Returns the output dimensions.
pub fn create_variant(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    original_dims: (u32, u32),
    bound: (u32, u32),
    quality: Quality,
) -> Result<(u32, u32)> {
    let params = plan_variant(source, output, original_dims, bound, quality);
    backend.resize(&params)?;
    Ok((params.width, params.height))
}

/// Configuration for thumbnail generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailConfig {
    pub size: (u32, u32),
    pub crop: bool,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: (200, 200),
            crop: true,
            quality: Quality::default(),
            sharpening: Some(Sharpening::light()),
        }
    }
}

/// Plan a thumbnail operation without executing it.
pub fn plan_thumbnail(source: &Path, output: &Path, config: &ThumbnailConfig) -> ThumbnailParams {
    ThumbnailParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width: config.size.0,
        height: config.size.1,
        crop: config.crop,
        quality: config.quality,
        sharpening: config.sharpening,
    }
}

/// Create a thumbnail image at `output`.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    config: &ThumbnailConfig,
) -> Result<()> {
    let params = plan_thumbnail(source, output, config);
    backend.thumbnail(&params)
}
