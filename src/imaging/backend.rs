//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the gallery
//! builder needs: identify, resize, and thumbnail. The production
//! implementation is [`RustBackend`](super::rust_backend::RustBackend); tests
//! use a recording mock.

use super::params::{ResizeParams, ThumbnailParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Get image dimensions without decoding the pixels.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Resize to the exact dimensions in `params`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;

    /// Produce a thumbnail (fill + center crop, or fit).
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;
}
