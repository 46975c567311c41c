//! Image processing on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Resize** | Lanczos3 `resize_exact` to a box-fitted size |
//! | **Thumbnail** | fill resize + center crop + `unsharpen` |
//!
//! The module is split into:
//! - **Calculations**: pure functions for dimension math (unit testable)
//! - **Parameters**: data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: high-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_fill_dimensions, center_crop_offset, fit_within};
pub use operations::{ThumbnailConfig, create_thumbnail, create_variant, get_dimensions};
pub use params::{Quality, ResizeParams, Sharpening, ThumbnailParams};
pub use rust_backend::RustBackend;
