//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image::ImageReader` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Thumbnail crop | fill resize + `DynamicImage::crop_imm` |
//! | Sharpening | `image::imageops::unsharpen` |
//! | Encode | JPEG (quality), PNG, lossless WebP, GIF, TIFF, AVIF (rav1e) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{calculate_fill_dimensions, center_crop_offset, fit_within};
use super::params::{ResizeParams, ThumbnailParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// AVIF encoder speed (1 = slowest/best, 10 = fastest).
const AVIF_SPEED: u8 = 6;

/// Backend built on the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Encode `img` to `path`, choosing the encoder from the file extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let encode_err =
        |e: image::ImageError| BackendError::ProcessingFailed(format!("{}: {}", path.display(), e));
    let ext = lowercase_extension(path);

    let writer = || -> Result<BufWriter<File>, BackendError> {
        Ok(BufWriter::new(File::create(path)?))
    };

    match ext.as_str() {
        "jpg" | "jpeg" => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(writer()?, quality as u8);
            rgb.write_with_encoder(encoder).map_err(encode_err)
        }
        "avif" => {
            let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(
                writer()?,
                AVIF_SPEED,
                quality as u8,
            );
            img.write_with_encoder(encoder).map_err(encode_err)
        }
        "webp" => {
            // The pure-Rust WebP encoder is lossless only and needs 8-bit RGB(A)
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(writer()?);
            rgba.write_with_encoder(encoder).map_err(encode_err)
        }
        "png" | "gif" | "tif" | "tiff" => {
            let format = ImageFormat::from_extension(&ext).ok_or_else(|| {
                BackendError::ProcessingFailed(format!("Unsupported output format: {ext}"))
            })?;
            let img = if format == ImageFormat::Gif {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                img.clone()
            };
            img.save_with_format(path, format).map_err(encode_err)
        }
        other => Err(BackendError::ProcessingFailed(format!(
            "Unsupported output format: {other}"
        ))),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::open(path)?
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Failed to read dimensions of {}: {}",
                    path.display(),
                    e
                ))
            })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = if (img.width(), img.height()) == (params.width, params.height) {
            img
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };
        save_image(&resized, &params.output, params.quality.value())
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let source = (img.width(), img.height());
        let target = (params.width, params.height);

        let scaled = if params.crop {
            let filled = calculate_fill_dimensions(source, target);
            let (x, y) = center_crop_offset(filled, target);
            img.resize_exact(filled.0, filled.1, FilterType::Lanczos3)
                .crop_imm(x, y, target.0, target.1)
        } else {
            let (w, h) = fit_within(source, target);
            img.resize_exact(w, h, FilterType::Lanczos3)
        };

        let final_img = match params.sharpening {
            Some(s) => scaled.unsharpen(s.sigma, s.threshold),
            None => scaled,
        };

        save_image(&final_img, &params.output, params.quality.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{Quality, Sharpening};
    use crate::test_helpers::create_test_jpeg;

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!((dims.width, dims.height), (200, 150));
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn identify_garbage_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("fake.jpg");
        std::fs::write(&path, "not an image").unwrap();
        assert!(RustBackend::new().identify(&path).is_err());
    }

    #[test]
    fn resize_jpeg_to_exact_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 400, 300);

        let output = tmp.path().join("resized.jpg");
        let backend = RustBackend::new();
        backend
            .resize(&ResizeParams {
                source,
                output: output.clone(),
                width: 200,
                height: 150,
                quality: Quality::new(80),
            })
            .unwrap();

        let dims = backend.identify(&output).unwrap();
        assert_eq!((dims.width, dims.height), (200, 150));
    }

    #[test]
    fn resize_to_png_and_webp() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 120, 80);
        let backend = RustBackend::new();

        for name in ["out.png", "out.webp"] {
            let output = tmp.path().join(name);
            backend
                .resize(&ResizeParams {
                    source: source.clone(),
                    output: output.clone(),
                    width: 60,
                    height: 40,
                    quality: Quality::default(),
                })
                .unwrap();
            let dims = backend.identify(&output).unwrap();
            assert_eq!((dims.width, dims.height), (60, 40), "{name}");
        }
    }

    #[test]
    fn resize_unsupported_format_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 100, 100);

        let result = RustBackend::new().resize(&ResizeParams {
            source,
            output: tmp.path().join("output.xyz"),
            width: 50,
            height: 50,
            quality: Quality::default(),
        });
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn thumbnail_crop_exact_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 800, 600);

        let output = tmp.path().join("thumb.jpg");
        let backend = RustBackend::new();
        backend
            .thumbnail(&ThumbnailParams {
                source,
                output: output.clone(),
                width: 200,
                height: 200,
                crop: true,
                quality: Quality::default(),
                sharpening: Some(Sharpening::light()),
            })
            .unwrap();

        let dims = backend.identify(&output).unwrap();
        assert_eq!((dims.width, dims.height), (200, 200));
    }

    #[test]
    fn thumbnail_fit_keeps_aspect() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 600, 800);

        let output = tmp.path().join("thumb.png");
        let backend = RustBackend::new();
        backend
            .thumbnail(&ThumbnailParams {
                source,
                output: output.clone(),
                width: 200,
                height: 200,
                crop: false,
                quality: Quality::default(),
                sharpening: None,
            })
            .unwrap();

        let dims = backend.identify(&output).unwrap();
        assert_eq!((dims.width, dims.height), (150, 200));
    }
}
