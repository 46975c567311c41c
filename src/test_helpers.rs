//! Shared test utilities.
//!
//! Builds throwaway site trees under a [`tempfile::TempDir`] and provides
//! lookups that panic with a clear message on miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let site = setup_site(tmp.path());
//! add_image(&site, "harbour", "001-boats.jpg");
//!
//! let (gallery, _) = build_gallery(&backend, &site, &settings, "harbour").unwrap().unwrap();
//! let image = find_image(&gallery, "001-boats.jpg");
//! ```

use std::path::{Path, PathBuf};

use crate::config::SiteSettings;
use crate::gallery::{Gallery, GalleryImage};

// =========================================================================
// Fixture setup
// =========================================================================

/// Site rooted at `root`: content in `root/content`, output in `root/output`.
pub fn setup_site(root: &Path) -> SiteSettings {
    SiteSettings {
        path: root.join("content"),
        output_path: root.join("output"),
        gallery: None,
    }
}

/// Write a placeholder file into `<content>/images/gallery/<album>/<file>`.
///
/// Contents are unique per path so the content-addressed cache treats each
/// file as a distinct source.
pub fn add_image(site: &SiteSettings, album: &str, file: &str) -> PathBuf {
    let dir = site.path.join("images/gallery").join(album);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(file);
    std::fs::write(&path, format!("image data for {album}/{file}")).unwrap();
    path
}

/// Write a real JPEG with a gradient so encoders have something to chew on.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    let file = std::fs::File::create(path).unwrap();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 90);
    img.write_with_encoder(encoder).unwrap();
}

// =========================================================================
// Lookups
// =========================================================================

/// Find an image by filename. Panics if not found.
pub fn find_image<'a>(gallery: &'a Gallery, filename: &str) -> &'a GalleryImage {
    gallery.images.get(filename).unwrap_or_else(|| {
        let names: Vec<&str> = gallery.images.keys().map(String::as_str).collect();
        panic!(
            "image '{filename}' not found in gallery '{}'. Available: {names:?}",
            gallery.name
        )
    })
}
