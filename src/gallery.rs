//! Gallery building.
//!
//! Turns one album directory into a [`Gallery`]: every image is optionally
//! copied verbatim, rendered as a thumbnail, and rendered once per named size.
//!
//! ## Output Structure
//!
//! ```text
//! <output_path>/<output_dir>/
//! ├── .cache-manifest.json
//! └── harbour/
//!     ├── 001-boats.jpg          # Copied original (copy_originals)
//!     ├── thumbnails/
//!     │   └── 001-boats.jpg      # [thumbnail] size, cropped or fitted
//!     ├── large/
//!     │   └── 001-boats.jpg      # Fits [sizes] large, never upscaled
//!     └── medium/
//!         └── 001-boats.jpg
//! ```
//!
//! With a `format` other than `source`, thumbnails and sizes take that
//! format's extension (`001-boats.webp`). Originals are always copied as is.
//!
//! Paths recorded in the gallery are `/`-joined and relative to the site's
//! `output_path`, ready to use as URLs.

use crate::cache::{self, CacheManifest, CacheStats, Lookup};
use crate::config::{
    self, ConfigError, GallerySettings, SiteSettings, THUMBNAIL_DIR, resolve_gallery_settings,
};
use crate::imaging::{
    BackendError, ImageBackend, Quality, Sharpening, ThumbnailConfig, create_thumbnail,
    create_variant, get_dimensions,
};
use crate::naming;
use crate::scan::{self, ScanError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid gallery name: {0:?}")]
    InvalidName(String),
    #[error("{first:?} and {second:?} would both render to {output:?}")]
    OutputCollision {
        first: String,
        second: String,
        output: String,
    },
}

/// A built gallery: the album name and its images keyed by filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gallery {
    pub name: String,
    pub images: BTreeMap<String, GalleryImage>,
}

impl Gallery {
    /// Images in display order (`NNN-` prefix first, then by name).
    pub fn ordered(&self) -> Vec<&GalleryImage> {
        let mut images: Vec<&GalleryImage> = self.images.values().collect();
        images.sort_by(|a, b| naming::compare_entries(&a.filename, &b.filename));
        images
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    /// Source filename inside the album directory.
    pub filename: String,
    pub title: String,
    /// Source dimensions.
    pub width: u32,
    pub height: u32,
    /// Copied original, when `copy_originals` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    pub thumbnail: String,
    /// Size name → resized file.
    pub sizes: BTreeMap<String, String>,
    /// Best full-size target: the original, else the largest size, else the
    /// thumbnail.
    pub link: String,
}

/// What a build did, for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub images: usize,
    pub cache: CacheStats,
}

/// Reject names that would escape the gallery root.
pub fn validate_name(name: &str) -> Result<(), GalleryError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(GalleryError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Join URL path segments with `/`, dropping empty ones.
fn url_path(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Output filename per source image for rendered (non-original) files.
///
/// A `format` other than `source` swaps the extension. Sources sharing a stem
/// keep their own extension in front (`boats.jpg.png`, `boats.png.png`).
fn rendered_filenames(
    filenames: &[String],
    settings: &GallerySettings,
) -> Result<Vec<String>, GalleryError> {
    let Some(ext) = settings.format.extension() else {
        return Ok(filenames.to_vec());
    };
    let stem = |filename: &str| {
        Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| filename.to_string())
    };

    let mut stems: BTreeMap<String, usize> = BTreeMap::new();
    for filename in filenames {
        *stems.entry(stem(filename)).or_default() += 1;
    }
    let rendered: Vec<String> = filenames
        .iter()
        .map(|filename| {
            let stem = stem(filename);
            if stems[&stem] > 1 {
                format!("{filename}.{ext}")
            } else {
                format!("{stem}.{ext}")
            }
        })
        .collect();

    let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
    for (filename, output) in filenames.iter().zip(&rendered) {
        if let Some(first) = owners.insert(output, filename) {
            return Err(GalleryError::OutputCollision {
                first: first.to_string(),
                second: filename.clone(),
                output: output.clone(),
            });
        }
    }
    Ok(rendered)
}

fn output_extension(rendered: &str) -> String {
    Path::new(rendered)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Cache bookkeeping around each output file of one build.
struct CachedWriter<'a> {
    output_root: &'a Path,
    manifest: Option<CacheManifest>,
    stats: CacheStats,
}

impl CachedWriter<'_> {
    /// Produce `rel` (relative to the gallery output root), skipping `render`
    /// when the cache already holds this content.
    fn write(
        &mut self,
        rel: &str,
        source_hash: &str,
        params_hash: String,
        render: impl FnOnce(&Path) -> Result<(), GalleryError>,
    ) -> Result<(), GalleryError> {
        if let Some(manifest) = &mut self.manifest {
            let lookup = manifest.lookup(rel, source_hash, &params_hash, self.output_root)?;
            if lookup == Lookup::Copied {
                manifest.insert(rel.to_string(), source_hash.to_string(), params_hash.clone());
            }
            if lookup != Lookup::Miss {
                debug!(output = rel, ?lookup, "cache");
                self.stats.record(lookup);
                return Ok(());
            }
        }

        let dest = self.output_root.join(rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        render(&dest)?;
        debug!(output = rel, "rendered");
        self.stats.record(Lookup::Miss);

        if let Some(manifest) = &mut self.manifest {
            manifest.insert(rel.to_string(), source_hash.to_string(), params_hash);
        }
        Ok(())
    }
}

/// Build gallery `name` with already-resolved settings.
///
/// Returns `Ok(None)` when `<path>/<content_dir>/<name>` is not a directory.
pub fn build_gallery(
    backend: &impl ImageBackend,
    site: &SiteSettings,
    settings: &GallerySettings,
    name: &str,
) -> Result<Option<(Gallery, BuildReport)>, GalleryError> {
    validate_name(name)?;

    let album_dir = site.gallery_content_root(settings).join(name);
    if !album_dir.is_dir() {
        debug!(gallery = name, dir = %album_dir.display(), "no such album");
        return Ok(None);
    }

    let output_root = site.gallery_output_root(settings);
    let mut writer = CachedWriter {
        output_root: &output_root,
        manifest: settings
            .use_cache
            .then(|| CacheManifest::load(&output_root)),
        stats: CacheStats::default(),
    };

    let quality = Quality::new(settings.quality);
    let thumb_size = (settings.thumbnail.size[0], settings.thumbnail.size[1]);
    let thumbnail_config = ThumbnailConfig {
        size: thumb_size,
        crop: settings.thumbnail.crop,
        quality,
        sharpening: settings.thumbnail.sharpen.then(Sharpening::light),
    };

    let filenames = scan::list_images(&album_dir, settings)?;
    let rendered_names = rendered_filenames(&filenames, settings)?;

    let mut images = BTreeMap::new();
    for (filename, rendered) in filenames.into_iter().zip(rendered_names) {
        let source = album_dir.join(&filename);
        let dims = get_dimensions(backend, &source)?;
        let source_hash = if settings.use_cache {
            cache::hash_file(&source)?
        } else {
            String::new()
        };
        let ext = output_extension(&rendered);

        let original = if settings.copy_originals {
            let rel = url_path(&[name, filename.as_str()]);
            writer.write(&rel, &source_hash, cache::hash_original_params(), |dest| {
                std::fs::copy(&source, dest)?;
                Ok(())
            })?;
            Some(url_path(&[settings.output_dir.as_str(), rel.as_str()]))
        } else {
            None
        };

        let rel = url_path(&[name, THUMBNAIL_DIR, rendered.as_str()]);
        let params_hash = cache::hash_thumbnail_params(
            thumb_size,
            thumbnail_config.crop,
            quality.value(),
            thumbnail_config.sharpening.map(|s| (s.sigma, s.threshold)),
            &ext,
        );
        writer.write(&rel, &source_hash, params_hash, |dest| {
            Ok(create_thumbnail(backend, &source, dest, &thumbnail_config)?)
        })?;
        let thumbnail = url_path(&[settings.output_dir.as_str(), rel.as_str()]);

        let mut sizes = BTreeMap::new();
        for (size_name, bound) in &settings.sizes {
            let bound = (bound[0], bound[1]);
            let rel = url_path(&[name, size_name.as_str(), rendered.as_str()]);
            let params_hash = cache::hash_variant_params(bound, quality.value(), &ext);
            writer.write(&rel, &source_hash, params_hash, |dest| {
                create_variant(backend, &source, dest, dims, bound, quality)?;
                Ok(())
            })?;
            sizes.insert(
                size_name.clone(),
                url_path(&[settings.output_dir.as_str(), rel.as_str()]),
            );
        }

        let link = original
            .clone()
            .or_else(|| largest_size(settings, &sizes))
            .unwrap_or_else(|| thumbnail.clone());

        images.insert(
            filename.clone(),
            GalleryImage {
                title: naming::image_title(&filename),
                filename,
                width: dims.0,
                height: dims.1,
                original,
                thumbnail,
                sizes,
                link,
            },
        );
    }

    if let Some(manifest) = &writer.manifest {
        manifest.save(&output_root)?;
    }

    let report = BuildReport {
        images: images.len(),
        cache: writer.stats,
    };
    info!(gallery = name, images = report.images, cache = %report.cache, "built gallery");

    Ok(Some((
        Gallery {
            name: name.to_string(),
            images,
        },
        report,
    )))
}

/// Path of the size with the biggest bounding box.
fn largest_size(settings: &GallerySettings, sizes: &BTreeMap<String, String>) -> Option<String> {
    settings
        .sizes
        .iter()
        .max_by_key(|(_, bound)| u64::from(bound[0]) * u64::from(bound[1]))
        .and_then(|(size_name, _)| sizes.get(size_name).cloned())
}

/// Merge settings (defaults < site `[gallery]` < `params`) and build `name`.
pub fn get_gallery(
    backend: &impl ImageBackend,
    site: &SiteSettings,
    name: &str,
    params: Option<&toml::Table>,
) -> Result<Option<(Gallery, BuildReport)>, GalleryError> {
    let settings = resolve_gallery_settings(site, params)?;
    build_gallery(backend, site, &settings, name)
}

/// Build every album under the gallery root, in display order.
pub fn build_all(
    backend: &impl ImageBackend,
    site: &SiteSettings,
    settings: &GallerySettings,
) -> Result<Vec<(Gallery, BuildReport)>, GalleryError> {
    let mut built = Vec::new();
    for album in scan::list_albums(&site.gallery_content_root(settings))? {
        if let Some(result) = build_gallery(backend, site, settings, &album)? {
            built.push(result);
        }
    }
    Ok(built)
}

/// Override table for a single setting, as used by `params`.
pub fn params_from_pairs<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> toml::Table {
    let mut table = toml::Table::new();
    for (key, raw) in pairs {
        config::insert_override(&mut table, key, config::parse_override_value(raw));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{add_image, find_image, setup_site};
    use tempfile::TempDir;

    fn build(
        backend: &MockBackend,
        site: &SiteSettings,
        settings: &GallerySettings,
        name: &str,
    ) -> (Gallery, BuildReport) {
        build_gallery(backend, site, settings, name).unwrap().unwrap()
    }

    #[test]
    fn missing_album_is_none() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        let backend = MockBackend::with_dimensions(800, 600);

        let result = build_gallery(&backend, &site, &GallerySettings::default(), "nope").unwrap();
        assert!(result.is_none());
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn file_instead_of_album_is_none() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "boats.jpg");
        let not_a_dir = site.path.join("images/gallery/stray.jpg");
        std::fs::write(not_a_dir, "x").unwrap();

        let backend = MockBackend::with_dimensions(800, 600);
        let result =
            build_gallery(&backend, &site, &GallerySettings::default(), "stray.jpg").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn escaping_names_rejected() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        let backend = MockBackend::new();
        for name in ["", "..", "a/b", "..\\up"] {
            let err = build_gallery(&backend, &site, &GallerySettings::default(), name)
                .unwrap_err();
            assert!(matches!(err, GalleryError::InvalidName(_)), "{name}");
        }
    }

    #[test]
    fn builds_original_thumbnail_and_sizes() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "001-boats.jpg");
        let backend = MockBackend::with_dimensions(1600, 1200);

        let (gallery, report) = build(&backend, &site, &GallerySettings::default(), "harbour");
        assert_eq!(gallery.name, "harbour");
        assert_eq!(report.images, 1);

        let image = find_image(&gallery, "001-boats.jpg");
        assert_eq!(image.title, "boats");
        assert_eq!((image.width, image.height), (1600, 1200));
        assert_eq!(
            image.original.as_deref(),
            Some("images/gallery/harbour/001-boats.jpg")
        );
        assert_eq!(
            image.thumbnail,
            "images/gallery/harbour/thumbnails/001-boats.jpg"
        );
        assert_eq!(
            image.sizes["large"],
            "images/gallery/harbour/large/001-boats.jpg"
        );
        assert_eq!(
            image.sizes["medium"],
            "images/gallery/harbour/medium/001-boats.jpg"
        );
        assert_eq!(image.link, "images/gallery/harbour/001-boats.jpg");

        let original = image.original.as_ref().unwrap();
        for rel in [&image.thumbnail, &image.sizes["large"], original] {
            assert!(site.output_path.join(rel).exists(), "{rel}");
        }
    }

    #[test]
    fn variants_never_upscale() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "small", "tiny.png");
        let backend = MockBackend::with_dimensions(640, 480);

        build(&backend, &site, &GallerySettings::default(), "small");

        let resizes: Vec<_> = backend
            .get_operations()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Resize { width, height, .. } => Some((width, height)),
                _ => None,
            })
            .collect();
        assert_eq!(resizes, vec![(640, 480), (640, 480)]);
    }

    #[test]
    fn thumbnail_uses_configured_box() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "boats.jpg");
        let backend = MockBackend::with_dimensions(1600, 1200);
        let mut settings = GallerySettings::default();
        settings.thumbnail.size = [150, 100];
        settings.thumbnail.sharpen = false;

        build(&backend, &site, &settings, "harbour");

        let thumb = backend
            .get_operations()
            .into_iter()
            .find(|op| matches!(op, RecordedOp::Thumbnail { .. }))
            .unwrap();
        assert!(matches!(
            thumb,
            RecordedOp::Thumbnail {
                width: 150,
                height: 100,
                crop: true,
                sharpening: None,
                ..
            }
        ));
    }

    #[test]
    fn without_originals_link_is_largest_size() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "boats.jpg");
        let backend = MockBackend::with_dimensions(1600, 1200);
        let settings = GallerySettings {
            copy_originals: false,
            ..GallerySettings::default()
        };

        let (gallery, _) = build(&backend, &site, &settings, "harbour");
        let image = find_image(&gallery, "boats.jpg");
        assert_eq!(image.original, None);
        assert_eq!(image.link, "images/gallery/harbour/large/boats.jpg");
        assert!(!site.output_path.join("images/gallery/harbour/boats.jpg").exists());
    }

    #[test]
    fn without_sizes_link_is_thumbnail() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "boats.jpg");
        let backend = MockBackend::with_dimensions(1600, 1200);
        let settings = GallerySettings {
            copy_originals: false,
            sizes: BTreeMap::new(),
            ..GallerySettings::default()
        };

        let (gallery, _) = build(&backend, &site, &settings, "harbour");
        let image = find_image(&gallery, "boats.jpg");
        assert_eq!(image.link, image.thumbnail);
    }

    #[test]
    fn output_format_replaces_extension() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "boats.JPG");
        let backend = MockBackend::with_dimensions(1600, 1200);
        let settings = GallerySettings {
            format: OutputFormat::Webp,
            ..GallerySettings::default()
        };

        let (gallery, _) = build(&backend, &site, &settings, "harbour");
        let image = &gallery.images["boats.JPG"];
        assert_eq!(
            image.thumbnail,
            "images/gallery/harbour/thumbnails/boats.webp"
        );
        assert_eq!(image.sizes["medium"], "images/gallery/harbour/medium/boats.webp");
        // Originals keep their own format
        assert_eq!(
            image.original.as_deref(),
            Some("images/gallery/harbour/boats.JPG")
        );
    }

    #[test]
    fn shared_stems_keep_source_extension() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "boats.jpg");
        add_image(&site, "harbour", "boats.png");
        add_image(&site, "harbour", "pier.jpg");
        let backend = MockBackend::with_dimensions(300, 100);
        let settings = GallerySettings {
            format: OutputFormat::Png,
            ..GallerySettings::default()
        };

        let (gallery, report) = build(&backend, &site, &settings, "harbour");
        assert_eq!(report.images, 3);
        let jpg = &gallery.images["boats.jpg"];
        let png = &gallery.images["boats.png"];
        assert_eq!(jpg.thumbnail, "images/gallery/harbour/thumbnails/boats.jpg.png");
        assert_eq!(png.thumbnail, "images/gallery/harbour/thumbnails/boats.png.png");
        assert_eq!(jpg.sizes["large"], "images/gallery/harbour/large/boats.jpg.png");
        assert_eq!(png.sizes["large"], "images/gallery/harbour/large/boats.png.png");
        assert_eq!(
            gallery.images["pier.jpg"].thumbnail,
            "images/gallery/harbour/thumbnails/pier.png"
        );

        // Every rendered output is distinct
        let mut outputs: Vec<&str> = gallery
            .images
            .values()
            .flat_map(|i| {
                std::iter::once(i.thumbnail.as_str()).chain(i.sizes.values().map(String::as_str))
            })
            .collect();
        let total = outputs.len();
        outputs.sort();
        outputs.dedup();
        assert_eq!(outputs.len(), total);
    }

    #[test]
    fn shared_stems_untouched_for_source_format() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "boats.jpg");
        add_image(&site, "harbour", "boats.png");
        let backend = MockBackend::with_dimensions(300, 100);

        let (gallery, _) = build(&backend, &site, &GallerySettings::default(), "harbour");
        assert_eq!(
            gallery.images["boats.png"].thumbnail,
            "images/gallery/harbour/thumbnails/boats.png"
        );
    }

    #[test]
    fn unresolvable_output_name_rejected() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        // `boats.jpg` and `boats.png` fall back to `boats.jpg.png`, which is
        // also what `boats.jpg.png` itself renders to
        add_image(&site, "harbour", "boats.jpg");
        add_image(&site, "harbour", "boats.png");
        add_image(&site, "harbour", "boats.jpg.png");
        let backend = MockBackend::with_dimensions(300, 100);
        let settings = GallerySettings {
            format: OutputFormat::Png,
            ..GallerySettings::default()
        };

        let err = build_gallery(&backend, &site, &settings, "harbour").unwrap_err();
        assert!(matches!(err, GalleryError::OutputCollision { .. }), "{err}");
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn only_image_files_become_entries() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "boats.jpg");
        add_image(&site, "harbour", "notes.txt");
        std::fs::create_dir_all(site.path.join("images/gallery/harbour/raw")).unwrap();
        let backend = MockBackend::with_dimensions(100, 100);

        let (gallery, _) = build(&backend, &site, &GallerySettings::default(), "harbour");
        assert_eq!(gallery.images.keys().collect::<Vec<_>>(), vec!["boats.jpg"]);
    }

    #[test]
    fn empty_album_builds_empty_gallery() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        std::fs::create_dir_all(site.path.join("images/gallery/empty")).unwrap();
        let backend = MockBackend::new();

        let (gallery, report) = build(&backend, &site, &GallerySettings::default(), "empty");
        assert!(gallery.images.is_empty());
        assert_eq!(report.images, 0);
    }

    #[test]
    fn second_build_hits_cache() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "boats.jpg");
        add_image(&site, "harbour", "pier.jpg");
        let settings = GallerySettings::default();

        let first = MockBackend::with_dimensions(1600, 1200);
        let (_, report) = build(&first, &site, &settings, "harbour");
        // original + thumbnail + 2 sizes per image
        assert_eq!(report.cache.misses, 8);

        let second = MockBackend::with_dimensions(1600, 1200);
        let (_, report) = build(&second, &site, &settings, "harbour");
        assert_eq!(report.cache.hits, 8);
        assert_eq!(report.cache.misses, 0);
        assert!(
            second
                .get_operations()
                .iter()
                .all(|op| matches!(op, RecordedOp::Identify(_)))
        );
    }

    #[test]
    fn changed_setting_rerenders_only_affected_files() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "boats.jpg");
        let mut settings = GallerySettings::default();
        build(&MockBackend::with_dimensions(1600, 1200), &site, &settings, "harbour");

        settings.thumbnail.crop = false;
        let backend = MockBackend::with_dimensions(1600, 1200);
        let (_, report) = build(&backend, &site, &settings, "harbour");
        assert_eq!(report.cache.misses, 1);
        assert_eq!(report.cache.hits, 3);
    }

    #[test]
    fn renamed_album_copies_then_hits() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "boats.jpg");
        let settings = GallerySettings::default();
        build(&MockBackend::with_dimensions(900, 600), &site, &settings, "harbour");

        let albums = site.path.join("images/gallery");
        std::fs::rename(albums.join("harbour"), albums.join("port")).unwrap();

        let backend = MockBackend::with_dimensions(900, 600);
        let (_, report) = build(&backend, &site, &settings, "port");
        assert_eq!(report.cache.copies, 4);
        assert!(
            site.output_path
                .join("images/gallery/port/thumbnails/boats.jpg")
                .exists()
        );

        let (_, report) = build(&backend, &site, &settings, "port");
        assert_eq!(report.cache.hits, 4);
    }

    #[test]
    fn cache_disabled_writes_no_manifest() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "boats.jpg");
        let settings = GallerySettings {
            use_cache: false,
            ..GallerySettings::default()
        };

        let backend = MockBackend::with_dimensions(300, 300);
        build(&backend, &site, &settings, "harbour");
        let (_, report) = build(&backend, &site, &settings, "harbour");
        assert_eq!(report.cache.hits, 0);
        assert!(
            !site
                .output_path
                .join("images/gallery/.cache-manifest.json")
                .exists()
        );
    }

    #[test]
    fn get_gallery_applies_params() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "boats.jpg");
        let backend = MockBackend::with_dimensions(1600, 1200);
        let params = params_from_pairs([("copy_originals", "false"), ("thumbnail.crop", "false")]);

        let (gallery, _) = get_gallery(&backend, &site, "harbour", Some(&params))
            .unwrap()
            .unwrap();
        assert_eq!(gallery.images["boats.jpg"].original, None);
        assert!(
            backend
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Thumbnail { crop: false, .. }))
        );
    }

    #[test]
    fn get_gallery_rejects_bad_params() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "harbour", "boats.jpg");
        let params = params_from_pairs([("quality", "500")]);

        let err = get_gallery(&MockBackend::new(), &site, "harbour", Some(&params)).unwrap_err();
        assert!(matches!(err, GalleryError::Config(_)));
    }

    #[test]
    fn build_all_covers_every_album() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        add_image(&site, "020-lighthouse", "beam.jpg");
        add_image(&site, "010-harbour", "boats.jpg");
        let backend = MockBackend::with_dimensions(400, 300);

        let built = build_all(&backend, &site, &GallerySettings::default()).unwrap();
        let names: Vec<_> = built.iter().map(|(g, _)| g.name.as_str()).collect();
        assert_eq!(names, vec!["010-harbour", "020-lighthouse"]);
    }

    #[test]
    fn ordered_follows_number_prefix() {
        let tmp = TempDir::new().unwrap();
        let site = setup_site(tmp.path());
        for name in ["beam.jpg", "010-pier.jpg", "002-boats.jpg"] {
            add_image(&site, "harbour", name);
        }
        let backend = MockBackend::with_dimensions(400, 300);

        let (gallery, _) = build(&backend, &site, &GallerySettings::default(), "harbour");
        let order: Vec<_> = gallery.ordered().iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(order, vec!["002-boats.jpg", "010-pier.jpg", "beam.jpg"]);
    }
}
