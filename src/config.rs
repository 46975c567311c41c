//! Site and gallery settings.
//!
//! Gallery settings are layered. Each layer is a sparse TOML table merged on
//! top of the previous one, and the result is deserialized and validated:
//!
//! ```text
//! stock defaults  →  [gallery] table in site.toml  →  call-site overrides
//! ```
//!
//! Call-site overrides come from the `gallery` directive's option lines or
//! from library callers of [`crate::plugin::GalleryPlugin::get_gallery`].
//!
//! ## Site File
//!
//! ```toml
//! path = "content"          # Content root
//! output_path = "output"    # Output root
//!
//! [gallery]
//! content_dir = "images/gallery"  # Albums live here, relative to `path`
//! output_dir = "images/gallery"   # Rendered files go here, relative to `output_path`
//! copy_originals = true
//! extensions = ["jpg", "jpeg", "png", "gif", "webp", "tif", "tiff"]
//! quality = 85
//! format = "source"               # source | jpeg | png | webp | avif
//! use_cache = true
//!
//! [gallery.thumbnail]
//! size = [200, 200]
//! crop = true
//! sharpen = true
//!
//! [gallery.sizes]
//! large = [1200, 1200]
//! medium = [800, 800]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Directory name reserved for thumbnails inside each album's output folder.
pub const THUMBNAIL_DIR: &str = "thumbnails";

/// Site-wide settings: where content lives, where output goes, and the raw
/// `[gallery]` layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSettings {
    pub path: PathBuf,
    pub output_path: PathBuf,
    /// Kept raw so it can be merged between the defaults and call-site overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery: Option<toml::Table>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("content"),
            output_path: PathBuf::from("output"),
            gallery: None,
        }
    }
}

impl SiteSettings {
    /// Resolve relative `path`/`output_path` against the directory the site
    /// file was loaded from.
    pub fn rebase(mut self, base: &Path) -> Self {
        if self.path.is_relative() {
            self.path = base.join(&self.path);
        }
        if self.output_path.is_relative() {
            self.output_path = base.join(&self.output_path);
        }
        self
    }

    /// Album root: `<path>/<content_dir>`.
    pub fn gallery_content_root(&self, gallery: &GallerySettings) -> PathBuf {
        self.path.join(&gallery.content_dir)
    }

    /// Rendered gallery root: `<output_path>/<output_dir>`.
    pub fn gallery_output_root(&self, gallery: &GallerySettings) -> PathBuf {
        self.output_path.join(&gallery.output_dir)
    }
}

/// Output encoding for resized variants and thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Keep the source file's extension.
    #[default]
    Source,
    Jpeg,
    Png,
    Webp,
    Avif,
}

impl OutputFormat {
    /// File extension for this format, or `None` to keep the source's.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            OutputFormat::Source => None,
            OutputFormat::Jpeg => Some("jpg"),
            OutputFormat::Png => Some("png"),
            OutputFormat::Webp => Some("webp"),
            OutputFormat::Avif => Some("avif"),
        }
    }
}

/// Thumbnail settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailSettings {
    /// `[width, height]`. Exact output size when `crop` is set, a bounding
    /// box otherwise.
    pub size: [u32; 2],
    pub crop: bool,
    /// Apply a light unsharp mask after downscaling.
    pub sharpen: bool,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            size: [200, 200],
            crop: true,
            sharpen: true,
        }
    }
}

/// Fully-resolved gallery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GallerySettings {
    pub content_dir: String,
    pub output_dir: String,
    pub copy_originals: bool,
    pub extensions: Vec<String>,
    pub quality: u32,
    pub format: OutputFormat,
    pub use_cache: bool,
    pub thumbnail: ThumbnailSettings,
    /// Size name → `[max_width, max_height]` bounding box.
    pub sizes: BTreeMap<String, [u32; 2]>,
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            content_dir: "images/gallery".to_string(),
            output_dir: "images/gallery".to_string(),
            copy_originals: true,
            extensions: ["jpg", "jpeg", "png", "gif", "webp", "tif", "tiff"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            quality: 85,
            format: OutputFormat::Source,
            use_cache: true,
            thumbnail: ThumbnailSettings::default(),
            sizes: BTreeMap::from([
                ("large".to_string(), [1200, 1200]),
                ("medium".to_string(), [800, 800]),
            ]),
        }
    }
}

impl GallerySettings {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quality > 100 {
            return Err(ConfigError::Validation("quality must be 0-100".into()));
        }
        if self.thumbnail.size.contains(&0) {
            return Err(ConfigError::Validation(
                "thumbnail.size values must be non-zero".into(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "extensions must not be empty".into(),
            ));
        }
        for (name, bound) in &self.sizes {
            if name.is_empty()
                || name == "."
                || name == ".."
                || name.contains(['/', '\\'])
                || name == THUMBNAIL_DIR
            {
                return Err(ConfigError::Validation(format!(
                    "invalid size name {name:?}"
                )));
            }
            if bound.contains(&0) {
                return Err(ConfigError::Validation(format!(
                    "sizes.{name} values must be non-zero"
                )));
            }
        }
        Ok(())
    }

    /// Whether a filename's extension is one of the configured image types.
    pub fn accepts(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .map(|e| e.to_string_lossy())
            .is_some_and(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(&ext)))
    }
}

// =============================================================================
// Loading and merging
// =============================================================================

/// Stock gallery defaults as a `toml::Value::Table`, the base merge layer.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GallerySettings::default()).expect("default settings must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge defaults, the site's `[gallery]` layer and call-site `params`, in
/// that order of increasing precedence, then deserialize and validate.
pub fn resolve_gallery_settings(
    site: &SiteSettings,
    params: Option<&toml::Table>,
) -> Result<GallerySettings, ConfigError> {
    let mut merged = stock_defaults_value();
    if let Some(layer) = &site.gallery {
        merged = merge_toml(merged, toml::Value::Table(layer.clone()));
    }
    if let Some(layer) = params {
        merged = merge_toml(merged, toml::Value::Table(layer.clone()));
    }
    let settings: GallerySettings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load `site.toml`. A missing file yields the defaults.
///
/// Relative paths in the file are resolved against the file's directory.
pub fn load_site_settings(path: &Path) -> Result<SiteSettings, ConfigError> {
    let base = path.parent().unwrap_or(Path::new("."));
    if !path.exists() {
        return Ok(SiteSettings::default().rebase(base));
    }
    let content = fs::read_to_string(path)?;
    let site: SiteSettings = toml::from_str(&content)?;
    // Surface typos in the gallery layer at load time rather than at first use.
    resolve_gallery_settings(&site, None)?;
    Ok(site.rebase(base))
}

/// Parse a single override value the way an option line spells it.
///
/// `70` → integer, `false` → boolean, `[640, 480]` → array; anything that is
/// not a TOML value is kept as a string.
pub fn parse_override_value(raw: &str) -> toml::Value {
    let raw = raw.trim();
    toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

/// Insert a possibly dotted key (`thumbnail.crop`) into an override table.
pub fn insert_override(table: &mut toml::Table, key: &str, value: toml::Value) {
    match key.split_once('.') {
        Some((head, rest)) => {
            let entry = table
                .entry(head.to_string())
                .or_insert(toml::Value::Table(toml::Table::new()));
            if !entry.is_table() {
                *entry = toml::Value::Table(toml::Table::new());
            }
            if let toml::Value::Table(inner) = entry {
                insert_override(inner, rest, value);
            }
        }
        None => {
            table.insert(key.to_string(), value);
        }
    }
}

/// A fully-commented stock `site.toml`, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# site-gallery configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Relative paths are resolved against the directory holding this file.

# Content root. Albums are looked up under <path>/<gallery.content_dir>.
path = "content"

# Output root. Rendered files go to <output_path>/<gallery.output_dir>.
output_path = "output"

# ---------------------------------------------------------------------------
# Gallery
# ---------------------------------------------------------------------------
[gallery]
# Album directories live here, one directory per gallery.
content_dir = "images/gallery"

# Rendered originals, thumbnails and sizes are written here.
output_dir = "images/gallery"

# Copy each original image next to its resized variants.
copy_originals = true

# File extensions (case-insensitive) treated as images.
extensions = ["jpg", "jpeg", "png", "gif", "webp", "tif", "tiff"]

# Lossy encoding quality (1-100). Ignored by lossless formats.
quality = 85

# Output format for thumbnails and sizes: source, jpeg, png, webp or avif.
# "source" keeps each image's own format.
format = "source"

# Skip re-encoding images whose source and settings haven't changed.
use_cache = true

# ---------------------------------------------------------------------------
# Thumbnails (written to <album>/thumbnails/)
# ---------------------------------------------------------------------------
[gallery.thumbnail]
# [width, height]. Exact size when crop = true, a bounding box otherwise.
size = [200, 200]
crop = true
sharpen = true

# ---------------------------------------------------------------------------
# Named sizes (written to <album>/<name>/)
# ---------------------------------------------------------------------------
# Each entry is a [max_width, max_height] box. Images are scaled down to fit
# and never scaled up.
[gallery.sizes]
large = [1200, 1200]
medium = [800, 800]
"##
}
