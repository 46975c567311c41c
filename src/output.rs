//! CLI output formatting.
//!
//! Output is information-first: each album and image is shown by position
//! and display title, with filesystem details on indented context lines.
//!
//! # Output Format
//!
//! ## Albums
//!
//! ```text
//! Albums in content/images/gallery
//! 001 Harbour (2 photos)
//!     Source: 010-Harbour/
//!     001 boats
//!         Source: 001-boats.jpg
//!     002 pier
//!         Source: 002-pier.jpg
//! ```
//!
//! ## Build
//!
//! ```text
//! 001 Harbour (2 photos) → images/gallery/010-Harbour/
//!     001 boats
//!         thumbnail: images/gallery/010-Harbour/thumbnails/001-boats.jpg
//!         large: images/gallery/010-Harbour/large/001-boats.jpg
//!     Cache: 6 cached, 2 rendered (8 total)
//!
//! Built 1 gallery, 2 images
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::cache::CacheStats;
use crate::config::{GallerySettings, SiteSettings};
use crate::gallery::{BuildReport, Gallery};
use crate::naming;
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

/// Display title for an album directory name.
fn album_title(name: &str) -> String {
    let parsed = naming::parse_entry_name(name);
    if parsed.display_title.is_empty() {
        name.to_string()
    } else {
        parsed.display_title
    }
}

/// ```text
/// 001 Harbour (2 photos)
/// ```
fn album_header(index: usize, name: &str, count: usize) -> String {
    format!(
        "{} {} ({})",
        format_index(index),
        album_title(name),
        plural(count, "photo", "photos")
    )
}

fn image_line(index: usize, filename: &str) -> String {
    format!("{} {}", format_index(index), naming::image_title(filename))
}

// ============================================================================
// albums
// ============================================================================

pub fn format_albums_output(galleries: &BTreeMap<String, Vec<String>>, root: &Path) -> Vec<String> {
    let mut lines = vec![format!("Albums in {}", root.display())];
    if galleries.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
        return lines;
    }

    let mut names: Vec<&String> = galleries.keys().collect();
    names.sort_by(|a, b| naming::compare_entries(a, b));

    for (i, name) in names.into_iter().enumerate() {
        let images = &galleries[name];
        lines.push(album_header(i + 1, name, images.len()));
        lines.push(format!("{}Source: {}/", indent(1), name));
        for (j, filename) in images.iter().enumerate() {
            lines.push(format!("{}{}", indent(1), image_line(j + 1, filename)));
            lines.push(format!("{}Source: {}", indent(2), filename));
        }
    }
    lines
}

pub fn print_albums_output(galleries: &BTreeMap<String, Vec<String>>, root: &Path) {
    for line in format_albums_output(galleries, root) {
        println!("{}", line);
    }
}

// ============================================================================
// build
// ============================================================================

pub fn format_build_output(
    index: usize,
    gallery: &Gallery,
    report: &BuildReport,
    settings: &GallerySettings,
) -> Vec<String> {
    let target = format!(
        "{}/{}/",
        settings.output_dir.trim_matches('/'),
        gallery.name
    );
    let mut lines = vec![format!(
        "{} → {}",
        album_header(index, &gallery.name, gallery.images.len()),
        target
    )];

    for (j, image) in gallery.ordered().into_iter().enumerate() {
        lines.push(format!("{}{}", indent(1), image_line(j + 1, &image.filename)));
        if let Some(original) = &image.original {
            lines.push(format!("{}original: {}", indent(2), original));
        }
        lines.push(format!("{}thumbnail: {}", indent(2), image.thumbnail));
        for (size, path) in &image.sizes {
            lines.push(format!("{}{}: {}", indent(2), size, path));
        }
    }
    if report.cache.total() > 0 {
        lines.push(format!("{}Cache: {}", indent(1), report.cache));
    }
    lines
}

pub fn print_build_output(
    index: usize,
    gallery: &Gallery,
    report: &BuildReport,
    settings: &GallerySettings,
) {
    for line in format_build_output(index, gallery, report, settings) {
        println!("{}", line);
    }
}

pub fn format_build_summary(galleries: usize, images: usize, cache: &CacheStats) -> String {
    let mut line = format!(
        "Built {}, {}",
        plural(galleries, "gallery", "galleries"),
        plural(images, "image", "images")
    );
    if cache.total() > 0 {
        line.push_str(&format!(" ({cache})"));
    }
    line
}

pub fn print_build_summary(galleries: usize, images: usize, cache: &CacheStats) {
    println!();
    println!("{}", format_build_summary(galleries, images, cache));
}

// ============================================================================
// check
// ============================================================================

pub fn format_check_output(
    site: &SiteSettings,
    settings: &GallerySettings,
    albums: usize,
) -> Vec<String> {
    let sizes = if settings.sizes.is_empty() {
        "(none)".to_string()
    } else {
        settings
            .sizes
            .iter()
            .map(|(name, [w, h])| format!("{name} {w}x{h}"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let [tw, th] = settings.thumbnail.size;
    vec![
        "Config OK".to_string(),
        format!(
            "{}Content: {} ({})",
            indent(1),
            site.gallery_content_root(settings).display(),
            plural(albums, "album", "albums")
        ),
        format!(
            "{}Output: {}",
            indent(1),
            site.gallery_output_root(settings).display()
        ),
        format!("{}Sizes: {}", indent(1), sizes),
        format!(
            "{}Thumbnail: {}x{} ({})",
            indent(1),
            tw,
            th,
            if settings.thumbnail.crop { "crop" } else { "fit" }
        ),
    ]
}

pub fn print_check_output(site: &SiteSettings, settings: &GallerySettings, albums: usize) {
    for line in format_check_output(site, settings, albums) {
        println!("{}", line);
    }
}
