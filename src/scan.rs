//! Album and image discovery.
//!
//! A gallery root holds one directory per album; every regular image file
//! directly inside an album directory belongs to that album:
//!
//! ```text
//! content/images/gallery/      # Gallery root
//! ├── 010-Harbour/             # Album "010-Harbour"
//! │   ├── 001-boats.jpg
//! │   ├── 002-pier.png
//! │   └── notes.txt            # Not an image extension, ignored
//! ├── lighthouse/              # Album "lighthouse"
//! │   ├── beam.jpg
//! │   └── raw/                 # Subdirectories are not descended into
//! └── .thumbs/                 # Hidden, ignored
//! ```
//!
//! Albums and images are ordered with [`naming::compare_entries`]: numbered
//! names first, by number, then the rest by name.

use crate::config::GallerySettings;
use crate::naming;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read directory: {0}")]
    Walk(#[from] walkdir::Error),
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Names of the immediate children of `dir` that satisfy `keep`, ordered.
fn list_children(
    dir: &Path,
    keep: impl Fn(&DirEntry) -> bool,
) -> Result<Vec<String>, ScanError> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if is_hidden(&entry) || !keep(&entry) {
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => names.push(name.to_string()),
            None => warn!(path = %entry.path().display(), "skipping non-UTF-8 name"),
        }
    }
    names.sort_by(|a, b| naming::compare_entries(a, b));
    Ok(names)
}

/// Image filenames directly inside `album_dir`.
///
/// Only regular files with an accepted extension are listed. A missing
/// directory yields an empty list.
pub fn list_images(album_dir: &Path, settings: &GallerySettings) -> Result<Vec<String>, ScanError> {
    if !album_dir.is_dir() {
        return Ok(Vec::new());
    }
    list_children(album_dir, |entry| {
        // Follow symlinks so a linked photo still counts as a regular file
        entry.path().is_file() && settings.accepts(&entry.file_name().to_string_lossy())
    })
}

/// Album directory names directly inside `gallery_root`.
pub fn list_albums(gallery_root: &Path) -> Result<Vec<String>, ScanError> {
    if !gallery_root.is_dir() {
        return Ok(Vec::new());
    }
    list_children(gallery_root, |entry| entry.path().is_dir())
}

/// Every album under `gallery_root` with its image filenames.
///
/// Albums without images are left out.
pub fn scan_galleries(
    gallery_root: &Path,
    settings: &GallerySettings,
) -> Result<BTreeMap<String, Vec<String>>, ScanError> {
    let mut galleries = BTreeMap::new();
    for album in list_albums(gallery_root)? {
        let images = list_images(&gallery_root.join(&album), settings)?;
        debug!(album = %album, images = images.len(), "scanned album");
        if !images.is_empty() {
            galleries.insert(album, images);
        }
    }
    Ok(galleries)
}
