//! Incremental processing cache.
//!
//! Decoding and re-encoding every image on every site build is the slow part
//! of gallery generation. The builder consults this cache before each pixel
//! operation (original copy, thumbnail, named size) and skips it when the
//! same source bytes were already rendered with the same parameters.
//!
//! The gallery mapping itself is never cached; only the files behind it.
//!
//! ## Keys
//!
//! Lookups are **content-addressed** by `source_hash` + `params_hash`:
//!
//! - `source_hash`: SHA-256 of the source file. Survives `git checkout`,
//!   which resets modification times.
//! - `params_hash`: SHA-256 of everything that shapes the output (operation
//!   kind, bounding box, crop, quality, sharpening, output extension).
//!
//! A hit requires a matching entry whose recorded output still exists. When
//! the recorded output lives at a different path (album renamed), the file is
//! copied instead of re-encoded.
//!
//! ## Storage
//!
//! `.cache-manifest.json` in the gallery output root. Output paths inside it
//! are relative to that root.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;
use tracing::warn;

const MANIFEST_FILENAME: &str = ".cache-manifest.json";

/// Bump to invalidate every existing cache when key computation changes.
const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// Outcome of a cache lookup for one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The output already exists with matching content.
    Hit,
    /// Matching content existed elsewhere and was copied into place.
    Copied,
    /// Nothing usable; the caller must render the file.
    Miss,
}

/// On-disk cache manifest mapping output paths to their cache entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    /// `"{source_hash}:{params_hash}"` → output path. Rebuilt on load.
    #[serde(skip)]
    content_index: HashMap<String, String>,
}

impl CacheManifest {
    /// An empty manifest, used when caching is disabled or on first build.
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
            content_index: HashMap::new(),
        }
    }

    /// Load from the gallery output root. A missing, corrupt, or
    /// wrong-version manifest yields an empty one.
    pub fn load(output_root: &Path) -> Self {
        let content = match std::fs::read_to_string(output_root.join(MANIFEST_FILENAME)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let mut manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                warn!("ignoring unreadable cache manifest: {e}");
                return Self::empty();
            }
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest.content_index = manifest
            .entries
            .iter()
            .map(|(path, entry)| (content_key(&entry.source_hash, &entry.params_hash), path.clone()))
            .collect();
        manifest
    }

    pub fn save(&self, output_root: &Path) -> io::Result<()> {
        std::fs::create_dir_all(output_root)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(output_root.join(MANIFEST_FILENAME), json)
    }

    /// Stored output path for this content, if the file is still on disk.
    pub fn find_cached(
        &self,
        source_hash: &str,
        params_hash: &str,
        output_root: &Path,
    ) -> Option<&str> {
        let stored = self.content_index.get(&content_key(source_hash, params_hash))?;
        output_root.join(stored).exists().then_some(stored.as_str())
    }

    /// Check the cache for `output_path` and copy a relocated match into place.
    pub fn lookup(
        &self,
        output_path: &str,
        source_hash: &str,
        params_hash: &str,
        output_root: &Path,
    ) -> io::Result<Lookup> {
        let Some(stored) = self.find_cached(source_hash, params_hash, output_root) else {
            return Ok(Lookup::Miss);
        };
        if stored == output_path {
            return Ok(Lookup::Hit);
        }
        let dest = output_root.join(output_path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(output_root.join(stored), &dest)?;
        Ok(Lookup::Copied)
    }

    /// Record that `output_path` holds this content.
    ///
    /// A previous entry for the same content under another path is dropped.
    pub fn insert(&mut self, output_path: String, source_hash: String, params_hash: String) {
        let key = content_key(&source_hash, &params_hash);
        if let Some(old_path) = self.content_index.get(&key)
            && *old_path != output_path
        {
            self.entries.remove(old_path.as_str());
        }
        self.content_index.insert(key, output_path.clone());
        self.entries.insert(
            output_path,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
    }
}

fn content_key(source_hash: &str, params_hash: &str) -> String {
    format!("{source_hash}:{params_hash}")
}

/// SHA-256 of a file's contents as hex.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Params hash for a verbatim copy of the original.
pub fn hash_original_params() -> String {
    format!("{:x}", Sha256::digest(b"original\0"))
}

/// Params hash for a named size: bounding box, quality and output extension.
pub fn hash_variant_params(bound: (u32, u32), quality: u32, extension: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"variant\0");
    hasher.update(bound.0.to_le_bytes());
    hasher.update(bound.1.to_le_bytes());
    hasher.update(quality.to_le_bytes());
    hasher.update(extension.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Params hash for a thumbnail.
pub fn hash_thumbnail_params(
    size: (u32, u32),
    crop: bool,
    quality: u32,
    sharpening: Option<(f32, i32)>,
    extension: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"thumbnail\0");
    hasher.update(size.0.to_le_bytes());
    hasher.update(size.1.to_le_bytes());
    hasher.update([crop as u8]);
    hasher.update(quality.to_le_bytes());
    match sharpening {
        Some((sigma, threshold)) => {
            hasher.update(b"\x01");
            hasher.update(sigma.to_le_bytes());
            hasher.update(threshold.to_le_bytes());
        }
        None => hasher.update(b"\x00"),
    }
    hasher.update(extension.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cache performance for one gallery build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn record(&mut self, lookup: Lookup) {
        match lookup {
            Lookup::Hit => self.hits += 1,
            Lookup::Copied => self.copies += 1,
            Lookup::Miss => self.misses += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }

    /// Fold another build's counters into this one.
    pub fn absorb(&mut self, other: CacheStats) {
        self.hits += other.hits;
        self.copies += other.copies;
        self.misses += other.misses;
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.copies > 0 {
            write!(
                f,
                "{} cached, {} copied, {} rendered ({} total)",
                self.hits,
                self.copies,
                self.misses,
                self.total()
            )
        } else if self.hits > 0 {
            write!(
                f,
                "{} cached, {} rendered ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} rendered", self.misses)
        }
    }
}
