//! Ordering and display titles for album and image names.
//!
//! Albums and images may carry an optional numeric prefix (`NNN-`) that
//! controls their order. Entries without a prefix sort after every numbered
//! entry, alphabetically among themselves.
//!
//! ```text
//! 010-Summer-Trip/   → number 10, title "Summer Trip"
//! 002-harbour.jpg    → number 2,  title "harbour"
//! lighthouse.jpg     → unnumbered, title "lighthouse"
//! ```

use std::cmp::Ordering;
use std::path::Path;

/// A name split into its optional number prefix and a display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub number: Option<u32>,
    /// Remainder after `NNN-` with dashes and underscores shown as spaces.
    /// Empty for number-only names such as `007`.
    pub display_title: String,
}

/// Parse a file stem or directory name following the `NNN-name` convention.
pub fn parse_entry_name(name: &str) -> ParsedName {
    let digits = name.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        let rest = &name[digits..];
        if (rest.is_empty() || rest.starts_with('-'))
            && let Ok(number) = name[..digits].parse::<u32>()
        {
            return ParsedName {
                number: Some(number),
                display_title: to_title(rest.strip_prefix('-').unwrap_or(rest)),
            };
        }
    }
    ParsedName {
        number: None,
        display_title: to_title(name),
    }
}

fn to_title(raw: &str) -> String {
    raw.replace(['-', '_'], " ").trim().to_string()
}

/// Display title for an image file: the stem without prefix or extension.
///
/// Falls back to the full filename when the stem is number-only.
pub fn image_title(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string());
    let parsed = parse_entry_name(&stem);
    if parsed.display_title.is_empty() {
        filename.to_string()
    } else {
        parsed.display_title
    }
}

/// Ordering used for albums and images: numbered first (by number), then name.
pub fn compare_entries(a: &str, b: &str) -> Ordering {
    let key = |name: &str| parse_entry_name(name).number.unwrap_or(u32::MAX);
    key(a).cmp(&key(b)).then_with(|| a.cmp(b))
}
