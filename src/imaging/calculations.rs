//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale `original` down to fit inside `bound`, preserving aspect ratio.
///
/// Never upscales: an image already inside the box keeps its size. Each
/// output edge is at least 1px.
///
/// ```
/// # use site_gallery::imaging::fit_within;
/// assert_eq!(fit_within((4000, 3000), (1200, 1200)), (1200, 900));
/// assert_eq!(fit_within((640, 480), (1200, 1200)), (640, 480));
/// ```
pub fn fit_within(original: (u32, u32), bound: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = original;
    let (max_w, max_h) = bound;
    if src_w == 0 || src_h == 0 {
        return (src_w, src_h);
    }

    let scale = (max_w as f64 / src_w as f64)
        .min(max_h as f64 / src_h as f64)
        .min(1.0);
    if scale >= 1.0 {
        return original;
    }

    let w = ((src_w as f64 * scale).round() as u32).max(1);
    let h = ((src_h as f64 * scale).round() as u32).max(1);
    (w, h)
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while keeping the
/// source aspect ratio. One dimension matches the target exactly, the other
/// may exceed it.
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Wider source: height matches
        let w = ((tgt_h as f64 * src_aspect).round() as u32).max(tgt_w);
        (w, tgt_h)
    } else {
        // Taller source: width matches
        let h = ((tgt_w as f64 / src_aspect).round() as u32).max(tgt_h);
        (tgt_w, h)
    }
}

/// Top-left offset that centers a `target` crop inside `filled`.
pub fn center_crop_offset(filled: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    (
        filled.0.saturating_sub(target.0) / 2,
        filled.1.saturating_sub(target.1) / 2,
    )
}
