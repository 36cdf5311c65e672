//! Element geometry from font metrics.
//!
//! Decorations scale down with the terminal font but never up: the
//! scale factor is `min(font_size / default_font_size, 1)`. Width, font
//! size and the fixed negative left margin scale uniformly; height is
//! additionally multiplied by the line height.

use crate::surface::ElementGeometry;

/// Unscaled element width and font size, in pixels.
const BASE_SIZE: f64 = 16.0;
/// Unscaled left-margin offset pulling the element into the gutter.
const BASE_MARGIN_LEFT: f64 = -17.0;

/// Compute element geometry for the given font metrics.
///
/// Returns `None` when any metric is non-finite or non-positive; the
/// caller skips the layout pass and keeps the previous geometry until a
/// valid reading arrives.
pub fn compute_geometry(
    font_size: f64,
    default_font_size: f64,
    line_height: f64,
) -> Option<ElementGeometry> {
    if !valid(font_size) || !valid(default_font_size) || !valid(line_height) {
        return None;
    }
    let scale = (font_size / default_font_size).min(1.0);
    Some(ElementGeometry {
        width: BASE_SIZE * scale,
        height: BASE_SIZE * scale * line_height,
        font_size: BASE_SIZE * scale,
        margin_left: BASE_MARGIN_LEFT * scale,
    })
}

fn valid(metric: f64) -> bool {
    metric.is_finite() && metric > 0.0
}
