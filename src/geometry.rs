//! Display-space to source-space coordinate resolution.
//!
//! The interactive selection lives in display coordinates (the on-screen,
//! possibly scaled-down rendering of the photo). Everything downstream works
//! in source pixels. This module is the only place that conversion happens.

use kurbo::Rect;
use serde::{Deserialize, Serialize};

use crate::error::{FramepixError, FramepixResult};

/// Fraction of the shorter display dimension covered by the auto-centered
/// square crop, and by the correction applied to non-square selections.
pub const CENTER_CROP_FRACTION: f64 = 0.9;

/// On-screen size of the rendered photo. Derived whenever the photo is loaded
/// or resized; never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayGeometry {
    pub width: f64,
    pub height: f64,
}

/// Unit the crop rectangle is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CropUnit {
    /// Percentage of the display dimensions (0..=100 per axis).
    Percent,
    /// Absolute display pixels.
    Pixels,
}

/// User-drawn crop rectangle in display space, 1:1 aspect by construction
/// once confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub unit: CropUnit,
}

/// Resolved crop rectangle in source-pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Largest centered square covering [`CENTER_CROP_FRACTION`] of the shorter
/// display dimension. Used for the initial auto-centered selection and as the
/// correction for non-square selections.
pub fn centered_square_crop(display: DisplayGeometry) -> CropRegion {
    let side = display.width.min(display.height) * CENTER_CROP_FRACTION;
    CropRegion {
        x: (display.width - side) / 2.0,
        y: (display.height - side) / 2.0,
        width: side,
        height: side,
        unit: CropUnit::Pixels,
    }
}

/// Convert a display-space crop region into source-pixel coordinates.
///
/// Non-square regions (possible during initial auto-centering) are replaced
/// by the centered-square rule before conversion. Regions overhanging the
/// display are clamped to its bounds rather than rejected; partial crops at
/// image edges are valid.
pub fn resolve(
    region: CropRegion,
    source_dims: (u32, u32),
    display: DisplayGeometry,
) -> FramepixResult<SourceRect> {
    if !display.width.is_finite() || !display.height.is_finite() {
        return Err(FramepixError::validation("display dimensions must be finite"));
    }
    if display.width <= 0.0 || display.height <= 0.0 {
        return Err(FramepixError::validation("display dimensions must be > 0"));
    }
    let (source_w, source_h) = source_dims;
    if source_w == 0 || source_h == 0 {
        return Err(FramepixError::validation("source dimensions must be > 0"));
    }

    let mut px = to_display_pixels(region, display);
    if px.width <= 0.0 || px.height <= 0.0 {
        return Err(FramepixError::validation("crop region must be non-empty"));
    }

    // Interactive widgets can hand over a slightly non-square rectangle while
    // auto-centering; anything beyond rounding noise falls back to the
    // centered-square rule.
    if (px.width - px.height).abs() > 0.5 {
        tracing::debug!(
            width = px.width,
            height = px.height,
            "non-square crop corrected to centered square"
        );
        px = centered_square_crop(display);
    }

    let bounds = Rect::new(0.0, 0.0, display.width, display.height);
    let clamped = Rect::new(px.x, px.y, px.x + px.width, px.y + px.height).intersect(bounds);
    if clamped.width() <= 0.0 || clamped.height() <= 0.0 {
        return Err(FramepixError::validation(
            "crop region lies entirely outside the display",
        ));
    }

    let scale_x = f64::from(source_w) / display.width;
    let scale_y = f64::from(source_h) / display.height;

    Ok(SourceRect {
        x: clamped.x0 * scale_x,
        y: clamped.y0 * scale_y,
        width: clamped.width() * scale_x,
        height: clamped.height() * scale_y,
    })
}

fn to_display_pixels(region: CropRegion, display: DisplayGeometry) -> CropRegion {
    match region.unit {
        CropUnit::Pixels => region,
        CropUnit::Percent => CropRegion {
            x: region.x / 100.0 * display.width,
            y: region.y / 100.0 * display.height,
            width: region.width / 100.0 * display.width,
            height: region.height / 100.0 * display.height,
            unit: CropUnit::Pixels,
        },
    }
}
