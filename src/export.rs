//! PNG export of a composed surface at print scale.

use std::io::Cursor;

use crate::compose::ComposedSurface;
use crate::error::{FramepixError, FramepixResult};
use crate::render::render_plan;

/// Fixed export multiplier, independent of device pixel density, so output
/// quality is consistent across devices.
pub const DEFAULT_EXPORT_SCALE: f64 = 3.0;

/// File name stem used when the hint is empty.
pub const DEFAULT_FILE_STEM: &str = "photo";

/// Suffix appended to every exported file name.
pub const FILE_NAME_SUFFIX: &str = "-frame.png";

/// Encoded export result. No lifecycle beyond the export that created it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Lossless PNG byte stream.
    pub png: Vec<u8>,
    /// Suggested download file name.
    pub file_name: String,
}

/// Re-rasterize the surface's retained plan at `scale_factor` and encode it
/// as PNG. Fails with `Encoding` and produces nothing on encoder errors.
#[tracing::instrument(skip(surface), fields(scale_factor, hint = file_name_hint))]
pub fn export(
    surface: &ComposedSurface,
    scale_factor: f64,
    file_name_hint: &str,
) -> FramepixResult<ExportArtifact> {
    let pixels = render_plan(&surface.plan, scale_factor)?;

    let mut rgba = pixels.rgba8_premul;
    unpremultiply_rgba8_in_place(&mut rgba);

    let img = image::RgbaImage::from_raw(pixels.width, pixels.height, rgba)
        .ok_or_else(|| FramepixError::encoding("pixel buffer does not match dimensions"))?;
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| FramepixError::encoding(format!("png encode failed: {e}")))?;

    Ok(ExportArtifact {
        png,
        file_name: export_file_name(file_name_hint),
    })
}

/// `<hint-or-"photo">-frame.png`. Only the empty string falls back to the
/// default stem; whitespace-only hints are kept verbatim.
pub fn export_file_name(hint: &str) -> String {
    let stem = if hint.is_empty() {
        DEFAULT_FILE_STEM
    } else {
        hint
    };
    format!("{stem}{FILE_NAME_SUFFIX}")
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}
