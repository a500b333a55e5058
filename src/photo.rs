use std::sync::Arc;

use anyhow::Context;

use crate::error::{FramepixError, FramepixResult};

/// Decoded user photo in premultiplied RGBA8 form.
///
/// Immutable once decoded; the pipeline never writes back into it. The pixel
/// buffer is shared by `Arc` so crops and sessions can hold it cheaply.
#[derive(Clone, Debug)]
pub struct SourcePhoto {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Decode photo bytes (PNG/JPEG/WEBP or anything else the `image` crate
/// accepts) into premultiplied RGBA8.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_photo(bytes: &[u8]) -> FramepixResult<SourcePhoto> {
    let dyn_img = image::load_from_memory(bytes).context("decode photo from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(FramepixError::validation("photo has zero dimension"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    tracing::debug!(width, height, "decoded source photo");
    Ok(SourcePhoto {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}
