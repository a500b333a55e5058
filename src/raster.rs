//! Circular crop rasterization.
//!
//! Takes a resolved source-space crop rectangle and produces the circularly
//! masked RGBA buffer that later gets composited into the template's photo
//! slot. Device-density scaling happens here, before any drawing, so the mask
//! edge stays crisp on high-resolution displays.

use std::sync::Arc;

use kurbo::Shape;

use crate::error::{FramepixError, FramepixResult};
use crate::geometry::SourceRect;
use crate::photo::SourcePhoto;
use crate::render::{affine_to_cpu, bezpath_to_cpu, premul_bytes_to_pixmap};

/// Cropped, circularly-masked photo at device-density resolution.
///
/// Square for square crops; upstream edge clamping can make it slightly
/// rectangular, in which case the mask radius is bounded by the smaller half
/// dimension. Pixels outside the circle are fully transparent. Immutable;
/// re-cropping produces a new value.
#[derive(Clone, Debug)]
pub struct CircularRaster {
    pub width: u32,
    pub height: u32,
    /// Density the buffer was rendered at, for callers that need to map back
    /// to logical pixels.
    pub pixel_density: f32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl CircularRaster {
    /// Mask radius in buffer pixels.
    pub fn radius(&self) -> f64 {
        f64::from(self.width.min(self.height)) / 2.0
    }
}

/// Rasterize the crop region of `photo` through a circular clip.
///
/// The crop rectangle is mapped onto the full output buffer; since confirmed
/// crops are square there is no aspect distortion, and clamped edge crops only
/// shrink the mask radius.
#[tracing::instrument(skip(photo), fields(crop = ?crop, pixel_density))]
pub fn rasterize(
    photo: &SourcePhoto,
    crop: SourceRect,
    pixel_density: f32,
) -> FramepixResult<CircularRaster> {
    if !pixel_density.is_finite() || pixel_density <= 0.0 {
        return Err(FramepixError::validation(
            "pixel density must be finite and > 0",
        ));
    }

    // Guard against float drift from upstream scaling; the raster must stay a
    // strict subset of the photo.
    let crop = clamp_to_photo(crop, photo)?;

    let out_w = (crop.width * f64::from(pixel_density)).floor() as u32;
    let out_h = (crop.height * f64::from(pixel_density)).floor() as u32;
    if out_w == 0 || out_h == 0 {
        return Err(FramepixError::validation(
            "crop is too small for the requested pixel density",
        ));
    }
    let w_u16: u16 = out_w
        .try_into()
        .map_err(|_| FramepixError::surface("raster width exceeds u16"))?;
    let h_u16: u16 = out_h
        .try_into()
        .map_err(|_| FramepixError::surface("raster height exceeds u16"))?;

    let source_pixmap = premul_bytes_to_pixmap(&photo.rgba8_premul, photo.width, photo.height)?;
    let paint = vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(source_pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    };

    let mut ctx = vello_cpu::RenderContext::new(w_u16, h_u16);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

    // Clip first, in buffer coordinates; radius bounded by the smaller half
    // dimension so clamped crops never overflow the mask.
    let radius = f64::from(out_w.min(out_h)) / 2.0;
    let clip = kurbo::Circle::new((f64::from(out_w) / 2.0, f64::from(out_h) / 2.0), radius)
        .to_path(0.1);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.push_clip_layer(&bezpath_to_cpu(&clip));

    // Map the crop rectangle onto the full buffer. The image paint anchors
    // source pixel (0,0) at user-space origin, so drawing happens in source
    // coordinates under a crop-to-buffer transform.
    let scale_x = f64::from(out_w) / crop.width;
    let scale_y = f64::from(out_h) / crop.height;
    let transform = kurbo::Affine::scale_non_uniform(scale_x, scale_y)
        * kurbo::Affine::translate((-crop.x, -crop.y));
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        crop.x,
        crop.y,
        crop.x + crop.width,
        crop.y + crop.height,
    ));

    ctx.pop_layer();
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(w_u16, h_u16);
    ctx.render_to_pixmap(&mut pixmap);

    Ok(CircularRaster {
        width: out_w,
        height: out_h,
        pixel_density,
        rgba8_premul: Arc::new(pixmap.data_as_u8_slice().to_vec()),
    })
}

fn clamp_to_photo(crop: SourceRect, photo: &SourcePhoto) -> FramepixResult<SourceRect> {
    let bounds = kurbo::Rect::new(0.0, 0.0, f64::from(photo.width), f64::from(photo.height));
    let rect =
        kurbo::Rect::new(crop.x, crop.y, crop.x + crop.width, crop.y + crop.height).intersect(bounds);
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return Err(FramepixError::validation(
            "crop lies outside the source photo",
        ));
    }
    Ok(SourceRect {
        x: rect.x0,
        y: rect.y0,
        width: rect.width(),
        height: rect.height(),
    })
}
