//! Scene plan execution on the `vello_cpu` backend.
//!
//! A fresh `RenderContext` is acquired per call and dropped with it, so the
//! drawing surface is a scoped resource even when an op fails mid-plan.

use std::collections::HashMap;
use std::sync::Arc;

use crate::compose::{DrawOp, ScenePlan};
use crate::error::{FramepixError, FramepixResult};

/// Rendered pixels in row-major premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePixels {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
}

/// Rasterize a scene plan at the given scale factor.
///
/// Plan coordinates are logical; the scale affine is prepended to every op so
/// vector content stays crisp at any output resolution.
#[tracing::instrument(skip(plan), fields(width = plan.width, height = plan.height, scale))]
pub fn render_plan(plan: &ScenePlan, scale: f64) -> FramepixResult<FramePixels> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(FramepixError::validation(
            "render scale must be finite and > 0",
        ));
    }

    let out_w = (f64::from(plan.width) * scale).round().max(1.0) as u32;
    let out_h = (f64::from(plan.height) * scale).round().max(1.0) as u32;
    let w_u16: u16 = out_w
        .try_into()
        .map_err(|_| FramepixError::surface("surface width exceeds u16"))?;
    let h_u16: u16 = out_h
        .try_into()
        .map_err(|_| FramepixError::surface("surface height exceeds u16"))?;

    let mut ctx = vello_cpu::RenderContext::new(w_u16, h_u16);
    let scale_affine = kurbo::Affine::scale(scale);
    let mut font_cache: HashMap<u64, vello_cpu::peniko::FontData> = HashMap::new();

    // Background first; the context starts transparent.
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(scale_affine));
    ctx.set_paint(color_to_cpu(plan.background));
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(plan.width),
        f64::from(plan.height),
    ));

    for op in &plan.ops {
        draw_op(&mut ctx, op, scale_affine, &mut font_cache)?;
    }

    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w_u16, h_u16);
    ctx.render_to_pixmap(&mut pixmap);

    Ok(FramePixels {
        width: out_w,
        height: out_h,
        rgba8_premul: pixmap.data_as_u8_slice().to_vec(),
    })
}

fn draw_op(
    ctx: &mut vello_cpu::RenderContext,
    op: &DrawOp,
    scale_affine: kurbo::Affine,
    font_cache: &mut HashMap<u64, vello_cpu::peniko::FontData>,
) -> FramepixResult<()> {
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

    match op {
        DrawOp::FillPath {
            path,
            color,
            opacity,
        } => {
            ctx.set_transform(affine_to_cpu(scale_affine));
            ctx.set_paint(color_to_cpu(*color));
            if *opacity < 1.0 {
                ctx.push_opacity_layer(*opacity);
            }
            ctx.fill_path(&bezpath_to_cpu(path));
            if *opacity < 1.0 {
                ctx.pop_layer();
            }
            Ok(())
        }
        DrawOp::StrokePath {
            path,
            width,
            color,
            opacity,
        } => {
            ctx.set_transform(affine_to_cpu(scale_affine));
            ctx.set_paint(color_to_cpu(*color));
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*width));
            if *opacity < 1.0 {
                ctx.push_opacity_layer(*opacity);
            }
            ctx.stroke_path(&bezpath_to_cpu(path));
            if *opacity < 1.0 {
                ctx.pop_layer();
            }
            Ok(())
        }
        DrawOp::Image {
            width,
            height,
            rgba8_premul,
            transform,
            clip,
        } => {
            if let Some(clip) = clip {
                ctx.set_transform(affine_to_cpu(scale_affine));
                ctx.push_clip_layer(&bezpath_to_cpu(clip));
            }

            let pixmap = premul_bytes_to_pixmap(rgba8_premul, *width, *height)?;
            let paint = vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            };
            ctx.set_transform(affine_to_cpu(scale_affine * *transform));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(*width),
                f64::from(*height),
            ));

            if clip.is_some() {
                ctx.pop_layer();
            }
            Ok(())
        }
        DrawOp::Text { layout, origin } => {
            ctx.set_transform(affine_to_cpu(
                scale_affine * kurbo::Affine::translate(origin.to_vec2()),
            ));

            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };

                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));

                    let parley_font = run.run().font();
                    let key = parley_font.data.id();
                    let font = match font_cache.get(&key) {
                        Some(f) => f.clone(),
                        None => {
                            let f = vello_cpu::peniko::FontData::new(
                                vello_cpu::peniko::Blob::from(parley_font.data.as_ref().to_vec()),
                                parley_font.index,
                            );
                            font_cache.insert(key, f.clone());
                            f
                        }
                    };

                    let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(&font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
            Ok(())
        }
    }
}

fn color_to_cpu(c: crate::template::Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

pub(crate) fn affine_to_cpu(a: kurbo::Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

pub(crate) fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

pub(crate) fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> FramepixResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| FramepixError::surface("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| FramepixError::surface("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(FramepixError::validation("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Rgba8;
    use kurbo::Shape;

    fn solid_plan(background: Rgba8) -> ScenePlan {
        ScenePlan {
            width: 8,
            height: 8,
            background,
            ops: Vec::new(),
        }
    }

    #[test]
    fn background_fills_whole_buffer() {
        let pixels = render_plan(&solid_plan(Rgba8::rgb(255, 0, 0)), 1.0).unwrap();
        assert_eq!(pixels.width, 8);
        assert_eq!(pixels.height, 8);
        for px in pixels.rgba8_premul.chunks_exact(4) {
            assert_eq!(px, &[255, 0, 0, 255]);
        }
    }

    #[test]
    fn scale_multiplies_output_dimensions() {
        let pixels = render_plan(&solid_plan(Rgba8::rgb(0, 0, 0)), 3.0).unwrap();
        assert_eq!(pixels.width, 24);
        assert_eq!(pixels.height, 24);
    }

    #[test]
    fn bad_scale_is_rejected() {
        assert!(render_plan(&solid_plan(Rgba8::rgb(0, 0, 0)), 0.0).is_err());
        assert!(render_plan(&solid_plan(Rgba8::rgb(0, 0, 0)), f64::NAN).is_err());
    }

    #[test]
    fn oversized_surface_is_a_surface_error() {
        let plan = ScenePlan {
            width: 70_000,
            height: 8,
            background: Rgba8::rgb(0, 0, 0),
            ops: Vec::new(),
        };
        match render_plan(&plan, 1.0) {
            Err(FramepixError::Surface(_)) => {}
            other => panic!("expected Surface error, got {other:?}"),
        }
    }

    #[test]
    fn fill_path_is_deterministic() {
        let mut plan = solid_plan(Rgba8::rgb(250, 248, 255));
        let circle = kurbo::Circle::new((4.0, 4.0), 3.0);
        plan.ops.push(DrawOp::FillPath {
            path: circle.to_path(0.1),
            color: Rgba8::rgb(124, 58, 237),
            opacity: 0.5,
        });

        let a = render_plan(&plan, 1.0).unwrap();
        let b = render_plan(&plan, 1.0).unwrap();
        assert_eq!(a, b);
    }
}
