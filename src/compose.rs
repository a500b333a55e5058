//! Template compositing: compile a [`TemplateModel`] into a z-ordered scene
//! plan, then rasterize it for the preview.
//!
//! The plan is retained on the composed surface so export can re-rasterize
//! the same vector content at a higher scale with no resampling blur.

use std::sync::Arc;

use kurbo::Shape;

use crate::error::FramepixResult;
use crate::render::{FramePixels, render_plan};
use crate::template::{
    Element, PHOTO_PLACEHOLDER, PaintStyle, Rgba8, TemplateModel, TextSlot,
};
use crate::text::{TextBrush, TextLayoutEngine, TextStyle};

/// Flattening tolerance for template shapes, in logical pixels.
const PATH_TOLERANCE: f64 = 0.1;

/// One drawing instruction in logical template coordinates.
pub enum DrawOp {
    FillPath {
        path: kurbo::BezPath,
        color: Rgba8,
        opacity: f32,
    },
    StrokePath {
        path: kurbo::BezPath,
        width: f64,
        color: Rgba8,
        opacity: f32,
    },
    Image {
        width: u32,
        height: u32,
        rgba8_premul: Arc<Vec<u8>>,
        /// Maps image pixel space into logical template space.
        transform: kurbo::Affine,
        /// Clip path in logical template space.
        clip: Option<kurbo::BezPath>,
    },
    Text {
        layout: Arc<parley::Layout<TextBrush>>,
        /// Top-left corner of the layout in logical template space.
        origin: kurbo::Point,
    },
}

/// Compiled scene: everything [`render_plan`](crate::render::render_plan)
/// needs to rasterize one frame at any scale.
pub struct ScenePlan {
    pub width: u32,
    pub height: u32,
    pub background: Rgba8,
    pub ops: Vec<DrawOp>,
}

/// Fully rendered artwork prior to export encoding.
pub struct ComposedSurface {
    pub width: u32,
    pub height: u32,
    /// Preview pixels at scale 1.0.
    pub pixels: FramePixels,
    /// Retained vector plan for lossless re-rasterization at export scale.
    pub plan: ScenePlan,
}

/// Compose the model into a preview surface.
///
/// Re-entrant: every call builds a fresh plan and a fresh surface, so
/// repeated composes always reflect exactly the latest model.
#[tracing::instrument(skip(model), fields(has_photo = model.photo.is_some()))]
pub fn compose(model: &TemplateModel) -> FramepixResult<ComposedSurface> {
    let template = &model.template;
    template.validate()?;

    let mut engine = TextLayoutEngine::new();
    if let Some(bytes) = &template.font_bytes {
        engine.register_font(bytes)?;
    }

    // (z, sequence) keyed ops; ties resolve in declaration order.
    let mut keyed: Vec<(i32, usize, DrawOp)> = Vec::new();
    let mut seq = 0usize;
    let mut push = |keyed: &mut Vec<(i32, usize, DrawOp)>, z: i32, op: DrawOp| {
        keyed.push((z, seq, op));
        seq += 1;
    };

    for element in &template.elements {
        let (z, op) = element_op(element);
        push(&mut keyed, z, op);
    }

    let slot = &template.photo_slot;
    let slot_circle = kurbo::Circle::new((slot.cx, slot.cy), slot.diameter / 2.0);
    match &model.photo {
        Some(raster) => {
            let transform = kurbo::Affine::translate((
                slot.cx - slot.diameter / 2.0,
                slot.cy - slot.diameter / 2.0,
            )) * kurbo::Affine::scale_non_uniform(
                slot.diameter / f64::from(raster.width),
                slot.diameter / f64::from(raster.height),
            );
            push(
                &mut keyed,
                slot.z,
                DrawOp::Image {
                    width: raster.width,
                    height: raster.height,
                    rgba8_premul: raster.rgba8_premul.clone(),
                    transform,
                    clip: Some(slot_circle.to_path(PATH_TOLERANCE)),
                },
            );
        }
        None => {
            // Neutral disc of identical size and position keeps the layout
            // stable before a photo exists.
            push(
                &mut keyed,
                slot.z,
                DrawOp::FillPath {
                    path: slot_circle.to_path(PATH_TOLERANCE),
                    color: slot.placeholder_fill,
                    opacity: 1.0,
                },
            );
            let label_slot = TextSlot {
                cx: slot.cx,
                cy: slot.cy,
                size_px: 12.0,
                color: slot.placeholder_text_color,
                bold: false,
                z: slot.z,
            };
            push(
                &mut keyed,
                slot.z,
                text_op(&mut engine, PHOTO_PLACEHOLDER, &label_slot)?,
            );
        }
    }
    if slot.ring_width > 0.0 {
        let ring = kurbo::Circle::new(
            (slot.cx, slot.cy),
            (slot.diameter + slot.ring_width) / 2.0,
        );
        push(
            &mut keyed,
            slot.z,
            DrawOp::StrokePath {
                path: ring.to_path(PATH_TOLERANCE),
                width: slot.ring_width,
                color: slot.ring_color,
                opacity: 1.0,
            },
        );
    }

    push(
        &mut keyed,
        template.name_slot.z,
        text_op(&mut engine, model.display_name(), &template.name_slot)?,
    );
    push(
        &mut keyed,
        template.designation_slot.z,
        text_op(
            &mut engine,
            model.display_designation(),
            &template.designation_slot,
        )?,
    );

    keyed.sort_by_key(|(z, seq, _)| (*z, *seq));
    let plan = ScenePlan {
        width: template.width,
        height: template.height,
        background: template.background,
        ops: keyed.into_iter().map(|(_, _, op)| op).collect(),
    };

    let pixels = render_plan(&plan, 1.0)?;
    Ok(ComposedSurface {
        width: template.width,
        height: template.height,
        pixels,
        plan,
    })
}

fn element_op(element: &Element) -> (i32, DrawOp) {
    match element {
        Element::Circle {
            cx,
            cy,
            radius,
            style,
            color,
            opacity,
            z,
        } => {
            let path = kurbo::Circle::new((*cx, *cy), *radius).to_path(PATH_TOLERANCE);
            (*z, styled_op(path, *style, *color, *opacity))
        }
        Element::Rect {
            x,
            y,
            width,
            height,
            style,
            color,
            opacity,
            z,
        } => {
            let path = kurbo::Rect::new(*x, *y, x + width, y + height).to_path(PATH_TOLERANCE);
            (*z, styled_op(path, *style, *color, *opacity))
        }
        Element::RoundRect {
            x,
            y,
            width,
            height,
            corner_radius,
            style,
            color,
            opacity,
            z,
        } => {
            let path = kurbo::RoundedRect::new(*x, *y, x + width, y + height, *corner_radius)
                .to_path(PATH_TOLERANCE);
            (*z, styled_op(path, *style, *color, *opacity))
        }
    }
}

fn styled_op(path: kurbo::BezPath, style: PaintStyle, color: Rgba8, opacity: f32) -> DrawOp {
    match style {
        PaintStyle::Fill => DrawOp::FillPath {
            path,
            color,
            opacity,
        },
        PaintStyle::Stroke { width } => DrawOp::StrokePath {
            path,
            width,
            color,
            opacity,
        },
    }
}

fn text_op(
    engine: &mut TextLayoutEngine,
    text: &str,
    slot: &TextSlot,
) -> FramepixResult<DrawOp> {
    let layout = engine.layout_plain(
        text,
        TextStyle {
            size_px: slot.size_px,
            brush: TextBrush {
                r: slot.color.r,
                g: slot.color.g,
                b: slot.color.b,
                a: slot.color.a,
            },
            bold: slot.bold,
            max_width_px: None,
        },
    )?;
    let origin = kurbo::Point::new(
        slot.cx - f64::from(layout.width()) / 2.0,
        slot.cy - f64::from(layout.height()) / 2.0,
    );
    Ok(DrawOp::Text {
        layout: Arc::new(layout),
        origin,
    })
}
