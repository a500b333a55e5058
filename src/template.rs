//! Template schema: the fixed decorative layout one photo frame variant is
//! built from, plus the per-session mutable state (text fields, photo).

use serde::{Deserialize, Serialize};

use crate::error::{FramepixError, FramepixResult};
use crate::raster::CircularRaster;

/// Placeholder shown in the name slot while the field is empty.
pub const NAME_PLACEHOLDER: &str = "Your Name";
/// Placeholder shown in the designation slot while the field is empty.
pub const DESIGNATION_PLACEHOLDER: &str = "Designation";
/// Label drawn on the neutral disc when no photo has been cropped yet.
pub const PHOTO_PLACEHOLDER: &str = "Photo";

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PaintStyle {
    Fill,
    Stroke { width: f64 },
}

/// One decorative shape. Rendered in ascending `z`, ties in declaration order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Element {
    Circle {
        cx: f64,
        cy: f64,
        radius: f64,
        style: PaintStyle,
        color: Rgba8,
        opacity: f32,
        z: i32,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        style: PaintStyle,
        color: Rgba8,
        opacity: f32,
        z: i32,
    },
    RoundRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        corner_radius: f64,
        style: PaintStyle,
        color: Rgba8,
        opacity: f32,
        z: i32,
    },
}

/// Where and how large the circular photo appears on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhotoSlot {
    pub cx: f64,
    pub cy: f64,
    /// Display diameter in logical pixels, independent of raster resolution.
    pub diameter: f64,
    pub ring_width: f64,
    pub ring_color: Rgba8,
    pub placeholder_fill: Rgba8,
    pub placeholder_text_color: Rgba8,
    pub z: i32,
}

/// Positioned text field, centered horizontally on `cx`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextSlot {
    pub cx: f64,
    pub cy: f64,
    pub size_px: f32,
    pub color: Rgba8,
    pub bold: bool,
    pub z: i32,
}

/// Complete description of one template variant: canvas, decoration, photo
/// slot, and the two text slots. Serde-derived so variants can live as data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Logical canvas size; one fixed size per variant.
    pub width: u32,
    pub height: u32,
    pub background: Rgba8,
    pub elements: Vec<Element>,
    pub photo_slot: PhotoSlot,
    pub name_slot: TextSlot,
    pub designation_slot: TextSlot,
    /// Optional font bytes; generic sans-serif when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_bytes: Option<Vec<u8>>,
}

impl Template {
    pub fn validate(&self) -> FramepixResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FramepixError::validation(
                "template canvas width/height must be > 0",
            ));
        }
        if !self.photo_slot.diameter.is_finite() || self.photo_slot.diameter <= 0.0 {
            return Err(FramepixError::validation(
                "photo slot diameter must be finite and > 0",
            ));
        }
        if self.photo_slot.ring_width < 0.0 {
            return Err(FramepixError::validation(
                "photo slot ring width must be >= 0",
            ));
        }
        for slot in [&self.name_slot, &self.designation_slot] {
            if !slot.size_px.is_finite() || slot.size_px <= 0.0 {
                return Err(FramepixError::validation(
                    "text slot size_px must be finite and > 0",
                ));
            }
        }
        Ok(())
    }
}

impl Default for Template {
    /// Built-in 320x320 variant matching the original artwork layout.
    fn default() -> Self {
        let primary = Rgba8::rgb(124, 58, 237);
        let foreground = Rgba8::rgb(31, 41, 55);
        let card = Rgba8::rgb(250, 248, 255);
        let muted = Rgba8::rgb(229, 227, 237);

        Self {
            width: 320,
            height: 320,
            background: card,
            elements: vec![
                // Corner accent washes.
                Element::Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 64.0,
                    height: 64.0,
                    style: PaintStyle::Fill,
                    color: primary,
                    opacity: 0.20,
                    z: 10,
                },
                Element::Rect {
                    x: 224.0,
                    y: 224.0,
                    width: 96.0,
                    height: 96.0,
                    style: PaintStyle::Fill,
                    color: primary,
                    opacity: 0.10,
                    z: 10,
                },
                // Faint background pattern.
                Element::Circle {
                    cx: 56.0,
                    cy: 56.0,
                    radius: 40.0,
                    style: PaintStyle::Stroke { width: 2.0 },
                    color: primary,
                    opacity: 0.05,
                    z: 20,
                },
                Element::Circle {
                    cx: 256.0,
                    cy: 256.0,
                    radius: 32.0,
                    style: PaintStyle::Stroke { width: 2.0 },
                    color: primary,
                    opacity: 0.05,
                    z: 20,
                },
                Element::Circle {
                    cx: 288.0,
                    cy: 160.0,
                    radius: 16.0,
                    style: PaintStyle::Fill,
                    color: primary,
                    opacity: 0.05,
                    z: 20,
                },
                // Logo mark, bottom right.
                Element::RoundRect {
                    x: 252.0,
                    y: 276.0,
                    width: 48.0,
                    height: 24.0,
                    corner_radius: 6.0,
                    style: PaintStyle::Fill,
                    color: primary,
                    opacity: 0.80,
                    z: 40,
                },
                Element::Circle {
                    cx: 264.0,
                    cy: 288.0,
                    radius: 5.0,
                    style: PaintStyle::Fill,
                    color: card,
                    opacity: 0.90,
                    z: 41,
                },
            ],
            photo_slot: PhotoSlot {
                cx: 160.0,
                cy: 128.0,
                diameter: 160.0,
                ring_width: 4.0,
                ring_color: primary,
                placeholder_fill: muted,
                placeholder_text_color: foreground,
                z: 30,
            },
            name_slot: TextSlot {
                cx: 160.0,
                cy: 232.0,
                size_px: 20.0,
                color: foreground,
                bold: true,
                z: 30,
            },
            designation_slot: TextSlot {
                cx: 160.0,
                cy: 258.0,
                size_px: 14.0,
                color: primary,
                bold: false,
                z: 30,
            },
            font_bytes: None,
        }
    }
}

/// Everything the final artwork is a function of: the template, the two text
/// fields, and at most one circular photo raster.
#[derive(Clone, Debug)]
pub struct TemplateModel {
    pub template: Template,
    pub name: String,
    pub designation: String,
    pub photo: Option<CircularRaster>,
}

impl TemplateModel {
    pub fn new(template: Template) -> Self {
        Self {
            template,
            name: String::new(),
            designation: String::new(),
            photo: None,
        }
    }

    /// Name text as rendered: placeholder when the field is empty.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            NAME_PLACEHOLDER
        } else {
            &self.name
        }
    }

    /// Designation text as rendered: placeholder when the field is empty.
    pub fn display_designation(&self) -> &str {
        if self.designation.is_empty() {
            DESIGNATION_PLACEHOLDER
        } else {
            &self.designation
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_validates() {
        Template::default().validate().unwrap();
    }

    #[test]
    fn zero_canvas_is_rejected() {
        let mut t = Template::default();
        t.width = 0;
        assert!(t.validate().is_err());
    }

    #[test]
    fn degenerate_photo_slot_is_rejected() {
        let mut t = Template::default();
        t.photo_slot.diameter = 0.0;
        assert!(t.validate().is_err());
    }

    #[test]
    fn empty_fields_render_placeholders() {
        let model = TemplateModel::new(Template::default());
        assert_eq!(model.display_name(), NAME_PLACEHOLDER);
        assert_eq!(model.display_designation(), DESIGNATION_PLACEHOLDER);
    }

    #[test]
    fn populated_fields_render_verbatim() {
        let mut model = TemplateModel::new(Template::default());
        model.name = "Ada".to_string();
        model.designation = "Engineer".to_string();
        assert_eq!(model.display_name(), "Ada");
        assert_eq!(model.display_designation(), "Engineer");
    }

    #[test]
    fn template_round_trips_through_json() {
        let t = Template::default();
        let json = serde_json::to_string(&t).unwrap();
        let back: Template = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
