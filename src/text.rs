use crate::error::{FramepixError, FramepixResult};

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrush {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Styling for a single laid-out string.
#[derive(Clone, Copy, Debug)]
pub struct TextStyle {
    pub size_px: f32,
    pub brush: TextBrush,
    pub bold: bool,
    pub max_width_px: Option<f32>,
}

/// Stateful helper for building Parley text layouts.
///
/// Falls back to the system generic sans-serif stack when no explicit font
/// bytes are registered, so a template does not have to ship a font.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    registered_family: Option<String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered_family: None,
        }
    }

    /// Register explicit font bytes; subsequent layouts use this family
    /// instead of the generic sans-serif stack.
    pub fn register_font(&mut self, font_bytes: &[u8]) -> FramepixResult<()> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            FramepixError::validation("no font families registered from font bytes")
        })?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| FramepixError::validation("registered font family has no name"))?
            .to_string();
        self.registered_family = Some(family_name);
        Ok(())
    }

    /// Shape and lay out plain text with the given styling.
    pub fn layout_plain(
        &mut self,
        text: &str,
        style: TextStyle,
    ) -> FramepixResult<parley::Layout<TextBrush>> {
        if !style.size_px.is_finite() || style.size_px <= 0.0 {
            return Err(FramepixError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);

        match &self.registered_family {
            Some(family) => {
                builder.push_default(parley::style::StyleProperty::FontStack(
                    parley::style::FontStack::Source(std::borrow::Cow::Owned(family.clone())),
                ));
            }
            None => {
                builder.push_default(parley::style::StyleProperty::FontStack(
                    parley::style::FontStack::Single(parley::style::FontFamily::Generic(
                        parley::style::GenericFamily::SansSerif,
                    )),
                ));
            }
        }
        builder.push_default(parley::style::StyleProperty::FontSize(style.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(style.brush));
        if style.bold {
            builder.push_default(parley::style::StyleProperty::FontWeight(
                parley::style::FontWeight::BOLD,
            ));
        }

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        if let Some(w) = style.max_width_px {
            layout.break_all_lines(Some(w));
            layout.align(
                Some(w),
                parley::Alignment::Center,
                parley::AlignmentOptions::default(),
            );
        } else {
            layout.break_all_lines(None);
        }

        Ok(layout)
    }
}
