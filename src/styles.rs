//! Named paragraph styles shared by all text-bearing flow items.

use std::collections::BTreeMap;

use genpdf::style::Style;
use genpdf::Alignment;

use crate::error::FormError;
use crate::fonts::{FontFace, FontHandle};

/// Base font size of the form, in points.
pub const BASE_FONT_SIZE: f64 = 9.0;

/// Name of the body text style.
pub const NORMAL: &str = "Normal";
/// Name of the centered form title style.
pub const TITLE: &str = "Title";
/// Name of the subtitle style used above the price table.
pub const SUBTITLE: &str = "SubTitle";
/// Name of the small print style used for statute extracts.
pub const SMALL: &str = "Small";

/// Line height assumed when a style does not declare its own leading.
const DEFAULT_LEADING_FACTOR: f64 = 1.2;

/// Horizontal alignment of a paragraph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    /// Ragged right.
    #[default]
    Left,
    /// Centered between the margins.
    Center,
    /// Flush right.
    Right,
}

impl From<TextAlign> for Alignment {
    fn from(align: TextAlign) -> Self {
        match align {
            TextAlign::Left => Alignment::Left,
            TextAlign::Center => Alignment::Center,
            TextAlign::Right => Alignment::Right,
        }
    }
}

/// An immutable, named paragraph style.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleDef {
    name: String,
    face: FontFace,
    size: f64,
    leading: Option<f64>,
    space_before: f64,
    space_after: f64,
    align: TextAlign,
}

impl StyleDef {
    /// Creates a left aligned style without extra spacing.
    pub fn new(name: impl Into<String>, face: FontFace, size: f64) -> Self {
        Self {
            name: name.into(),
            face,
            size,
            leading: None,
            space_before: 0.0,
            space_after: 0.0,
            align: TextAlign::Left,
        }
    }

    /// Copies every field of `self` into a new style called `name`.
    pub fn derive(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Overrides the face.
    pub fn with_face(mut self, face: FontFace) -> Self {
        self.face = face;
        self
    }

    /// Overrides the font size.
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Overrides the distance between baselines.
    pub fn with_leading(mut self, leading: f64) -> Self {
        self.leading = Some(leading);
        self
    }

    /// Overrides the space inserted above the paragraph.
    pub fn with_space_before(mut self, space: f64) -> Self {
        self.space_before = space;
        self
    }

    /// Overrides the space inserted below the paragraph.
    pub fn with_space_after(mut self, space: f64) -> Self {
        self.space_after = space;
        self
    }

    /// Overrides the alignment.
    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    /// Style name used for lookups.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Font face.
    pub fn face(&self) -> FontFace {
        self.face
    }

    /// Font size in points.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Distance between baselines in points.
    pub fn leading(&self) -> f64 {
        self.leading.unwrap_or(self.size * DEFAULT_LEADING_FACTOR)
    }

    /// Space above the paragraph in points.
    pub fn space_before(&self) -> f64 {
        self.space_before
    }

    /// Space below the paragraph in points.
    pub fn space_after(&self) -> f64 {
        self.space_after
    }

    /// Horizontal alignment.
    pub fn align(&self) -> TextAlign {
        self.align
    }

    /// Resolves the style against the registered fonts.
    ///
    /// `genpdf` expresses leading as a multiple of the font's natural line height, which for the
    /// form's typeface is close to the conventional 1.2 factor.
    pub fn to_genpdf(&self, fonts: &FontHandle) -> Style {
        let mut style = fonts.style(self.face, self.size);
        style.set_line_spacing(self.leading() / (self.size * DEFAULT_LEADING_FACTOR));
        style
    }
}

/// Lookup table for [`StyleDef`]s by name.
#[derive(Clone, Debug, Default)]
pub struct StyleRegistry {
    styles: BTreeMap<String, StyleDef>,
}

impl StyleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The four styles used by the membership form.
    pub fn form_defaults() -> Self {
        let normal = StyleDef::new(NORMAL, FontFace::Regular, BASE_FONT_SIZE);
        let title = normal
            .derive(TITLE)
            .with_face(FontFace::BoldItalic)
            .with_size(BASE_FONT_SIZE + 8.0)
            .with_leading(17.0)
            .with_align(TextAlign::Center)
            .with_space_after(3.0);
        let subtitle = normal
            .derive(SUBTITLE)
            .with_face(FontFace::BoldItalic)
            .with_size(BASE_FONT_SIZE + 2.0)
            .with_space_after(6.0);
        let small = normal
            .derive(SMALL)
            .with_size(BASE_FONT_SIZE - 3.0)
            .with_space_before(3.0)
            .with_leading(8.0);

        let mut registry = Self::new();
        for style in [normal, title, subtitle, small] {
            registry.insert(style);
        }
        registry
    }

    /// Adds or replaces a style.
    pub fn insert(&mut self, style: StyleDef) {
        self.styles.insert(style.name.clone(), style);
    }

    /// Returns the style called `name`.
    pub fn get(&self, name: &str) -> Result<&StyleDef, FormError> {
        self.styles
            .get(name)
            .ok_or_else(|| FormError::config(format!("unknown paragraph style '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_styles_copy_and_override() {
        let registry = StyleRegistry::form_defaults();
        let normal = registry.get(NORMAL).unwrap();
        let small = registry.get(SMALL).unwrap();

        assert_eq!(small.face(), normal.face());
        assert_eq!(small.size(), 6.0);
        assert_eq!(small.leading(), 8.0);
        assert_eq!(small.space_before(), 3.0);
        assert_eq!(small.align(), TextAlign::Left);

        let title = registry.get(TITLE).unwrap();
        assert_eq!(title.align(), TextAlign::Center);
        assert_eq!(title.face(), FontFace::BoldItalic);
        assert_eq!(title.space_after(), 3.0);
    }

    #[test]
    fn default_leading_follows_font_size() {
        let style = StyleDef::new("x", FontFace::Regular, 10.0);
        assert!((style.leading() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_style_is_configuration_error() {
        let err = StyleRegistry::form_defaults().get("Heading").unwrap_err();
        assert!(matches!(err, FormError::Configuration(_)));
    }
}
