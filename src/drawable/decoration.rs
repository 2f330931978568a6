use super::{
    Anchor, BoxRect, DisplayList, DrawCommand, Extent, PositionedDrawable, HAIRLINE,
};
use crate::error::FormError;
use crate::fonts::FontFace;
use crate::geometry::{FlowCursor, A4, CM};
use crate::styles::BASE_FONT_SIZE;

/// Baseline of a label relative to the flow line.
pub const LABEL_BASELINE_Y: f64 = -5.0;

/// Horizontal inset subtracted from the raw canvas position of a [`Rect`].
pub const RECT_INSET: f64 = 75.0;

/// Scale applied to the logo image.
pub const LOGO_SCALE: f64 = 0.25;

/// Lower-left corner of the logo on the first page.
pub const LOGO_ORIGIN: (f64, f64) = (2.0 * CM + 450.0, A4.1 - 0.75 * CM - 40.0);

/// A literal caption drawn next to or under a widget.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    text: String,
    face: FontFace,
    size: f64,
    offset: Option<f64>,
    yoffset: f64,
}

impl Label {
    /// A label in the regular face at the base font size.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            face: FontFace::Regular,
            size: BASE_FONT_SIZE,
            offset: None,
            yoffset: 0.0,
        }
    }

    /// Overrides face and size.
    pub fn with_font(mut self, face: FontFace, size: f64) -> Self {
        self.face = face;
        self.size = size;
        self
    }

    /// Sets the horizontal offset from the flow cursor.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Moves the baseline up by `yoffset` points.
    pub fn with_yoffset(mut self, yoffset: f64) -> Self {
        self.yoffset = yoffset;
        self
    }

    /// The caption text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl PositionedDrawable for Label {
    fn measure(&self) -> Extent {
        Extent::overlay(0.0)
    }

    fn render(&self, cursor: &FlowCursor) -> Result<DisplayList, FormError> {
        let x = cursor.x + self.offset.unwrap_or(0.0);
        let y = cursor.y + LABEL_BASELINE_Y + self.yoffset;

        let mut list = DisplayList::new();
        list.scoped(|list| {
            list.push(DrawCommand::SetFont {
                face: self.face,
                size: self.size,
            });
            list.push(DrawCommand::DrawString {
                x,
                y,
                text: self.text.clone(),
            });
            Ok(())
        })?;
        Ok(list)
    }

    fn offset(&self) -> Option<f64> {
        self.offset
    }
}

/// An unfilled frame hanging down from the current canvas position.
///
/// The frame is positioned from the raw canvas position rather than the flow offset, see
/// [`Anchor::RawCanvas`].
#[derive(Clone, Debug, PartialEq)]
pub struct Rect {
    width: f64,
    height: f64,
}

impl Rect {
    /// A frame of the given size.
    pub fn new(width: f64, height: f64) -> Result<Self, FormError> {
        if !(width > 0.0 && height > 0.0) {
            return Err(FormError::config(format!(
                "frame size must be positive, got {width} x {height}"
            )));
        }
        Ok(Self { width, height })
    }
}

impl PositionedDrawable for Rect {
    fn measure(&self) -> Extent {
        Extent::overlay(self.width)
    }

    fn render(&self, cursor: &FlowCursor) -> Result<DisplayList, FormError> {
        let frame = BoxRect {
            x: cursor.x + cursor.x - RECT_INSET,
            y: cursor.y - self.height,
            width: self.width,
            height: self.height,
        };

        let mut list = DisplayList::new();
        list.scoped(|list| {
            list.push(DrawCommand::SetLineWidth(HAIRLINE));
            list.push(DrawCommand::StrokeRect(frame));
            Ok(())
        })?;
        Ok(list)
    }

    fn anchor(&self) -> Anchor {
        Anchor::RawCanvas
    }
}

/// The club logo at its fixed spot in the upper right corner.
#[derive(Clone, Debug, PartialEq)]
pub struct Logo {
    key: String,
    scale: f64,
}

impl Logo {
    /// A logo drawing the image registered under `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            scale: LOGO_SCALE,
        }
    }

    /// Image asset key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PositionedDrawable for Logo {
    fn measure(&self) -> Extent {
        Extent::overlay(0.0)
    }

    fn render(&self, _cursor: &FlowCursor) -> Result<DisplayList, FormError> {
        let mut list = DisplayList::new();
        list.scoped(|list| {
            list.push(DrawCommand::DrawImage {
                key: self.key.clone(),
                x: LOGO_ORIGIN.0,
                y: LOGO_ORIGIN.1,
                scale: self.scale,
            });
            Ok(())
        })?;
        Ok(list)
    }

    fn anchor(&self) -> Anchor {
        Anchor::Page
    }
}
