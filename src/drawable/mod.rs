//! Positioned drawables: flow items that draw at an absolute position derived from the flow
//! cursor without occupying any vertical flow space.
//!
//! Every drawable is an immutable configuration record.  [`PositionedDrawable::render`] is a pure
//! function of that record and the cursor it is handed: it returns a [`DisplayList`] and never
//! touches the cursor or the record, so rendering the same drawable twice at the same cursor
//! yields identical commands.

mod decoration;
mod field;

use std::fmt;

pub use decoration::{Label, Logo, Rect, LABEL_BASELINE_Y, LOGO_ORIGIN, LOGO_SCALE, RECT_INSET};
pub use field::{
    CheckBox, FieldName, FieldRegistry, TextField, CHECKBOX_DROP, CHECKBOX_SIZE, TEXT_FIELD_DROP,
};

use crate::error::FormError;
use crate::fonts::FontFace;
use crate::geometry::FlowCursor;

/// Border width shared by widgets and frames.
pub const HAIRLINE: f64 = 0.25;

/// Flow-space footprint reported by [`PositionedDrawable::measure`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Extent {
    /// Declared width, used for bookkeeping only.
    pub width: f64,
    /// Vertical space consumed in the flow; zero for every overlay.
    pub height: f64,
}

impl Extent {
    /// An overlay footprint with the given bookkeeping width.
    pub fn overlay(width: f64) -> Self {
        Self { width, height: 0.0 }
    }
}

/// What a drawable's position is derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    /// The logical flow cursor plus a horizontal offset.
    Flow,
    /// The raw canvas position at the moment of drawing.
    ///
    /// The canvas is already translated to the flow cursor while coordinates are issued in page
    /// units, so the horizontal cursor position is counted twice.  Any new use needs a visual
    /// check of the printed page.
    RawCanvas,
    /// A fixed position on the page, independent of the flow.
    Page,
}

/// A rectangle in page coordinates; `(x, y)` is its lower-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxRect {
    /// Left edge.
    pub x: f64,
    /// Bottom edge.
    pub y: f64,
    /// Extent to the right.
    pub width: f64,
    /// Extent upwards.
    pub height: f64,
}

impl BoxRect {
    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Top edge.
    pub fn top(&self) -> f64 {
        self.y + self.height
    }
}

/// Fixed look of every form widget: white fill and a hairline black border.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WidgetLook {
    /// Fill color as RGB components in `0.0..=1.0`.
    pub fill: [f64; 3],
    /// Border color as RGB components in `0.0..=1.0`.
    pub border: [f64; 3],
    /// Border width in points.
    pub border_width: f64,
}

impl Default for WidgetLook {
    fn default() -> Self {
        Self {
            fill: [1.0, 1.0, 1.0],
            border: [0.0, 0.0, 0.0],
            border_width: HAIRLINE,
        }
    }
}

/// A single-line text field annotation ready to be placed on a page.
#[derive(Clone, Debug, PartialEq)]
pub struct TextFieldWidget {
    /// Field identity used for value lookup.
    pub name: String,
    /// Tooltip shown by viewers.
    pub tooltip: String,
    /// Widget rectangle.
    pub rect: BoxRect,
    /// Fill and border.
    pub look: WidgetLook,
}

/// One member of a radio group ready to be placed on a page.
#[derive(Clone, Debug, PartialEq)]
pub struct RadioWidget {
    /// Group name shared by all members.
    pub name: String,
    /// Value submitted when this member is selected.
    pub value: String,
    /// Tooltip shown by viewers.
    pub tooltip: String,
    /// Widget rectangle; always square.
    pub rect: BoxRect,
    /// Fill and border.
    pub look: WidgetLook,
}

/// A drawing or annotation command in absolute page coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Pushes the current drawing state.
    SaveState,
    /// Pops the drawing state pushed by the matching [`DrawCommand::SaveState`].
    RestoreState,
    /// Sets the stroke width for following strokes.
    SetLineWidth(f64),
    /// Sets the font for following strings.
    SetFont {
        /// Registered face.
        face: FontFace,
        /// Size in points.
        size: f64,
    },
    /// Draws a string with its baseline starting at `(x, y)`.
    DrawString {
        /// Start of the baseline.
        x: f64,
        /// Baseline position.
        y: f64,
        /// Literal text.
        text: String,
    },
    /// Strokes an unfilled rectangle.
    StrokeRect(BoxRect),
    /// Draws a registered image with its lower-left corner at `(x, y)`.
    DrawImage {
        /// Asset key.
        key: String,
        /// Left edge.
        x: f64,
        /// Bottom edge.
        y: f64,
        /// Uniform scale applied to the image at 72 dpi.
        scale: f64,
    },
    /// Emits a text field annotation.
    TextField(TextFieldWidget),
    /// Emits a radio group member annotation.
    RadioButton(RadioWidget),
}

/// Ordered drawing commands produced by one drawable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a command.
    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// Runs `draw` between a save and a restore of the drawing state.
    ///
    /// The restore is emitted even when `draw` fails, so the list stays balanced.
    pub fn scoped<F>(&mut self, draw: F) -> Result<(), FormError>
    where
        F: FnOnce(&mut Self) -> Result<(), FormError>,
    {
        self.push(DrawCommand::SaveState);
        let result = draw(self);
        self.push(DrawCommand::RestoreState);
        result
    }

    /// The recorded commands.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Whether no command was recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether every save has a matching restore.
    pub fn is_balanced(&self) -> bool {
        let mut depth = 0usize;
        for command in &self.commands {
            match command {
                DrawCommand::SaveState => depth += 1,
                DrawCommand::RestoreState => match depth.checked_sub(1) {
                    Some(next) => depth = next,
                    None => return false,
                },
                _ => {}
            }
        }
        depth == 0
    }
}

impl IntoIterator for DisplayList {
    type Item = DrawCommand;
    type IntoIter = std::vec::IntoIter<DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

/// Field identity exposed by widgets for composition-time validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldIdentity<'a> {
    /// A text field.
    Text {
        /// Field name.
        name: &'a str,
    },
    /// A radio group member.
    Radio {
        /// Group name.
        name: &'a str,
        /// Member value.
        value: &'a str,
    },
}

/// The contract shared by every custom flow unit.
pub trait PositionedDrawable: fmt::Debug {
    /// Flow-space footprint; the height is zero for every overlay.
    fn measure(&self) -> Extent;

    /// Computes the absolute position from `cursor` and returns the drawing commands.
    fn render(&self, cursor: &FlowCursor) -> Result<DisplayList, FormError>;

    /// What the drawable positions itself against.
    fn anchor(&self) -> Anchor {
        Anchor::Flow
    }

    /// Horizontal displacement from the flow cursor, if configured.
    fn offset(&self) -> Option<f64> {
        None
    }

    /// Field identity for form widgets.
    fn field(&self) -> Option<FieldIdentity<'_>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_restores_on_failure() {
        let mut list = DisplayList::new();
        let result = list.scoped(|list| {
            list.push(DrawCommand::SetLineWidth(HAIRLINE));
            Err(FormError::config("boom"))
        });
        assert!(result.is_err());
        assert_eq!(
            list.commands(),
            &[
                DrawCommand::SaveState,
                DrawCommand::SetLineWidth(HAIRLINE),
                DrawCommand::RestoreState,
            ]
        );
        assert!(list.is_balanced());
    }

    #[test]
    fn unbalanced_lists_are_detected() {
        let mut list = DisplayList::new();
        list.push(DrawCommand::RestoreState);
        assert!(!list.is_balanced());

        let mut list = DisplayList::new();
        list.push(DrawCommand::SaveState);
        assert!(!list.is_balanced());
    }
}
