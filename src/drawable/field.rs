use std::collections::{BTreeMap, BTreeSet};

use super::{
    BoxRect, DisplayList, DrawCommand, Extent, FieldIdentity, PositionedDrawable, RadioWidget,
    TextFieldWidget, WidgetLook,
};
use crate::error::FormError;
use crate::geometry::FlowCursor;
use crate::styles::BASE_FONT_SIZE;

/// Distance between the flow line and the bottom edge of a text field.
pub const TEXT_FIELD_DROP: f64 = BASE_FONT_SIZE;
/// Edge length of every radio box.
pub const CHECKBOX_SIZE: f64 = BASE_FONT_SIZE * 1.2;
/// Distance between the flow line and the bottom edge of a radio box.
pub const CHECKBOX_DROP: f64 = BASE_FONT_SIZE * 0.8;

/// A non-empty field identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldName(String);

impl FieldName {
    /// Validates `name`; blank names are rejected.
    pub fn new(name: impl Into<String>) -> Result<Self, FormError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FormError::config(
                "form fields require a non-empty name for value lookup",
            ));
        }
        Ok(Self(name))
    }

    /// The identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn absolute_x(cursor: &FlowCursor, offset: Option<f64>) -> f64 {
    cursor.x + offset.unwrap_or(0.0)
}

/// A single-line editable text box.
#[derive(Clone, Debug, PartialEq)]
pub struct TextField {
    name: FieldName,
    tooltip: String,
    width: f64,
    height: f64,
    offset: Option<f64>,
}

impl TextField {
    /// Creates a field; fails with a configuration error when `name` is blank.
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Result<Self, FormError> {
        Ok(Self {
            name: FieldName::new(name)?,
            tooltip: String::new(),
            width,
            height,
            offset: None,
        })
    }

    /// Sets the tooltip.
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    /// Sets the horizontal offset from the flow cursor.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Field identifier.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Widget width.
    pub fn width(&self) -> f64 {
        self.width
    }
}

impl PositionedDrawable for TextField {
    fn measure(&self) -> Extent {
        Extent::overlay(self.width)
    }

    fn render(&self, cursor: &FlowCursor) -> Result<DisplayList, FormError> {
        let widget = TextFieldWidget {
            name: self.name.as_str().to_owned(),
            tooltip: self.tooltip.clone(),
            rect: BoxRect {
                x: absolute_x(cursor, self.offset),
                y: cursor.y - TEXT_FIELD_DROP,
                width: self.width,
                height: self.height,
            },
            look: WidgetLook::default(),
        };

        let mut list = DisplayList::new();
        list.scoped(|list| {
            list.push(DrawCommand::TextField(widget));
            Ok(())
        })?;
        Ok(list)
    }

    fn offset(&self) -> Option<f64> {
        self.offset
    }

    fn field(&self) -> Option<FieldIdentity<'_>> {
        Some(FieldIdentity::Text {
            name: self.name.as_str(),
        })
    }
}

/// One member of an exclusive-choice group.
///
/// Members of a group share `name` and differ in value, offset and tooltip.  The box size is a
/// fixed multiple of the base font size.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckBox {
    name: FieldName,
    value: String,
    tooltip: String,
    offset: Option<f64>,
    reserved_width: f64,
}

impl CheckBox {
    /// Creates a group member; blank names and values are configuration errors.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, FormError> {
        let name = FieldName::new(name)?;
        let value = value.into();
        if value.trim().is_empty() {
            return Err(FormError::config(format!(
                "radio group '{}' has a member without a value",
                name.as_str()
            )));
        }
        Ok(Self {
            name,
            value,
            tooltip: String::new(),
            offset: None,
            reserved_width: 0.0,
        })
    }

    /// Sets the tooltip.
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    /// Sets the horizontal offset from the flow cursor.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Declares a bookkeeping width; it never affects what is drawn.
    pub fn with_reserved_width(mut self, width: f64) -> Self {
        self.reserved_width = width;
        self
    }

    /// Group name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Value submitted when this member is selected.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl PositionedDrawable for CheckBox {
    fn measure(&self) -> Extent {
        Extent::overlay(self.reserved_width)
    }

    fn render(&self, cursor: &FlowCursor) -> Result<DisplayList, FormError> {
        let widget = RadioWidget {
            name: self.name.as_str().to_owned(),
            value: self.value.clone(),
            tooltip: self.tooltip.clone(),
            rect: BoxRect {
                x: absolute_x(cursor, self.offset),
                y: cursor.y - CHECKBOX_DROP,
                width: CHECKBOX_SIZE,
                height: CHECKBOX_SIZE,
            },
            look: WidgetLook::default(),
        };

        let mut list = DisplayList::new();
        list.scoped(|list| {
            list.push(DrawCommand::RadioButton(widget));
            Ok(())
        })?;
        Ok(list)
    }

    fn offset(&self) -> Option<f64> {
        self.offset
    }

    fn field(&self) -> Option<FieldIdentity<'_>> {
        Some(FieldIdentity::Radio {
            name: self.name.as_str(),
            value: &self.value,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum RegisteredField {
    Text,
    Radio(BTreeSet<String>),
}

/// Tracks field identities across a document and rejects inconsistent groups.
///
/// Radio members may differ in geometry; they must not repeat a value, and a name cannot be used
/// by both a text field and a radio group.
#[derive(Clone, Debug, Default)]
pub struct FieldRegistry {
    fields: BTreeMap<String, RegisteredField>,
}

impl FieldRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one field identity.
    pub fn register(&mut self, field: FieldIdentity<'_>) -> Result<(), FormError> {
        match field {
            FieldIdentity::Text { name } => match self.fields.get(name) {
                Some(RegisteredField::Radio(_)) => Err(FormError::config(format!(
                    "'{name}' is used by both a text field and a radio group"
                ))),
                Some(RegisteredField::Text) => Ok(()),
                None => {
                    self.fields.insert(name.to_owned(), RegisteredField::Text);
                    Ok(())
                }
            },
            FieldIdentity::Radio { name, value } => {
                let entry = self
                    .fields
                    .entry(name.to_owned())
                    .or_insert_with(|| RegisteredField::Radio(BTreeSet::new()));
                match entry {
                    RegisteredField::Text => Err(FormError::config(format!(
                        "'{name}' is used by both a text field and a radio group"
                    ))),
                    RegisteredField::Radio(values) => {
                        if values.insert(value.to_owned()) {
                            Ok(())
                        } else {
                            Err(FormError::config(format!(
                                "radio group '{name}' declares the value '{value}' twice"
                            )))
                        }
                    }
                }
            }
        }
    }

    /// Values of the radio group called `name`, if any.
    pub fn radio_values(&self, name: &str) -> Option<Vec<&str>> {
        match self.fields.get(name) {
            Some(RegisteredField::Radio(values)) => Some(values.iter().map(String::as_str).collect()),
            _ => None,
        }
    }

    /// Number of distinct fields recorded.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field was recorded.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
