//! The Section Composer: assembles the ordered flow list of one logical form section.
//!
//! The composer never computes absolute positions.  It orders items and assigns every overlay an
//! offset relative to where the preceding flowing item leaves the cursor.  Rows built through
//! [`SectionComposer::choice_row`] and [`SectionComposer::field_row`] derive caption offsets from
//! the widget columns so that captions and widgets cannot drift apart, and
//! [`ComposedForm::validate`] checks the result against the page before anything is rendered.

use log::debug;

use crate::content::ContentStore;
use crate::drawable::{
    Anchor, CheckBox, FieldRegistry, Label, PositionedDrawable, TextField, CHECKBOX_SIZE,
};
use crate::error::FormError;
use crate::flow::{FlowItem, PriceTable, TextBlock};
use crate::fonts::FontFace;
use crate::geometry::PageGeometry;
use crate::styles::BASE_FONT_SIZE;

/// Offset of the left field column.
pub const LEFT_COLUMN: f64 = 0.0;
/// Offset of the right field column.
pub const RIGHT_COLUMN: f64 = 240.0;
/// Width of a field occupying one of the two columns.
pub const HALF_FIELD_WIDTH: f64 = 230.0;
/// Height of every text field.
pub const TEXT_FIELD_HEIGHT: f64 = BASE_FONT_SIZE * 1.5;
/// Font size of the captions under text fields.
pub const CAPTION_SIZE: f64 = BASE_FONT_SIZE * 0.6;
/// Baseline lift of the captions under text fields.
pub const CAPTION_YOFFSET: f64 = 3.0;
/// Space between a row of text fields and its captions.
pub const FIELD_ROW_SPACING: f64 = 12.0;
/// Distance between a radio box and the start of its caption.
pub const CHECKBOX_CAPTION_SHIFT: f64 = CHECKBOX_SIZE + 2.0;

/// One member of a row of radio boxes.
#[derive(Clone, Copy, Debug)]
pub struct ChoiceColumn<'a> {
    /// Value submitted when the member is selected.
    pub value: &'a str,
    /// Caption printed to the right of the box.
    pub caption: &'a str,
    /// Tooltip of the box.
    pub tooltip: &'a str,
    /// Horizontal offset of the box from the flow cursor.
    pub offset: f64,
}

impl<'a> ChoiceColumn<'a> {
    /// A member whose caption and tooltip equal its value.
    pub fn new(value: &'a str, offset: f64) -> Self {
        Self {
            value,
            caption: value,
            tooltip: value,
            offset,
        }
    }

    /// Overrides the caption.
    pub fn caption(mut self, caption: &'a str) -> Self {
        self.caption = caption;
        self
    }

    /// Overrides the tooltip.
    pub fn tooltip(mut self, tooltip: &'a str) -> Self {
        self.tooltip = tooltip;
        self
    }
}

/// One text field of a row, together with its caption.
#[derive(Clone, Copy, Debug)]
pub struct FieldColumn<'a> {
    /// Field name.
    pub name: &'a str,
    /// Tooltip of the field.
    pub tooltip: &'a str,
    /// Caption printed under the field.
    pub caption: &'a str,
    /// Horizontal offset of the field from the flow cursor.
    pub offset: f64,
    /// Width of the field.
    pub width: f64,
}

impl<'a> FieldColumn<'a> {
    /// A half-width field in the left column.
    pub fn left(name: &'a str, caption: &'a str) -> Self {
        Self {
            name,
            tooltip: caption,
            caption,
            offset: LEFT_COLUMN,
            width: HALF_FIELD_WIDTH,
        }
    }

    /// A half-width field in the right column.
    pub fn right(name: &'a str, caption: &'a str) -> Self {
        Self {
            offset: RIGHT_COLUMN,
            ..Self::left(name, caption)
        }
    }

    /// Overrides the tooltip.
    pub fn tooltip(mut self, tooltip: &'a str) -> Self {
        self.tooltip = tooltip;
        self
    }

    /// Overrides position and width.
    pub fn span(mut self, offset: f64, width: f64) -> Self {
        self.offset = offset;
        self.width = width;
        self
    }
}

/// A named run of flow items.
#[derive(Debug)]
pub struct Section {
    name: String,
    items: Vec<FlowItem>,
}

impl Section {
    /// Section name, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The items in rendering order.
    pub fn items(&self) -> &[FlowItem] {
        &self.items
    }
}

/// Builder for a [`Section`].
#[derive(Debug)]
pub struct SectionComposer {
    name: String,
    items: Vec<FlowItem>,
}

impl SectionComposer {
    /// Starts an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Appends a paragraph of literal markup.
    pub fn paragraph(&mut self, style: &str, markup: &str) -> Result<&mut Self, FormError> {
        let block = TextBlock::new(style, markup).map_err(|err| {
            FormError::config(format!("section '{}': {}", self.name, err))
        })?;
        self.items.push(FlowItem::Paragraph(block));
        Ok(self)
    }

    /// Appends a paragraph whose markup is read from the content store.
    pub fn content_paragraph(
        &mut self,
        content: &ContentStore,
        key: &str,
        style: &str,
    ) -> Result<&mut Self, FormError> {
        let markup = content.text(key)?;
        let block = TextBlock::new(style, markup).map_err(|err| FormError::content(key, err))?;
        self.items.push(FlowItem::Paragraph(block));
        Ok(self)
    }

    /// Appends blank vertical space.
    pub fn spacer(&mut self, height: f64) -> &mut Self {
        self.items.push(FlowItem::Spacer(height));
        self
    }

    /// Appends a table.
    pub fn table(&mut self, table: PriceTable) -> &mut Self {
        self.items.push(FlowItem::Table(table));
        self
    }

    /// Appends a positioned drawable.
    pub fn overlay(&mut self, drawable: impl PositionedDrawable + 'static) -> &mut Self {
        self.items.push(FlowItem::overlay(drawable));
        self
    }

    /// Appends a bold caption at the start of the current line.
    pub fn row_caption(&mut self, caption: &str) -> &mut Self {
        self.overlay(
            Label::new(caption)
                .with_font(FontFace::Bold, BASE_FONT_SIZE)
                .with_offset(LEFT_COLUMN),
        )
    }

    /// Appends a radio group laid out on the current line, each box followed by its caption.
    ///
    /// Columns must be ordered left to right and leave room for the caption of the previous
    /// member.
    pub fn choice_row(
        &mut self,
        name: &str,
        columns: &[ChoiceColumn<'_>],
    ) -> Result<&mut Self, FormError> {
        if columns.is_empty() {
            return Err(FormError::config(format!(
                "radio group '{name}' has no members"
            )));
        }
        for pair in columns.windows(2) {
            if pair[1].offset < pair[0].offset + CHECKBOX_CAPTION_SHIFT {
                return Err(FormError::config(format!(
                    "radio group '{}': member '{}' at {} overlaps '{}' at {}",
                    name, pair[1].value, pair[1].offset, pair[0].value, pair[0].offset
                )));
            }
        }

        for (index, column) in columns.iter().enumerate() {
            let reserved = columns
                .get(index + 1)
                .map(|next| next.offset - column.offset)
                .unwrap_or(CHECKBOX_CAPTION_SHIFT);
            self.overlay(
                CheckBox::new(name, column.value)?
                    .with_tooltip(column.tooltip)
                    .with_offset(column.offset)
                    .with_reserved_width(reserved),
            );
            self.overlay(
                Label::new(column.caption).with_offset(column.offset + CHECKBOX_CAPTION_SHIFT),
            );
        }
        Ok(self)
    }

    /// Appends a row of text fields, `spacing` points of flow and their captions.
    ///
    /// Captions start at the offset of the field they describe.
    pub fn field_row(
        &mut self,
        columns: &[FieldColumn<'_>],
        spacing: f64,
    ) -> Result<&mut Self, FormError> {
        for pair in columns.windows(2) {
            if pair[0].offset + pair[0].width > pair[1].offset {
                return Err(FormError::config(format!(
                    "text field '{}' overlaps '{}'",
                    pair[0].name, pair[1].name
                )));
            }
        }

        for column in columns {
            self.overlay(
                TextField::new(column.name, column.width, TEXT_FIELD_HEIGHT)?
                    .with_tooltip(column.tooltip)
                    .with_offset(column.offset),
            );
        }
        self.spacer(spacing);
        for column in columns {
            self.overlay(
                Label::new(column.caption)
                    .with_font(FontFace::Light, CAPTION_SIZE)
                    .with_offset(column.offset)
                    .with_yoffset(CAPTION_YOFFSET),
            );
        }
        Ok(self)
    }

    /// Finishes the section.
    pub fn finish(self) -> Section {
        debug!(
            "Composed section '{}' with {} item(s)",
            self.name,
            self.items.len()
        );
        Section {
            name: self.name,
            items: self.items,
        }
    }
}

/// The complete flow list of a document, kept per section until rendering.
#[derive(Debug, Default)]
pub struct ComposedForm {
    sections: Vec<Section>,
}

impl ComposedForm {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a section.
    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// The sections in order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Iterates every item of every section in rendering order.
    pub fn items(&self) -> impl Iterator<Item = &FlowItem> {
        self.sections.iter().flat_map(|section| section.items.iter())
    }

    /// Checks field identities and overlay offsets against `geometry`.
    ///
    /// Flow-anchored overlays must start inside the content box and their declared width must
    /// end inside it.  Returns the identities of every form field.
    pub fn validate(&self, geometry: &PageGeometry) -> Result<FieldRegistry, FormError> {
        let mut registry = FieldRegistry::new();
        let limit = geometry.content_width();

        for section in &self.sections {
            for item in &section.items {
                let FlowItem::Overlay(drawable) = item else {
                    continue;
                };
                if let Some(field) = drawable.field() {
                    registry.register(field)?;
                }
                if drawable.anchor() != Anchor::Flow {
                    continue;
                }
                let offset = drawable.offset().unwrap_or(0.0);
                let end = offset + drawable.measure().width;
                if offset < 0.0 || end > limit + f64::EPSILON {
                    return Err(FormError::config(format!(
                        "section '{}': {:?} spans {}..{} outside the content width {:.1}",
                        section.name, drawable, offset, end, limit
                    )));
                }
            }
        }
        Ok(registry)
    }

    /// Flattens the sections into the flow list.
    pub fn into_items(self) -> Vec<FlowItem> {
        self.sections
            .into_iter()
            .flat_map(|section| section.items)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::styles::NORMAL;

    fn offsets(section: &Section) -> Vec<f64> {
        section
            .items()
            .iter()
            .filter_map(|item| match item {
                FlowItem::Overlay(drawable) => drawable.offset(),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn captions_follow_their_fields() {
        let mut composer = SectionComposer::new("personal");
        composer
            .field_row(
                &[
                    FieldColumn::left("Name", "Vorname und Nachname"),
                    FieldColumn::right("Erziehungsberechtigte", "Erziehungsberechtigte"),
                ],
                FIELD_ROW_SPACING,
            )
            .unwrap();
        let section = composer.finish();

        assert_eq!(section.items().len(), 5);
        assert!(matches!(section.items()[2], FlowItem::Spacer(h) if h == FIELD_ROW_SPACING));
        assert_eq!(offsets(&section), vec![0.0, 240.0, 0.0, 240.0]);
    }

    #[test]
    fn overlapping_columns_are_rejected() {
        let mut composer = SectionComposer::new("x");
        let err = composer
            .field_row(
                &[
                    FieldColumn::left("a", "a"),
                    FieldColumn::left("b", "b").span(100.0, 50.0),
                ],
                FIELD_ROW_SPACING,
            )
            .unwrap_err();
        assert!(matches!(err, FormError::Configuration(_)));

        let err = composer
            .choice_row(
                "Status",
                &[ChoiceColumn::new("a", 60.0), ChoiceColumn::new("b", 65.0)],
            )
            .unwrap_err();
        assert!(matches!(err, FormError::Configuration(_)));
    }

    #[test]
    fn choice_rows_put_captions_right_of_the_box() {
        let mut composer = SectionComposer::new("membership");
        composer
            .row_caption("Als:")
            .choice_row(
                "mitgliedschaft",
                &[
                    ChoiceColumn::new("aktiv", 55.0).caption("aktives"),
                    ChoiceColumn::new("passiv", 125.0).caption("passives Mitglied"),
                ],
            )
            .unwrap();
        let section = composer.finish();
        assert_eq!(
            offsets(&section),
            vec![
                0.0,
                55.0,
                55.0 + CHECKBOX_CAPTION_SHIFT,
                125.0,
                125.0 + CHECKBOX_CAPTION_SHIFT
            ]
        );
    }

    #[test]
    fn validation_rejects_fields_past_the_right_margin() {
        let geometry = PageGeometry::a4_form();
        let mut composer = SectionComposer::new("wide");
        composer
            .field_row(
                &[FieldColumn::left("IBAN", "IBAN").span(300.0, 230.0)],
                FIELD_ROW_SPACING,
            )
            .unwrap();
        let mut form = ComposedForm::new();
        form.push(composer.finish());
        assert!(matches!(
            form.validate(&geometry),
            Err(FormError::Configuration(_))
        ));
    }

    #[test]
    fn validation_rejects_duplicate_radio_values_across_sections() {
        let geometry = PageGeometry::a4_form();
        let mut form = ComposedForm::new();
        for name in ["first", "second"] {
            let mut composer = SectionComposer::new(name);
            composer
                .paragraph(NORMAL, "Geschlecht")
                .unwrap()
                .choice_row("Geschlecht", &[ChoiceColumn::new("divers", 60.0)])
                .unwrap();
            form.push(composer.finish());
        }
        assert!(form.validate(&geometry).is_err());
    }

    #[test]
    fn malformed_content_markup_names_the_key() {
        let content =
            ContentStore::from_json(r#"{"legal_text": {"title": "<b>offen"}}"#).unwrap();
        let mut composer = SectionComposer::new("statute");
        let err = composer
            .content_paragraph(&content, "legal_text.title", NORMAL)
            .unwrap_err();
        assert!(matches!(err, FormError::ContentData { ref key, .. } if key == "legal_text.title"));
    }
}
