//! Finishing pass over the rendered PDF built on top of `lopdf`.
//!
//! `genpdf` lays out the flowing content and the labels.  Everything it cannot express is
//! recorded as [`PlacedOverlay`]s while the pages are rendered and written into the document
//! here: frames are appended to the page content inside their own `q`/`Q` scope, form widgets
//! become an AcroForm with text fields and radio groups.  The read-back helpers at the bottom of
//! the module operate on finished documents and are used for round-trip checks.

use std::collections::BTreeMap;

use log::{debug, info};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::drawable::{BoxRect, RadioWidget, TextFieldWidget, WidgetLook};
use crate::error::FormError;
use crate::styles::BASE_FONT_SIZE;

/// Name under which the field font is registered in the form resources.
const FIELD_FONT: &str = "Helv";
/// Appearance state of an unselected radio member.
const OFF_STATE: &str = "Off";
/// Field flags: radio button that cannot be toggled off once selected.
const RADIO_FLAGS: i64 = (1 << 15) | (1 << 14);
/// Annotation flags: print the widget.
const PRINT_FLAG: i64 = 4;

/// Drawing recorded during layout that is applied by [`apply_overlays`].
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayOp {
    /// An unfilled frame.
    Frame {
        /// Frame rectangle.
        rect: BoxRect,
        /// Stroke width.
        line_width: f64,
    },
    /// A text field widget.
    TextField(TextFieldWidget),
    /// A radio group member.
    Radio(RadioWidget),
}

/// An [`OverlayOp`] together with the one-based page it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedOverlay {
    /// One-based page number.
    pub page: usize,
    /// What to draw.
    pub op: OverlayOp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldKind {
    Text,
    Radio,
}

struct FieldGroup<'a> {
    name: &'a str,
    kind: FieldKind,
    tooltip: &'a str,
    widgets: Vec<(usize, &'a OverlayOp)>,
}

/// Writes frames and form fields into `pdf_bytes`.
pub fn apply_overlays(pdf_bytes: &[u8], overlays: &[PlacedOverlay]) -> Result<Vec<u8>, FormError> {
    if overlays.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let mut document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages();
    let page_id = |page: usize| -> Result<ObjectId, FormError> {
        u32::try_from(page)
            .ok()
            .and_then(|number| pages.get(&number).copied())
            .ok_or_else(|| {
                FormError::Layout(format!(
                    "overlay refers to page {} but the document has {} pages",
                    page,
                    pages.len()
                ))
            })
    };

    let mut frames: BTreeMap<usize, String> = BTreeMap::new();
    let mut groups: Vec<FieldGroup<'_>> = Vec::new();
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();

    for overlay in overlays {
        match &overlay.op {
            OverlayOp::Frame { rect, line_width } => {
                let ops = frames.entry(overlay.page).or_default();
                ops.push_str(&frame_operators(rect, *line_width));
            }
            OverlayOp::TextField(widget) => {
                add_to_group(
                    &mut groups,
                    &mut index,
                    &widget.name,
                    FieldKind::Text,
                    &widget.tooltip,
                    (overlay.page, &overlay.op),
                )?;
            }
            OverlayOp::Radio(widget) => {
                add_to_group(
                    &mut groups,
                    &mut index,
                    &widget.name,
                    FieldKind::Radio,
                    &widget.tooltip,
                    (overlay.page, &overlay.op),
                )?;
            }
        }
    }

    for (page, ops) in &frames {
        append_page_content(&mut document, page_id(*page)?, ops)?;
    }

    if !groups.is_empty() {
        let mut fields = Vec::with_capacity(groups.len());
        for group in &groups {
            let field_id = write_field(&mut document, group, &page_id)?;
            fields.push(Object::Reference(field_id));
        }
        install_acroform(&mut document, fields)?;
    }

    info!(
        "Applied {} frame page(s) and {} form field(s)",
        frames.len(),
        groups.len()
    );

    save(&mut document)
}

fn add_to_group<'a>(
    groups: &mut Vec<FieldGroup<'a>>,
    index: &mut BTreeMap<&'a str, usize>,
    name: &'a str,
    kind: FieldKind,
    tooltip: &'a str,
    widget: (usize, &'a OverlayOp),
) -> Result<(), FormError> {
    match index.get(name) {
        Some(&position) => {
            let group = &mut groups[position];
            if group.kind != kind {
                return Err(FormError::config(format!(
                    "'{name}' is used by both a text field and a radio group"
                )));
            }
            group.widgets.push(widget);
        }
        None => {
            index.insert(name, groups.len());
            groups.push(FieldGroup {
                name,
                kind,
                tooltip,
                widgets: vec![widget],
            });
        }
    }
    Ok(())
}

fn number(value: f64) -> String {
    let formatted = format!("{value:.3}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-0" => "0".to_owned(),
        other => other.to_owned(),
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as _)
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

/// Encodes `value` as a PDF text string, switching to UTF-16BE for non-ASCII text.
fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        Object::string_literal(value)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in value.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

fn decode_text_string(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => bytes.iter().map(|&byte| char::from(byte)).collect(),
    }
}

fn color(components: [f64; 3]) -> Object {
    Object::Array(components.iter().map(|&component| real(component)).collect())
}

fn rect_array(rect: &BoxRect) -> Object {
    Object::Array(vec![
        real(rect.x),
        real(rect.y),
        real(rect.right()),
        real(rect.top()),
    ])
}

fn frame_operators(rect: &BoxRect, line_width: f64) -> String {
    format!(
        "q\n{} w\n0 0 0 RG\n{} {} {} {} re\nS\nQ\n",
        number(line_width),
        number(rect.x),
        number(rect.y),
        number(rect.width),
        number(rect.height)
    )
}

fn append_page_content(
    document: &mut Document,
    page_id: ObjectId,
    ops: &str,
) -> Result<(), FormError> {
    let existing = match document.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let open = document.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let close = document.add_object(Stream::new(
        Dictionary::new(),
        format!("Q\n{ops}").into_bytes(),
    ));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open));
    contents.extend(existing);
    contents.push(Object::Reference(close));

    document
        .get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));
    Ok(())
}

fn border_operators(width: f64, height: f64, look: &WidgetLook) -> String {
    let inset = look.border_width / 2.0;
    format!(
        "{} {} {} rg\n0 0 {} {} re\nf\n{} w\n{} {} {} RG\n{} {} {} {} re\nS\n",
        number(look.fill[0]),
        number(look.fill[1]),
        number(look.fill[2]),
        number(width),
        number(height),
        number(look.border_width),
        number(look.border[0]),
        number(look.border[1]),
        number(look.border[2]),
        number(inset),
        number(inset),
        number(width - look.border_width),
        number(height - look.border_width)
    )
}

fn cross_operators(size: f64, look: &WidgetLook) -> String {
    let pad = size * 0.2;
    format!(
        "{} {} {} RG\n{} w\n{} {} m\n{} {} l\n{} {} m\n{} {} l\nS\n",
        number(look.border[0]),
        number(look.border[1]),
        number(look.border[2]),
        number(look.border_width * 3.0),
        number(pad),
        number(pad),
        number(size - pad),
        number(size - pad),
        number(pad),
        number(size - pad),
        number(size - pad),
        number(pad)
    )
}

fn appearance(document: &mut Document, rect: &BoxRect, content: String) -> ObjectId {
    let mut dictionary = Dictionary::new();
    dictionary.set("Type", name("XObject"));
    dictionary.set("Subtype", name("Form"));
    dictionary.set(
        "BBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            real(rect.width),
            real(rect.height),
        ]),
    );
    document.add_object(Stream::new(dictionary, content.into_bytes()))
}

fn widget_dictionary(
    parent: ObjectId,
    page: ObjectId,
    rect: &BoxRect,
    look: &WidgetLook,
) -> Dictionary {
    let mut characteristics = Dictionary::new();
    characteristics.set("BG", color(look.fill));
    characteristics.set("BC", color(look.border));

    let mut border = Dictionary::new();
    border.set("W", real(look.border_width));
    border.set("S", name("S"));

    let mut dictionary = Dictionary::new();
    dictionary.set("Type", name("Annot"));
    dictionary.set("Subtype", name("Widget"));
    dictionary.set("Parent", Object::Reference(parent));
    dictionary.set("P", Object::Reference(page));
    dictionary.set("Rect", rect_array(rect));
    dictionary.set("F", Object::Integer(PRINT_FLAG));
    dictionary.set("MK", Object::Dictionary(characteristics));
    dictionary.set("BS", Object::Dictionary(border));
    dictionary
}

fn push_annotation(
    document: &mut Document,
    page_id: ObjectId,
    widget_id: ObjectId,
) -> Result<(), FormError> {
    let page = document.get_object_mut(page_id)?.as_dict_mut()?;
    match page.get_mut(b"Annots") {
        Ok(Object::Array(annotations)) => annotations.push(Object::Reference(widget_id)),
        _ => page.set("Annots", Object::Array(vec![Object::Reference(widget_id)])),
    }
    Ok(())
}

fn write_field<F>(
    document: &mut Document,
    group: &FieldGroup<'_>,
    page_id: &F,
) -> Result<ObjectId, FormError>
where
    F: Fn(usize) -> Result<ObjectId, FormError>,
{
    let field_id = document.new_object_id();
    let mut kids = Vec::with_capacity(group.widgets.len());

    for (page, op) in &group.widgets {
        let page = page_id(*page)?;
        let widget_id = match op {
            OverlayOp::TextField(widget) => {
                let normal = appearance(
                    document,
                    &widget.rect,
                    border_operators(widget.rect.width, widget.rect.height, &widget.look),
                );
                let mut states = Dictionary::new();
                states.set("N", Object::Reference(normal));

                let mut dictionary = widget_dictionary(field_id, page, &widget.rect, &widget.look);
                dictionary.set("AP", Object::Dictionary(states));
                if !widget.tooltip.is_empty() {
                    dictionary.set("TU", text_string(&widget.tooltip));
                }
                document.add_object(dictionary)
            }
            OverlayOp::Radio(widget) => {
                let size = widget.rect.width;
                let off = border_operators(size, size, &widget.look);
                let on = format!("{}{}", off, cross_operators(size, &widget.look));
                let on_id = appearance(document, &widget.rect, on);
                let off_id = appearance(document, &widget.rect, off);

                let mut normal = Dictionary::new();
                normal.set(widget.value.as_bytes().to_vec(), Object::Reference(on_id));
                normal.set(OFF_STATE, Object::Reference(off_id));
                let mut states = Dictionary::new();
                states.set("N", Object::Dictionary(normal));

                let mut dictionary = widget_dictionary(field_id, page, &widget.rect, &widget.look);
                dictionary.set("AP", Object::Dictionary(states));
                dictionary.set("AS", name(OFF_STATE));
                if !widget.tooltip.is_empty() {
                    dictionary.set("TU", text_string(&widget.tooltip));
                }
                document.add_object(dictionary)
            }
            OverlayOp::Frame { .. } => continue,
        };
        push_annotation(document, page, widget_id)?;
        kids.push(Object::Reference(widget_id));
    }

    let mut field = Dictionary::new();
    field.set("T", text_string(group.name));
    if !group.tooltip.is_empty() {
        field.set("TU", text_string(group.tooltip));
    }
    match group.kind {
        FieldKind::Text => {
            field.set("FT", name("Tx"));
            field.set("V", Object::string_literal(""));
            field.set(
                "DA",
                Object::string_literal(format!(
                    "/{} {} Tf 0 g",
                    FIELD_FONT,
                    number(BASE_FONT_SIZE)
                )),
            );
        }
        FieldKind::Radio => {
            field.set("FT", name("Btn"));
            field.set("Ff", Object::Integer(RADIO_FLAGS));
            field.set("V", name(OFF_STATE));
        }
    }
    field.set("Kids", Object::Array(kids));
    document
        .objects
        .insert(field_id, Object::Dictionary(field));

    debug!(
        "Wrote {:?} field '{}' with {} widget(s)",
        group.kind,
        group.name,
        group.widgets.len()
    );
    Ok(field_id)
}

fn save(document: &mut Document) -> Result<Vec<u8>, FormError> {
    let mut buffer = Vec::new();
    document
        .save_to(&mut buffer)
        .map_err(|err| FormError::Pdf(lopdf::Error::IO(err)))?;
    Ok(buffer)
}

fn catalog_id(document: &Document) -> Result<ObjectId, FormError> {
    Ok(document.trailer.get(b"Root")?.as_reference()?)
}

fn install_acroform(document: &mut Document, fields: Vec<Object>) -> Result<(), FormError> {
    let mut font = Dictionary::new();
    font.set("Type", name("Font"));
    font.set("Subtype", name("Type1"));
    font.set("BaseFont", name("Helvetica"));
    font.set("Encoding", name("WinAnsiEncoding"));
    let font_id = document.add_object(font);

    let mut fonts = Dictionary::new();
    fonts.set(FIELD_FONT, Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let mut form = Dictionary::new();
    form.set("Fields", Object::Array(fields));
    form.set("NeedAppearances", Object::Boolean(false));
    form.set("DR", Object::Dictionary(resources));
    form.set(
        "DA",
        Object::string_literal(format!("/{FIELD_FONT} 0 Tf 0 g")),
    );
    let form_id = document.add_object(form);

    let catalog_id = catalog_id(document)?;
    document
        .get_object_mut(catalog_id)?
        .as_dict_mut()?
        .set("AcroForm", Object::Reference(form_id));
    Ok(())
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Result<&'a Object, FormError> {
    match object {
        Object::Reference(id) => Ok(document.get_object(*id)?),
        other => Ok(other),
    }
}

fn field_ids(document: &Document) -> Result<Vec<ObjectId>, FormError> {
    let catalog = document.get_dictionary(catalog_id(document)?)?;
    let form = match catalog.get(b"AcroForm") {
        Ok(form) => resolve(document, form)?.as_dict()?,
        Err(_) => return Ok(Vec::new()),
    };
    let fields = resolve(document, form.get(b"Fields")?)?.as_array()?;
    Ok(fields
        .iter()
        .filter_map(|field| field.as_reference().ok())
        .collect())
}

fn field_name(field: &Dictionary) -> Option<String> {
    match field.get(b"T") {
        Ok(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

fn find_field(document: &Document, field: &str) -> Result<ObjectId, FormError> {
    for id in field_ids(document)? {
        if field_name(document.get_dictionary(id)?).as_deref() == Some(field) {
            return Ok(id);
        }
    }
    Err(FormError::config(format!("the document has no field called '{field}'")))
}

fn kid_ids(field: &Dictionary) -> Vec<ObjectId> {
    match field.get(b"Kids") {
        Ok(Object::Array(kids)) => kids
            .iter()
            .filter_map(|kid| kid.as_reference().ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// The "on" state of a radio member, taken from its normal appearance dictionary.
fn on_state(document: &Document, widget: &Dictionary) -> Result<Option<String>, FormError> {
    let states = match widget.get(b"AP") {
        Ok(states) => resolve(document, states)?.as_dict()?,
        Err(_) => return Ok(None),
    };
    // text widgets carry a single appearance stream instead of a state dictionary
    let normal = match resolve(document, states.get(b"N")?)? {
        Object::Dictionary(normal) => normal,
        _ => return Ok(None),
    };
    Ok(normal
        .iter()
        .map(|(key, _)| String::from_utf8_lossy(key).into_owned())
        .find(|key| key != OFF_STATE))
}

fn value_of(field: &Dictionary) -> String {
    match field.get(b"V") {
        Ok(Object::String(bytes, _)) => decode_text_string(bytes),
        Ok(Object::Name(value)) => String::from_utf8_lossy(value).into_owned(),
        _ => match field.get(b"FT") {
            Ok(Object::Name(kind)) if kind.as_slice() == b"Btn" => OFF_STATE.to_owned(),
            _ => String::new(),
        },
    }
}

/// Reads the current value of every form field; unselected radio groups read as `Off`.
pub fn field_values(pdf_bytes: &[u8]) -> Result<BTreeMap<String, String>, FormError> {
    let document = Document::load_mem(pdf_bytes)?;
    let mut values = BTreeMap::new();
    for id in field_ids(&document)? {
        let field = document.get_dictionary(id)?;
        if let Some(name) = field_name(field) {
            values.insert(name, value_of(field));
        }
    }
    Ok(values)
}

/// Values of every member of the radio group `field`, in widget order.
pub fn radio_options(pdf_bytes: &[u8], field: &str) -> Result<Vec<String>, FormError> {
    let document = Document::load_mem(pdf_bytes)?;
    let parent = document.get_dictionary(find_field(&document, field)?)?;
    let mut options = Vec::new();
    for kid in kid_ids(parent) {
        if let Some(state) = on_state(&document, document.get_dictionary(kid)?)? {
            options.push(state);
        }
    }
    Ok(options)
}

/// Values of the members of `field` whose appearance is currently switched on.
pub fn selected_members(pdf_bytes: &[u8], field: &str) -> Result<Vec<String>, FormError> {
    let document = Document::load_mem(pdf_bytes)?;
    let parent = document.get_dictionary(find_field(&document, field)?)?;
    let mut selected = Vec::new();
    for kid in kid_ids(parent) {
        if let Ok(Object::Name(state)) = document.get_dictionary(kid)?.get(b"AS") {
            if state.as_slice() != OFF_STATE.as_bytes() {
                selected.push(String::from_utf8_lossy(state).into_owned());
            }
        }
    }
    Ok(selected)
}

/// Selects the member of radio group `field` whose value is `value` and clears all others.
pub fn select_radio(pdf_bytes: &[u8], field: &str, value: &str) -> Result<Vec<u8>, FormError> {
    let mut document = Document::load_mem(pdf_bytes)?;
    let parent_id = find_field(&document, field)?;
    let kids = kid_ids(document.get_dictionary(parent_id)?);

    let mut states = Vec::with_capacity(kids.len());
    for kid in &kids {
        states.push(on_state(&document, document.get_dictionary(*kid)?)?);
    }
    if !states.iter().any(|state| state.as_deref() == Some(value)) {
        return Err(FormError::config(format!(
            "radio group '{field}' has no member with value '{value}'"
        )));
    }

    for (kid, state) in kids.iter().zip(&states) {
        let appearance = if state.as_deref() == Some(value) {
            value
        } else {
            OFF_STATE
        };
        document
            .get_object_mut(*kid)?
            .as_dict_mut()?
            .set("AS", name(appearance));
    }
    document
        .get_object_mut(parent_id)?
        .as_dict_mut()?
        .set("V", name(value));

    save(&mut document)
}

/// Stores `value` in the text field `field`.
pub fn fill_text(pdf_bytes: &[u8], field: &str, value: &str) -> Result<Vec<u8>, FormError> {
    let mut document = Document::load_mem(pdf_bytes)?;
    let id = find_field(&document, field)?;
    let dictionary = document.get_object_mut(id)?.as_dict_mut()?;
    match dictionary.get(b"FT") {
        Ok(Object::Name(kind)) if kind.as_slice() == b"Tx" => {}
        _ => {
            return Err(FormError::config(format!(
                "'{field}' is not a text field"
            )))
        }
    }
    dictionary.set("V", text_string(value));

    save(&mut document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn numbers_are_compact() {
        assert_eq!(number(0.25), "0.25");
        assert_eq!(number(10.0), "10");
        assert_eq!(number(-0.0001), "0");
        assert_eq!(number(1.23456), "1.235");
    }

    #[test]
    fn non_ascii_text_uses_utf16() {
        match text_string("männlich") {
            Object::String(bytes, _) => {
                assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
                assert_eq!(decode_text_string(&bytes), "männlich");
            }
            other => panic!("unexpected object {other:?}"),
        }
        match text_string("Name") {
            Object::String(bytes, _) => assert_eq!(decode_text_string(&bytes), "Name"),
            other => panic!("unexpected object {other:?}"),
        }
    }

    #[test]
    fn saved_documents_load_again() {
        let mut document = Document::with_version("1.5");
        let pages_id = document.add_object(lopdf::dictionary! {
            "Type" => "Pages",
            "Count" => Object::Integer(0),
            "Kids" => Vec::<Object>::new(),
        });
        let catalog = document.add_object(lopdf::dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog);

        let bytes = save(&mut document).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(catalog_id(&reloaded).unwrap(), catalog);
        assert!(field_values(&bytes).unwrap().is_empty());
    }

    #[test]
    fn frames_are_scoped() {
        let ops = frame_operators(
            &BoxRect {
                x: 38.0,
                y: 300.0,
                width: 495.0,
                height: 65.0,
            },
            0.25,
        );
        assert!(ops.starts_with("q\n"));
        assert!(ops.ends_with("Q\n"));
        assert!(ops.contains("38 300 495 65 re"));
    }
}
