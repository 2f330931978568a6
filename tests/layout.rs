use std::fs;

use membership_form::drawable::{
    Anchor, CheckBox, DisplayList, DrawCommand, Label, Logo, PositionedDrawable, Rect, TextField,
};
use membership_form::error::FormError;
use membership_form::flow::{
    CellRule, CellVAlign, FlowItem, LayoutBackend, Paginator, Placement, PriceTable, TextBlock,
};
use membership_form::fonts::FontFace;
use membership_form::geometry::{FlowCursor, PageGeometry};
use membership_form::styles::TextAlign;
use membership_form::FormConfig;

const LINE_HEIGHT: f64 = 12.0;

/// Gives every paragraph one line and keeps every painted command with its cursor.
#[derive(Default)]
struct Recorder {
    placed: Vec<(usize, FlowCursor)>,
    painted: Vec<(FlowCursor, Anchor, DrawCommand)>,
}

impl Recorder {
    fn widgets(&self) -> Vec<&DrawCommand> {
        self.painted
            .iter()
            .map(|(_, _, command)| command)
            .filter(|command| {
                matches!(
                    command,
                    DrawCommand::TextField(_)
                        | DrawCommand::RadioButton(_)
                        | DrawCommand::DrawString { .. }
                )
            })
            .collect()
    }
}

impl LayoutBackend for Recorder {
    fn place(
        &mut self,
        index: usize,
        item: &FlowItem,
        cursor: &FlowCursor,
        available: f64,
    ) -> Result<Placement, FormError> {
        self.placed.push((index, *cursor));
        let height = match item {
            FlowItem::Spacer(height) => *height,
            _ => LINE_HEIGHT,
        };
        if height > available {
            Ok(Placement::partial(0.0))
        } else {
            Ok(Placement::complete(height))
        }
    }

    fn paint(
        &mut self,
        cursor: &FlowCursor,
        anchor: Anchor,
        commands: DisplayList,
    ) -> Result<(), FormError> {
        assert!(commands.is_balanced());
        for command in commands {
            self.painted.push((*cursor, anchor, command));
        }
        Ok(())
    }
}

fn paragraph(text: &str) -> FlowItem {
    FlowItem::Paragraph(TextBlock::new("Normal", text).expect("plain text"))
}

#[test]
fn checkbox_and_label_share_the_flow_line() {
    let geometry = PageGeometry::a4_form();
    let margin = geometry.margins().left;
    let items = vec![
        paragraph("Als:"),
        FlowItem::overlay(CheckBox::new("m", "aktiv").unwrap().with_offset(55.0)),
        FlowItem::overlay(Label::new("aktives").with_offset(10.0)),
    ];

    let mut recorder = Recorder::default();
    let pages = Paginator::new(geometry).run(&items, &mut recorder).unwrap();
    assert_eq!(pages, 1);
    assert_eq!(recorder.placed[0].1.x, margin);
    assert_eq!(recorder.placed[0].1.y, geometry.top_y());

    let widgets = recorder.widgets();
    let radio = match widgets[0] {
        DrawCommand::RadioButton(radio) => radio,
        other => panic!("expected a radio button, got {other:?}"),
    };
    assert_eq!(radio.rect.x, margin + 55.0);
    assert_eq!(radio.value, "aktiv");
    let label_x = match widgets[1] {
        DrawCommand::DrawString { x, text, .. } => {
            assert_eq!(text, "aktives");
            *x
        }
        other => panic!("expected a string, got {other:?}"),
    };
    assert_eq!(label_x, margin + 10.0);

    let cursors: Vec<FlowCursor> = recorder.painted.iter().map(|(cursor, ..)| *cursor).collect();
    assert!(cursors.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(cursors[0].y, geometry.top_y() - LINE_HEIGHT);
}

#[test]
fn side_by_side_text_fields_keep_their_distance() {
    let geometry = PageGeometry::a4_form();
    let items = vec![
        FlowItem::overlay(TextField::new("Name", 230.0, 13.5).unwrap().with_offset(0.0)),
        FlowItem::overlay(TextField::new("Ort", 230.0, 13.5).unwrap().with_offset(240.0)),
    ];

    let mut recorder = Recorder::default();
    Paginator::new(geometry).run(&items, &mut recorder).unwrap();

    let rects: Vec<_> = recorder
        .widgets()
        .into_iter()
        .filter_map(|command| match command {
            DrawCommand::TextField(field) => Some(field.rect),
            _ => None,
        })
        .collect();
    assert_eq!(rects.len(), 2);
    assert_eq!(rects[1].x - rects[0].x, 240.0);
    assert_eq!(rects[0].y, rects[1].y);
}

#[test]
fn cursor_restarts_at_the_top_after_a_page_break() {
    let geometry = PageGeometry::a4_form();
    let lines = (geometry.content_height() / LINE_HEIGHT) as usize;
    let mut items: Vec<FlowItem> = (0..lines + 2).map(|_| paragraph("Zeile")).collect();
    items.push(FlowItem::overlay(
        TextField::new("Unterschrift", 310.0, 13.5).unwrap(),
    ));

    let mut recorder = Recorder::default();
    let pages = Paginator::new(geometry).run(&items, &mut recorder).unwrap();
    assert_eq!(pages, 2);

    let first_on_second_page = recorder
        .placed
        .iter()
        .find(|(_, cursor)| cursor.page == 2)
        .map(|(_, cursor)| *cursor)
        .expect("an item on page two");
    assert_eq!(first_on_second_page.y, geometry.top_y());

    let (cursor, anchor, _) = recorder.painted.last().expect("painted field");
    assert_eq!(*anchor, Anchor::Flow);
    assert_eq!(cursor.page, 2);
    // the paragraph that did not fit is placed again on page two, followed by the last one
    assert!((cursor.y - (geometry.top_y() - 2.0 * LINE_HEIGHT)).abs() < 1e-9);
}

#[test]
fn overlay_after_a_full_page_stays_on_that_page() {
    let geometry = PageGeometry::a4_form();
    let lines = (geometry.content_height() / LINE_HEIGHT) as usize;
    let mut items: Vec<FlowItem> = (0..lines).map(|_| paragraph("Zeile")).collect();
    items.push(FlowItem::overlay(
        TextField::new("Bemerkung", 230.0, 13.5).unwrap(),
    ));
    items.push(paragraph("Übertrag"));
    items.push(FlowItem::overlay(
        TextField::new("Unterschrift", 310.0, 13.5).unwrap(),
    ));

    let mut recorder = Recorder::default();
    let pages = Paginator::new(geometry).run(&items, &mut recorder).unwrap();
    assert_eq!(pages, 2);

    let fields: Vec<(FlowCursor, &str)> = recorder
        .painted
        .iter()
        .filter_map(|(cursor, _, command)| match command {
            DrawCommand::TextField(field) => Some((*cursor, field.name.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(fields.len(), 2);

    let (cursor, name) = fields[0];
    assert_eq!(name, "Bemerkung");
    assert_eq!(cursor.page, 1);
    let filled = geometry.top_y() - lines as f64 * LINE_HEIGHT;
    assert!((cursor.y - filled).abs() < 1e-9);

    let spilled = recorder
        .placed
        .iter()
        .rev()
        .find(|(index, _)| *index == lines + 1)
        .map(|(_, cursor)| *cursor)
        .expect("the paragraph after the field");
    assert_eq!(spilled.page, 2);
    assert_eq!(spilled.y, geometry.top_y());

    let (cursor, name) = fields[1];
    assert_eq!(name, "Unterschrift");
    assert_eq!(cursor.page, 2);
    assert!((cursor.y - (geometry.top_y() - LINE_HEIGHT)).abs() < 1e-9);
}

#[test]
fn fee_table_header_is_plain_and_body_is_centered() {
    let table = PriceTable::new(
        vec!["Kategorie".into(), "Monat".into(), "Jahr".into()],
        vec![vec!["Erwachsene".into(), "12,00 €".into(), "144,00 €".into()]],
    )
    .unwrap();
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.cell(0, 0), Some("Kategorie"));
    assert_eq!(table.cell(1, 2), Some("144,00 €"));
    assert_eq!(table.cell(2, 0), None);

    for column in 0..3 {
        let header = table.cell_format(0, column);
        assert_eq!(header.face, FontFace::Bold);
        assert_eq!(header.align, TextAlign::Left);
        assert_eq!(header.rule, CellRule::LineAfter);
    }

    let category = table.cell_format(1, 0);
    assert_eq!(category.face, FontFace::Light);
    assert_eq!(category.align, TextAlign::Left);
    assert_eq!(category.valign, CellVAlign::Middle);
    assert_eq!(category.rule, CellRule::Grid);

    for column in 1..3 {
        let price = table.cell_format(1, column);
        assert_eq!(price.align, TextAlign::Center);
        assert_eq!(price.valign, CellVAlign::Middle);
        assert_eq!(price.rule, CellRule::Grid);
    }
}

#[test]
fn missing_content_key_produces_no_output() {
    let dir = tempfile::tempdir().expect("temp dir");
    let content = dir.path().join("data.json");
    fs::write(
        &content,
        r#"{"prices": {"stand_date": "01.01.2025", "header": ["Gruppe"], "rows": []}}"#,
    )
    .unwrap();
    let output = dir.path().join("tsv.pdf");
    let config = FormConfig::new()
        .with_content_path(&content)
        .with_output_path(&output);

    let err = membership_form::generate(&config).unwrap_err();
    match err {
        FormError::ContentData { key, .. } => assert_eq!(key, "legal_text.section6.title"),
        other => panic!("expected a content error, got {other:?}"),
    }
    assert!(!output.exists());
}

fn drawables() -> Vec<Box<dyn PositionedDrawable>> {
    vec![
        Box::new(TextField::new("Name", 230.0, 13.5).unwrap().with_offset(240.0)),
        Box::new(CheckBox::new("Geschlecht", "divers").unwrap().with_offset(220.0)),
        Box::new(Label::new("weiblich").with_offset(142.0).with_yoffset(3.0)),
        Box::new(Rect::new(495.0, 65.0).unwrap()),
        Box::new(Logo::new("logo")),
    ]
}

#[test]
fn drawables_take_no_flow_space() {
    for drawable in drawables() {
        assert_eq!(drawable.measure().height, 0.0, "{drawable:?}");
    }
}

#[test]
fn rendering_twice_gives_the_same_commands() {
    let cursor = FlowCursor {
        page: 1,
        x: 56.7,
        y: 500.0,
    };
    for drawable in drawables() {
        let first = drawable.render(&cursor).unwrap();
        let second = drawable.render(&cursor).unwrap();
        assert_eq!(first, second, "{drawable:?}");
        assert!(first.is_balanced());
        assert!(!first.is_empty());
    }
}

#[test]
fn blank_field_names_are_rejected() {
    assert!(matches!(
        TextField::new("", 100.0, 13.5),
        Err(FormError::Configuration(_))
    ));
    assert!(matches!(
        CheckBox::new("  ", "aktiv"),
        Err(FormError::Configuration(_))
    ));
    assert!(matches!(
        CheckBox::new("Status", ""),
        Err(FormError::Configuration(_))
    ));
}
