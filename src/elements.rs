//! `genpdf` side of the Document Builder.
//!
//! [`FlowRenderer`] is the single root element pushed into the `genpdf` document.  Every time
//! `genpdf` asks it to fill a page it runs the [`Paginator`] for one page against a
//! [`PageCanvas`], which places flowing items as regular `genpdf` elements and paints overlay
//! commands.  Text and images are painted directly; frames and form widgets are recorded in the
//! shared [`RenderLog`] and written by the finishing pass in [`crate::acroform`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use genpdf::elements::{Image, Paragraph};
use genpdf::error::{Error, ErrorKind};
use genpdf::style::{Color, Style, StyledString};
use genpdf::{render, Element, Margins, Position, RenderResult, Scale, Size};
use image::{DynamicImage, GenericImageView};
use log::{debug, trace};

use crate::acroform::{OverlayOp, PlacedOverlay};
use crate::drawable::{Anchor, DisplayList, DrawCommand, FieldIdentity, FieldRegistry, HAIRLINE};
use crate::error::FormError;
use crate::flow::{
    CellRule, CellVAlign, FlowItem, LayoutBackend, Paginator, Placement, PriceTable, TextBlock,
};
use crate::fonts::{FontFace, FontHandle};
use crate::geometry::{mm_to_pt, pt_to_mm, FlowCursor, PageGeometry};
use crate::styles::{StyleRegistry, BASE_FONT_SIZE};

/// Resolution at which images map one pixel to one point.
const IMAGE_DPI: f64 = 72.0;
/// Horizontal padding inside table cells.
const CELL_PADDING_X: f64 = 3.0;
/// Gap between bottom-aligned cell text and the row's lower edge.
const CELL_PADDING_BOTTOM: f64 = 3.0;
/// Color of the table rules.
const RULE_COLOR: Color = Color::Greyscale(128);

/// Everything recorded while the pages are rendered.
#[derive(Debug, Default)]
pub struct RenderLog {
    /// Frames and widgets waiting for the finishing pass.
    pub overlays: Vec<PlacedOverlay>,
    /// Identities of every widget painted so far.
    pub fields: FieldRegistry,
    /// Number of pages laid out.
    pub pages: usize,
    /// The error that aborted rendering, if any.
    pub failure: Option<FormError>,
}

/// A blank gap of fixed height, cut off at the bottom of the page.
struct FixedSpace {
    height: f64,
}

impl Element for FixedSpace {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let available = mm_to_pt(area.size().height);
        let mut result = RenderResult::default();
        result.size = Size::new(0, pt_to_mm(self.height.min(available)));
        Ok(result)
    }
}

fn paragraph_element(
    block: &TextBlock,
    styles: &StyleRegistry,
    fonts: &FontHandle,
) -> Result<Box<dyn Element>, FormError> {
    let style = styles.get(block.style())?;
    let mut paragraph: Paragraph = block.spans().iter().map(StyledString::from).collect();
    paragraph.set_alignment(style.align().into());

    let element = paragraph.styled(style.to_genpdf(fonts)).padded(Margins::trbl(
        pt_to_mm(style.space_before()),
        0,
        pt_to_mm(style.space_after()),
        0,
    ));
    Ok(Box::new(element))
}

/// The price table, drawn one row at a time so that it can continue on the next page.
struct TableElement {
    table: PriceTable,
    fonts: FontHandle,
    next_row: usize,
}

impl TableElement {
    fn new(table: &PriceTable, fonts: &FontHandle) -> Self {
        Self {
            table: table.clone(),
            fonts: *fonts,
            next_row: 0,
        }
    }

    fn render_cell(
        &self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
        row: usize,
        column: usize,
    ) -> Result<(), Error> {
        let format = self.table.cell_format(row, column);
        let text = self.table.cell(row, column).unwrap_or_default();
        let cell_style = self.fonts.style(format.face, self.table.font_size());
        let row_height = self.table.row_height();
        let line_height = mm_to_pt(cell_style.line_height(&context.font_cache));
        let top = match format.valign {
            CellVAlign::Middle => (row_height - line_height) / 2.0,
            CellVAlign::Bottom => row_height - line_height - CELL_PADDING_BOTTOM,
        };

        let mut text_area = area.clone();
        text_area.add_margins(Margins::trbl(
            pt_to_mm(top.max(0.0)),
            pt_to_mm(CELL_PADDING_X),
            0,
            pt_to_mm(CELL_PADDING_X),
        ));
        Paragraph::new(text.to_owned())
            .aligned(format.align.into())
            .styled(cell_style)
            .render(context, text_area, style)?;

        let width = area.size().width;
        let height = pt_to_mm(row_height);
        let rule = Style::new().with_color(RULE_COLOR);
        let points = match format.rule {
            CellRule::LineAfter => vec![Position::new(width, 0), Position::new(width, height)],
            CellRule::Grid => vec![
                Position::new(0, 0),
                Position::new(width, 0),
                Position::new(width, height),
                Position::new(0, height),
                Position::new(0, 0),
            ],
        };
        area.draw_line(points, rule);
        Ok(())
    }
}

impl Element for TableElement {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let row_height = pt_to_mm(self.table.row_height());
        let weights = self.table.column_weights();
        let width = area.size().width;
        let mut result = RenderResult::default();
        let mut placed: u32 = 0;

        while self.next_row < self.table.row_count() {
            if row_height > area.size().height {
                result.has_more = true;
                break;
            }
            for (column, cell) in area.split_horizontally(&weights).into_iter().enumerate() {
                self.render_cell(context, cell, style, self.next_row, column)?;
            }
            area.add_offset(Position::new(0, row_height));
            self.next_row += 1;
            placed += 1;
        }

        result.size = Size::new(width, pt_to_mm(self.table.row_height() * f64::from(placed)));
        Ok(result)
    }
}

#[derive(Clone, Copy, Debug)]
struct PaintState {
    line_width: f64,
    face: FontFace,
    size: f64,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            line_width: HAIRLINE,
            face: FontFace::Regular,
            size: BASE_FONT_SIZE,
        }
    }
}

/// One page of the `genpdf` document seen as a [`LayoutBackend`].
pub struct PageCanvas<'a, 'p> {
    context: &'a genpdf::Context,
    area: render::Area<'p>,
    style: Style,
    geometry: PageGeometry,
    fonts: &'a FontHandle,
    styles: &'a StyleRegistry,
    images: &'a BTreeMap<String, DynamicImage>,
    pending: &'a mut Option<(usize, Box<dyn Element>)>,
    log: &'a mut RenderLog,
}

impl<'a, 'p> PageCanvas<'a, 'p> {
    fn element_for(&self, item: &FlowItem) -> Result<Box<dyn Element>, FormError> {
        match item {
            FlowItem::Paragraph(block) => paragraph_element(block, self.styles, self.fonts),
            FlowItem::Spacer(height) => Ok(Box::new(FixedSpace { height: *height })),
            FlowItem::Table(table) => Ok(Box::new(TableElement::new(table, self.fonts))),
            FlowItem::Overlay(_) => Err(FormError::Layout(
                "positioned drawables are painted, not placed".to_owned(),
            )),
        }
    }

    /// The whole sheet as a drawing area with its origin in the upper-left corner.
    fn sheet(&self) -> render::Area<'p> {
        let margins = self.geometry.margins();
        let mut sheet = self.area.clone();
        sheet.add_offset(Position::new(
            pt_to_mm(-margins.left),
            pt_to_mm(-margins.top),
        ));
        sheet.set_width(pt_to_mm(self.geometry.width()));
        sheet.set_height(pt_to_mm(self.geometry.height()));
        sheet
    }

    fn draw_string(&self, state: &PaintState, x: f64, y: f64, text: &str) -> Result<(), FormError> {
        let style = self.fonts.style(state.face, state.size);
        let glyph_height = style
            .font(&self.context.font_cache)
            .glyph_height(style.font_size());
        let top = pt_to_mm(self.geometry.height() - y) - glyph_height;
        let printed = self.sheet().print_str(
            &self.context.font_cache,
            Position::new(pt_to_mm(x), top),
            style,
            text,
        )?;
        if printed {
            Ok(())
        } else {
            Err(FormError::Layout(format!(
                "label '{text}' does not fit on the page"
            )))
        }
    }

    fn draw_image(&self, key: &str, x: f64, y: f64, scale: f64) -> Result<(), FormError> {
        let source = self
            .images
            .get(key)
            .ok_or_else(|| FormError::config(format!("no image registered under '{key}'")))?;
        let height = f64::from(source.dimensions().1) * scale;
        let top = self.geometry.height() - (y + height);

        let mut image = Image::from_dynamic_image(source.clone())?
            .with_position(Position::new(pt_to_mm(x), pt_to_mm(top)))
            .with_scale(Scale::new(scale, scale))
            .with_dpi(IMAGE_DPI);
        image.render(self.context, self.sheet(), self.style)?;
        Ok(())
    }

    fn record(&mut self, page: usize, op: OverlayOp) {
        trace!("Recording overlay on page {}: {:?}", page, op);
        self.log.overlays.push(PlacedOverlay { page, op });
    }
}

impl<'a, 'p> LayoutBackend for PageCanvas<'a, 'p> {
    fn place(
        &mut self,
        index: usize,
        item: &FlowItem,
        cursor: &FlowCursor,
        _available: f64,
    ) -> Result<Placement, FormError> {
        let mut element = match self.pending.take() {
            Some((pending, element)) if pending == index => element,
            _ => self.element_for(item)?,
        };

        let mut area = self.area.clone();
        area.add_offset(Position::new(0, pt_to_mm(self.geometry.top_y() - cursor.y)));
        let result = element.render(self.context, area, self.style)?;
        let height = mm_to_pt(result.size.height);

        if result.has_more {
            *self.pending = Some((index, element));
            Ok(Placement::partial(height))
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
        trace!("Painting {:?}-anchored overlay at {:?}", anchor, cursor);
        let mut stack: Vec<PaintState> = Vec::new();
        let mut state = PaintState::default();

        for command in commands {
            match command {
                DrawCommand::SaveState => stack.push(state),
                DrawCommand::RestoreState => {
                    state = stack.pop().ok_or_else(|| {
                        FormError::Layout("drawing state restored more often than saved".into())
                    })?;
                }
                DrawCommand::SetLineWidth(width) => state.line_width = width,
                DrawCommand::SetFont { face, size } => {
                    state.face = face;
                    state.size = size;
                }
                DrawCommand::DrawString { x, y, text } => self.draw_string(&state, x, y, &text)?,
                DrawCommand::StrokeRect(rect) => self.record(
                    cursor.page,
                    OverlayOp::Frame {
                        rect,
                        line_width: state.line_width,
                    },
                ),
                DrawCommand::DrawImage { key, x, y, scale } => self.draw_image(&key, x, y, scale)?,
                DrawCommand::TextField(widget) => {
                    self.log
                        .fields
                        .register(FieldIdentity::Text { name: &widget.name })?;
                    self.record(cursor.page, OverlayOp::TextField(widget));
                }
                DrawCommand::RadioButton(widget) => {
                    self.log.fields.register(FieldIdentity::Radio {
                        name: &widget.name,
                        value: &widget.value,
                    })?;
                    self.record(cursor.page, OverlayOp::Radio(widget));
                }
            }
        }

        if stack.is_empty() {
            Ok(())
        } else {
            Err(FormError::Layout(
                "drawing state saved without being restored".into(),
            ))
        }
    }
}

/// Root element that streams a flow list into the `genpdf` document.
pub struct FlowRenderer {
    items: Vec<FlowItem>,
    paginator: Paginator,
    fonts: FontHandle,
    styles: StyleRegistry,
    images: BTreeMap<String, DynamicImage>,
    pending: Option<(usize, Box<dyn Element>)>,
    log: Rc<RefCell<RenderLog>>,
}

impl FlowRenderer {
    /// Creates the renderer; the log is shared with the caller to collect results.
    pub fn new(
        items: Vec<FlowItem>,
        geometry: PageGeometry,
        fonts: FontHandle,
        styles: StyleRegistry,
        images: BTreeMap<String, DynamicImage>,
        log: Rc<RefCell<RenderLog>>,
    ) -> Self {
        Self {
            items,
            paginator: Paginator::new(geometry),
            fonts,
            styles,
            images,
            pending: None,
            log,
        }
    }
}

impl Element for FlowRenderer {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let geometry = *self.paginator.geometry();
        let mut log = self.log.borrow_mut();
        let mut canvas = PageCanvas {
            context,
            area: area.clone(),
            style,
            geometry,
            fonts: &self.fonts,
            styles: &self.styles,
            images: &self.images,
            pending: &mut self.pending,
            log: &mut log,
        };

        let outcome = self.paginator.layout_page(&self.items, &mut canvas);
        drop(canvas);

        match outcome {
            Ok(layout) => {
                log.pages = layout.cursor.page;
                debug!(
                    "Finished page {} ({:.1}pt used, more: {})",
                    layout.cursor.page,
                    layout.used_height(&geometry),
                    layout.has_more
                );
                let mut result = RenderResult::default();
                result.size = Size::new(area.size().width, pt_to_mm(layout.used_height(&geometry)));
                result.has_more = layout.has_more;
                Ok(result)
            }
            Err(err) => {
                let message = err.to_string();
                log.failure = Some(err);
                Err(Error::new(message, ErrorKind::InvalidData))
            }
        }
    }
}
