//! The flow list and the pagination driver.
//!
//! A [`Paginator`] walks the flow list top to bottom.  Flowing items are handed to a
//! [`LayoutBackend`] that reports how much height they consumed; positioned drawables are rendered
//! at the current cursor and their commands are handed back to the backend for painting.  Only
//! the paginator moves the cursor.

use log::{debug, trace};

use crate::content::PriceSheet;
use crate::drawable::{Anchor, DisplayList, PositionedDrawable};
use crate::error::FormError;
use crate::fonts::FontFace;
use crate::geometry::{FlowCursor, PageGeometry};
use crate::richtext::{self, Span};
use crate::styles::{TextAlign, BASE_FONT_SIZE};

/// Row height of the price table.
pub const TABLE_ROW_HEIGHT: f64 = 16.2;
/// Font size of the price table.
pub const TABLE_FONT_SIZE: f64 = BASE_FONT_SIZE - 2.0;

/// A paragraph of inline markup set in a named style.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBlock {
    style: String,
    spans: Vec<Span>,
}

impl TextBlock {
    /// Parses `markup` for the style called `style`.
    pub fn new(style: impl Into<String>, markup: &str) -> Result<Self, richtext::ParseError> {
        Ok(Self {
            style: style.into(),
            spans: richtext::parse_markup(markup)?,
        })
    }

    /// Name of the paragraph style.
    pub fn style(&self) -> &str {
        &self.style
    }

    /// Parsed inline runs.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// The text without markup.
    pub fn plain_text(&self) -> String {
        richtext::plain_text(&self.spans)
    }
}

/// Which rules are drawn around a table cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellRule {
    /// All four edges.
    Grid,
    /// Only the vertical line after the cell.
    LineAfter,
}

/// Vertical placement of the text inside a table cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellVAlign {
    Middle,
    Bottom,
}

/// How a single table cell is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellFormat {
    pub face: FontFace,
    pub align: TextAlign,
    pub valign: CellVAlign,
    pub rule: CellRule,
}

/// A table with a bold, unframed header row and a gridded light body.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    row_height: f64,
    font_size: f64,
}

impl PriceTable {
    /// Creates a table; every row must have as many cells as the header.
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, FormError> {
        if header.is_empty() {
            return Err(FormError::config("a table needs at least one column"));
        }
        if rows.iter().any(|row| row.len() != header.len()) {
            return Err(FormError::config(format!(
                "every table row needs {} cells",
                header.len()
            )));
        }
        Ok(Self {
            header,
            rows,
            row_height: TABLE_ROW_HEIGHT,
            font_size: TABLE_FONT_SIZE,
        })
    }

    /// Column headings.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Body rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Nominal height of every row.
    pub fn row_height(&self) -> f64 {
        self.row_height
    }

    /// Font size of every cell.
    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    /// Number of rows including the header.
    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }

    /// Nominal height of the whole table.
    pub fn height(&self) -> f64 {
        self.row_height * self.row_count() as f64
    }

    /// Text of a cell; row 0 is the header.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        let cells = match row {
            0 => &self.header,
            _ => self.rows.get(row - 1)?,
        };
        cells.get(column).map(String::as_str)
    }

    /// Font, alignment and rules of a cell; row 0 is the header.
    ///
    /// The header is set bold and left aligned, separated only by a line after each column.
    /// Body cells are light, gridded and vertically centered; every column but the first is
    /// centered horizontally.
    pub fn cell_format(&self, row: usize, column: usize) -> CellFormat {
        if row == 0 {
            return CellFormat {
                face: FontFace::Bold,
                align: TextAlign::Left,
                valign: CellVAlign::Bottom,
                rule: CellRule::LineAfter,
            };
        }
        CellFormat {
            face: FontFace::Light,
            align: if column == 0 {
                TextAlign::Left
            } else {
                TextAlign::Center
            },
            valign: CellVAlign::Middle,
            rule: CellRule::Grid,
        }
    }

    /// Relative column widths: the first column is wider than the rest.
    pub fn column_weights(&self) -> Vec<usize> {
        (0..self.header.len())
            .map(|column| if column == 0 { 3 } else { 2 })
            .collect()
    }
}

impl TryFrom<&PriceSheet> for PriceTable {
    type Error = FormError;

    fn try_from(sheet: &PriceSheet) -> Result<Self, Self::Error> {
        Self::new(sheet.header.clone(), sheet.rows.clone())
    }
}

/// One entry of the flow list.
#[derive(Debug)]
pub enum FlowItem {
    /// A wrapped paragraph; advances the cursor by its height.
    Paragraph(TextBlock),
    /// Blank vertical space.
    Spacer(f64),
    /// A gridded table.
    Table(PriceTable),
    /// A positioned drawable; never advances the cursor.
    Overlay(Box<dyn PositionedDrawable>),
}

impl FlowItem {
    /// Wraps a drawable.
    pub fn overlay(drawable: impl PositionedDrawable + 'static) -> Self {
        Self::Overlay(Box::new(drawable))
    }

    /// Whether the item takes part in vertical flow.
    pub fn is_flowing(&self) -> bool {
        !matches!(self, Self::Overlay(_))
    }
}

/// Space consumed by one placement of a flowing item.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Placement {
    /// Height consumed on the current page, in points.
    pub height: f64,
    /// Whether part of the item still has to go onto the next page.
    pub has_more: bool,
}

impl Placement {
    /// The item fit completely.
    pub fn complete(height: f64) -> Self {
        Self {
            height,
            has_more: false,
        }
    }

    /// The item continues on the next page.
    pub fn partial(height: f64) -> Self {
        Self {
            height,
            has_more: true,
        }
    }
}

/// Places flowing content and paints overlay commands.
pub trait LayoutBackend {
    /// Places the flow item at `index` with its top edge at `cursor`.
    ///
    /// `available` is the vertical space left above the bottom margin.  A backend may be asked to
    /// place the same item again on the following page after reporting `has_more`.
    fn place(
        &mut self,
        index: usize,
        item: &FlowItem,
        cursor: &FlowCursor,
        available: f64,
    ) -> Result<Placement, FormError>;

    /// Paints the commands rendered by a positioned drawable at `cursor`.
    fn paint(
        &mut self,
        cursor: &FlowCursor,
        anchor: Anchor,
        commands: DisplayList,
    ) -> Result<(), FormError>;
}

/// Result of laying out one page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageLayout {
    /// The cursor after the last item placed on the page.
    pub cursor: FlowCursor,
    /// Whether the flow list continues on another page.
    pub has_more: bool,
}

impl PageLayout {
    /// Height consumed on this page.
    pub fn used_height(&self, geometry: &PageGeometry) -> f64 {
        geometry.top_y() - self.cursor.y
    }
}

/// Distributes a flow list across pages.
#[derive(Clone, Debug)]
pub struct Paginator {
    geometry: PageGeometry,
    next: usize,
    page: usize,
}

impl Paginator {
    /// Starts at the first item on page one.
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            next: 0,
            page: 1,
        }
    }

    /// The page geometry.
    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// The page the next call to [`Paginator::layout_page`] fills.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Fills one page, starting with a fresh cursor at the top margin.
    pub fn layout_page<B>(
        &mut self,
        items: &[FlowItem],
        backend: &mut B,
    ) -> Result<PageLayout, FormError>
    where
        B: LayoutBackend + ?Sized,
    {
        let mut cursor = FlowCursor::top_of_page(&self.geometry, self.page);
        debug!("Laying out page {} from item {}", self.page, self.next);

        while let Some(item) = items.get(self.next) {
            match item {
                FlowItem::Overlay(drawable) => {
                    trace!("Rendering overlay {} at {:?}", self.next, cursor);
                    let commands = drawable.render(&cursor)?;
                    backend.paint(&cursor, drawable.anchor(), commands)?;
                    self.next += 1;
                }
                _ => {
                    let available = cursor.remaining(&self.geometry);
                    let placement = backend.place(self.next, item, &cursor, available)?;
                    trace!(
                        "Placed item {} at {:?}: {:?}",
                        self.next,
                        cursor,
                        placement
                    );

                    if placement.has_more
                        && placement.height <= 0.0
                        && cursor.is_at_top(&self.geometry)
                    {
                        return Err(FormError::Layout(format!(
                            "flow item {} does not fit on an empty page",
                            self.next
                        )));
                    }

                    cursor = cursor.advanced(placement.height.min(available));
                    if placement.has_more {
                        self.page += 1;
                        return Ok(PageLayout {
                            cursor,
                            has_more: true,
                        });
                    }
                    self.next += 1;
                }
            }
        }

        Ok(PageLayout {
            cursor,
            has_more: false,
        })
    }

    /// Lays out every page and returns the number of pages used.
    pub fn run<B>(&mut self, items: &[FlowItem], backend: &mut B) -> Result<usize, FormError>
    where
        B: LayoutBackend + ?Sized,
    {
        loop {
            let page = self.page;
            if !self.layout_page(items, backend)?.has_more {
                return Ok(page);
            }
        }
    }
}
