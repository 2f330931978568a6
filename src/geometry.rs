//! Page geometry, the flow cursor and unit conversions.
//!
//! All coordinates handled by this crate are PDF points with the origin in the lower-left corner
//! of the page.  `genpdf` measures in millimetres from the upper-left corner; the helpers at the
//! bottom of this module translate between the two systems.

use genpdf::Mm;

const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;

/// One centimetre expressed in points.
pub const CM: f64 = POINTS_PER_INCH / 2.54;

/// Width and height of an A4 sheet in points.
pub const A4: (f64, f64) = (595.275_590_551, 841.889_763_78);

/// Page margins in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageMargins {
    /// Distance between the top edge and the first line of content.
    pub top: f64,
    /// Distance between the right edge and the content box.
    pub right: f64,
    /// Distance between the bottom edge and the last line of content.
    pub bottom: f64,
    /// Distance between the left edge and the content box.
    pub left: f64,
}

/// Immutable page size and margins, fixed when the document is created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    width: f64,
    height: f64,
    margins: PageMargins,
}

impl PageGeometry {
    /// Creates a geometry from a page size and its margins, all in points.
    pub fn new(width: f64, height: f64, margins: PageMargins) -> Self {
        Self {
            width,
            height,
            margins,
        }
    }

    /// The geometry of the printed membership form: A4 with 2 cm side margins.
    pub fn a4_form() -> Self {
        Self::new(
            A4.0,
            A4.1,
            PageMargins {
                top: 0.75 * CM,
                right: 2.0 * CM,
                bottom: 1.0 * CM,
                left: 2.0 * CM,
            },
        )
    }

    /// Page width in points.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Page height in points.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The configured margins.
    pub fn margins(&self) -> PageMargins {
        self.margins
    }

    /// Width of the content box between the side margins.
    pub fn content_width(&self) -> f64 {
        self.width - self.margins.left - self.margins.right
    }

    /// Height of the content box between the top and bottom margins.
    pub fn content_height(&self) -> f64 {
        self.height - self.margins.top - self.margins.bottom
    }

    /// Vertical position of the first flow line on every page.
    pub fn top_y(&self) -> f64 {
        self.height - self.margins.top
    }

    /// Lowest vertical position flowing content may reach.
    pub fn bottom_y(&self) -> f64 {
        self.margins.bottom
    }

    pub(crate) fn paper_size(&self) -> genpdf::Size {
        genpdf::Size::new(pt_to_mm(self.width), pt_to_mm(self.height))
    }

    pub(crate) fn genpdf_margins(&self) -> genpdf::Margins {
        genpdf::Margins::trbl(
            pt_to_mm(self.margins.top),
            pt_to_mm(self.margins.right),
            pt_to_mm(self.margins.bottom),
            pt_to_mm(self.margins.left),
        )
    }
}

/// The Document Builder's absolute position at the top of the next flow item.
///
/// Only the builder advances the cursor; positioned drawables receive it by shared reference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowCursor {
    /// One-based page number.
    pub page: usize,
    /// Horizontal start of the flow line.
    pub x: f64,
    /// Vertical position of the flow line; decreases as content is placed.
    pub y: f64,
}

impl FlowCursor {
    /// The cursor at the top margin of the given page.
    pub fn top_of_page(geometry: &PageGeometry, page: usize) -> Self {
        Self {
            page,
            x: geometry.margins.left,
            y: geometry.top_y(),
        }
    }

    /// Vertical space left before the bottom margin.
    pub fn remaining(&self, geometry: &PageGeometry) -> f64 {
        (self.y - geometry.bottom_y()).max(0.0)
    }

    /// Whether nothing has been placed on the current page yet.
    pub fn is_at_top(&self, geometry: &PageGeometry) -> bool {
        (self.y - geometry.top_y()).abs() < f64::EPSILON
    }

    pub(crate) fn advanced(self, height: f64) -> Self {
        Self {
            y: self.y - height,
            ..self
        }
    }
}

/// Converts points to `genpdf` millimetres.
pub fn pt_to_mm(points: f64) -> Mm {
    Mm::from(printpdf::Mm(points * MM_PER_INCH / POINTS_PER_INCH))
}

/// Converts `genpdf` millimetres to points.
pub fn mm_to_pt(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0 * POINTS_PER_INCH / MM_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_starts_at_top_margin() {
        let geometry = PageGeometry::a4_form();
        let cursor = FlowCursor::top_of_page(&geometry, 3);
        assert_eq!(cursor.page, 3);
        assert_eq!(cursor.x, 2.0 * CM);
        assert!((cursor.y - (A4.1 - 0.75 * CM)).abs() < 1e-9);
        assert!(cursor.is_at_top(&geometry));
    }

    #[test]
    fn advancing_reduces_remaining_space() {
        let geometry = PageGeometry::a4_form();
        let cursor = FlowCursor::top_of_page(&geometry, 1).advanced(100.0);
        assert!(!cursor.is_at_top(&geometry));
        let expected = geometry.content_height() - 100.0;
        assert!((cursor.remaining(&geometry) - expected).abs() < 1e-9);
    }

    #[test]
    fn unit_conversion_round_trips() {
        let points = 123.25;
        assert!((mm_to_pt(pt_to_mm(points)) - points).abs() < 1e-9);
        assert!((mm_to_pt(pt_to_mm(CM)) - CM).abs() < 1e-9);
    }
}
