//! Core entry point for the membership_form crate.
//!
//! The form is described as a flat list of [`flow::FlowItem`]s: paragraphs, spacers and tables
//! that advance a cursor down the page, plus positioned drawables (fields, labels, frames and
//! the logo) that are placed relative to wherever the cursor is at that moment.  The
//! [`builder::DocumentBuilder`] paginates that list with `genpdf` and adds the fillable
//! AcroForm fields with `lopdf`.

pub mod acroform;
pub mod assets;
pub mod builder;
pub mod composer;
pub mod config;
pub mod content;
pub mod drawable;
mod elements;
pub mod error;
pub mod flow;
pub mod fonts;
pub mod form;
pub mod geometry;
pub mod richtext;
pub mod styles;

pub use builder::{generate, DocumentBuilder, GenerationReport, RenderedForm};
pub use config::FormConfig;
pub use error::FormError;
