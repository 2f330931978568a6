//! The Document Builder: paginates a flow list into the finished, fillable PDF.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use genpdf::error::Error;
use genpdf::style;
use genpdf::{Margins, PageDecorator};
use log::{debug, info, warn};

use crate::acroform;
use crate::assets::Assets;
use crate::config::FormConfig;
use crate::content::ContentStore;
use crate::drawable::FieldRegistry;
use crate::elements::{FlowRenderer, RenderLog};
use crate::error::FormError;
use crate::flow::FlowItem;
use crate::fonts::{font_size, FontHandle};
use crate::form::MembershipForm;
use crate::geometry::PageGeometry;
use crate::styles::{StyleRegistry, BASE_FONT_SIZE};

/// Title stored in the document metadata.
pub const DEFAULT_TITLE: &str = "Eintrittserklärung TSV Berlin-Wedding 1862 e.V.";

/// Output of a successful render.
#[derive(Debug)]
pub struct RenderedForm {
    /// The finished PDF.
    pub bytes: Vec<u8>,
    /// Number of pages.
    pub pages: usize,
    /// Every form field written into the document.
    pub fields: FieldRegistry,
}

/// Renders flow lists onto pages of a fixed geometry.
#[derive(Clone, Debug)]
pub struct DocumentBuilder {
    geometry: PageGeometry,
    styles: StyleRegistry,
    title: String,
}

impl DocumentBuilder {
    /// Creates a builder using the form styles.
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            styles: StyleRegistry::form_defaults(),
            title: DEFAULT_TITLE.to_owned(),
        }
    }

    /// Replaces the paragraph styles.
    pub fn with_styles(mut self, styles: StyleRegistry) -> Self {
        self.styles = styles;
        self
    }

    /// Sets the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// The page geometry.
    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Lays out `items`, then writes frames and form fields into the result.
    ///
    /// Nothing is written to disk; a failure anywhere leaves no partial document behind.
    pub fn render(&self, items: Vec<FlowItem>, assets: &Assets) -> Result<RenderedForm, FormError> {
        let mut document = genpdf::Document::new(assets.fonts().primary_family());
        document.set_title(self.title.clone());
        document.set_paper_size(self.geometry.paper_size());
        document.set_font_size(font_size(BASE_FONT_SIZE));
        let fonts = FontHandle::install(&mut document, assets.fonts());
        document.set_page_decorator(FormPageDecorator::new(self.geometry.genpdf_margins()));

        let log = Rc::new(RefCell::new(RenderLog::default()));
        document.push(FlowRenderer::new(
            items,
            self.geometry,
            fonts,
            self.styles.clone(),
            assets.images().clone(),
            Rc::clone(&log),
        ));

        let mut raw = Vec::new();
        let rendered = document.render(&mut raw);
        let log = log.replace(RenderLog::default());
        if let Err(err) = rendered {
            return Err(log.failure.unwrap_or(FormError::Render(err)));
        }
        debug!(
            "Rendered {} page(s), {} byte(s) before finishing",
            log.pages,
            raw.len()
        );

        let bytes = acroform::apply_overlays(&raw, &log.overlays)?;
        Ok(RenderedForm {
            bytes,
            pages: log.pages,
            fields: log.fields,
        })
    }
}

/// Applies the page margins and keeps count of the pages.
struct FormPageDecorator {
    page: usize,
    margins: Margins,
}

impl FormPageDecorator {
    fn new(margins: Margins) -> Self {
        Self { page: 0, margins }
    }
}

impl PageDecorator for FormPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        _context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        _style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;
        debug!("Starting page {}", self.page);
        area.add_margins(self.margins);
        Ok(area)
    }
}

/// Summary of a [`generate`] run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationReport {
    /// Where the form was written.
    pub output: PathBuf,
    /// Number of pages.
    pub pages: usize,
    /// Number of distinct form fields.
    pub fields: usize,
    /// Size of the written file.
    pub bytes: usize,
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("form.pdf"));
    name.push(".part");
    path.with_file_name(name)
}

/// Writes `bytes` next to `path` and moves the file into place once it is complete.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<(), FormError> {
    let partial = partial_path(path);
    let written = fs::write(&partial, bytes).and_then(|()| fs::rename(&partial, path));
    if let Err(source) = written {
        if let Err(cleanup) = fs::remove_file(&partial) {
            if cleanup.kind() != io::ErrorKind::NotFound {
                warn!(
                    "Failed to remove partial output {}: {}",
                    partial.display(),
                    cleanup
                );
            }
        }
        return Err(FormError::OutputWrite {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

/// Generates the membership form described by `config`.
///
/// Content and assets are read before rendering starts; the output file only appears once the
/// whole document rendered successfully.
pub fn generate(config: &FormConfig) -> Result<GenerationReport, FormError> {
    let geometry = PageGeometry::a4_form();
    let content = ContentStore::from_path(config.content_path())?;
    let form = MembershipForm::compose(&content, &geometry)?;
    let assets = Assets::load(config)?;

    let rendered = DocumentBuilder::new(geometry).render(form.into_items(), &assets)?;
    write_output(config.output_path(), &rendered.bytes)?;

    let report = GenerationReport {
        output: config.output_path().to_path_buf(),
        pages: rendered.pages,
        fields: rendered.fields.len(),
        bytes: rendered.bytes.len(),
    };
    info!(
        "Wrote {} ({} page(s), {} field(s), {} bytes)",
        report.output.display(),
        report.pages,
        report.fields,
        report.bytes
    );
    Ok(report)
}
