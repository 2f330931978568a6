//! Run configuration: where the inputs live and where the form is written.

use std::path::{Path, PathBuf};

/// Default location of the content store.
pub const DEFAULT_CONTENT_PATH: &str = "assets/data.json";
/// Default location of the logo image.
pub const DEFAULT_LOGO_PATH: &str = "assets/logo.png";
/// Default output file.
pub const DEFAULT_OUTPUT_PATH: &str = "tsv.pdf";

/// Paths used by a single generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormConfig {
    content_path: PathBuf,
    fonts_dir: Option<PathBuf>,
    logo_path: PathBuf,
    output_path: PathBuf,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            content_path: PathBuf::from(DEFAULT_CONTENT_PATH),
            fonts_dir: None,
            logo_path: PathBuf::from(DEFAULT_LOGO_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

impl FormConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the content store file.
    pub fn with_content_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.content_path = path.into();
        self
    }

    /// Sets an explicit font directory; otherwise the default search locations are used.
    pub fn with_fonts_dir(mut self, path: impl Into<Option<PathBuf>>) -> Self {
        self.fonts_dir = path.into();
        self
    }

    /// Sets the logo image.
    pub fn with_logo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.logo_path = path.into();
        self
    }

    /// Sets the output file.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// The content store file.
    pub fn content_path(&self) -> &Path {
        &self.content_path
    }

    /// The explicit font directory, if any.
    pub fn fonts_dir(&self) -> Option<&Path> {
        self.fonts_dir.as_deref()
    }

    /// The logo image.
    pub fn logo_path(&self) -> &Path {
        &self.logo_path
    }

    /// The output file.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}
