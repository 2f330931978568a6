//! Error taxonomy shared by every stage of form generation.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that abort the generation of the membership form.
///
/// Every failure is fatal: the run stops and no output document is left behind.
#[derive(Debug)]
pub enum FormError {
    /// A font, image or content-store file could not be read or decoded.
    AssetLoad {
        /// The file (or directory) that failed to load.
        path: PathBuf,
        /// Human readable description of the failure.
        reason: String,
    },
    /// A content-store key is missing, has the wrong shape, or carries malformed markup.
    ContentData {
        /// The key as referenced by the composer, e.g. `legal_text.section6.title`.
        key: String,
        /// Human readable description of the failure.
        reason: String,
    },
    /// A drawable or section was configured inconsistently.
    Configuration(String),
    /// A flow item cannot be placed, not even on an empty page.
    Layout(String),
    /// The flowing-content backend reported an error.
    Render(genpdf::error::Error),
    /// The PDF finishing pass or a read-back failed.
    Pdf(lopdf::Error),
    /// The output document could not be written.
    OutputWrite {
        /// Destination that was being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl FormError {
    pub(crate) fn asset(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn content(key: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::ContentData {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns whether the error belongs to the asset loading tier.
    pub fn is_asset_error(&self) -> bool {
        matches!(self, Self::AssetLoad { .. })
    }
}

impl From<genpdf::error::Error> for FormError {
    fn from(err: genpdf::error::Error) -> Self {
        Self::Render(err)
    }
}

impl From<lopdf::Error> for FormError {
    fn from(err: lopdf::Error) -> Self {
        Self::Pdf(err)
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssetLoad { path, reason } => {
                write!(f, "Failed to load asset {}: {}", path.display(), reason)
            }
            Self::ContentData { key, reason } => {
                write!(f, "Invalid content for key '{}': {}", key, reason)
            }
            Self::Configuration(message) => write!(f, "Invalid form configuration: {message}"),
            Self::Layout(message) => write!(f, "Layout failed: {message}"),
            Self::Render(err) => write!(f, "Failed to render document: {err}"),
            Self::Pdf(err) => write!(f, "Failed to process PDF structure: {err}"),
            Self::OutputWrite { path, source } => {
                write!(f, "Failed to write output {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for FormError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(err) => Some(err),
            Self::Pdf(err) => Some(err),
            Self::OutputWrite { source, .. } => Some(source),
            Self::AssetLoad { .. }
            | Self::ContentData { .. }
            | Self::Configuration(_)
            | Self::Layout(_) => None,
        }
    }
}
