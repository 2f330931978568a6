//! Font discovery, loading and the font handle used by every drawing call.
//!
//! Fonts are loaded once, before anything is rendered, and registered with the document through
//! [`FontHandle::install`].  There is no global registry: styles and labels resolve their faces
//! through the handle returned by that call.

use std::env;
use std::path::{Path, PathBuf};

use genpdf::fonts::{Font, FontData, FontFamily};
use genpdf::style::Style;
use genpdf::Document;
use log::{debug, info};

use crate::error::FormError;

/// Name of the font family the form is set in.
pub const FONT_FAMILY_NAME: &str = "OpenSans";

/// Environment variable that overrides the font directory.
pub const FONTS_DIR_ENV: &str = "MEMBERSHIP_FORM_FONTS_DIR";

/// The five faces registered for the form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontFace {
    /// Body text.
    Regular,
    /// Captions of choice rows and table headers.
    Bold,
    /// Emphasis inside paragraphs.
    Italic,
    /// Title and subtitles.
    BoldItalic,
    /// Small captions under text fields and table bodies.
    Light,
}

impl FontFace {
    /// All faces in registration order.
    pub const ALL: [FontFace; 5] = [
        FontFace::Regular,
        FontFace::Bold,
        FontFace::Italic,
        FontFace::BoldItalic,
        FontFace::Light,
    ];

    /// File name of the face inside the font directory.
    pub fn file_name(self) -> &'static str {
        match self {
            FontFace::Regular => "OpenSans-Regular.ttf",
            FontFace::Bold => "OpenSans-Bold.ttf",
            FontFace::Italic => "OpenSans-Italic.ttf",
            FontFace::BoldItalic => "OpenSans-BoldItalic.ttf",
            FontFace::Light => "OpenSans-Light.ttf",
        }
    }
}

fn font_directory_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    let mut push = |candidate: PathBuf| {
        if !candidates.iter().any(|existing| existing == &candidate) {
            candidates.push(candidate);
        }
    };

    if let Some(path) = explicit {
        push(path.to_path_buf());
    }

    if let Some(path) = env::var_os(FONTS_DIR_ENV) {
        if !path.is_empty() {
            push(PathBuf::from(path));
        }
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push(bin_dir.join("assets/fonts"));
        }
    }

    push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"));

    candidates
}

fn missing_font_files(path: &Path) -> Vec<&'static str> {
    FontFace::ALL
        .iter()
        .map(|face| face.file_name())
        .filter(|name| !path.join(name).is_file())
        .collect()
}

/// Finds the first directory holding all five faces, preferring `explicit` when given.
pub fn resolve_font_directory(explicit: Option<&Path>) -> Result<PathBuf, FormError> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates(explicit) {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }

        let missing = missing_font_files(&candidate);
        if missing.is_empty() {
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }

    Err(FormError::asset(
        explicit.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("assets/fonts")),
        format!(
            "unable to locate the {} fonts; checked: {}; set {} to override",
            FONT_FAMILY_NAME,
            attempts.join(", "),
            FONTS_DIR_ENV
        ),
    ))
}

/// Indicates whether all five faces can be found in one of the default locations.
pub fn default_fonts_available() -> bool {
    resolve_font_directory(None).is_ok()
}

/// Raw font data for the five faces, loaded before rendering starts.
#[derive(Clone, Debug)]
pub struct FontSet {
    regular: FontData,
    bold: FontData,
    italic: FontData,
    bold_italic: FontData,
    light: FontData,
}

impl FontSet {
    /// Loads every face from the resolved font directory.
    pub fn load(explicit_dir: Option<&Path>) -> Result<Self, FormError> {
        let directory = resolve_font_directory(explicit_dir)?;
        let load = |face: FontFace| {
            let path = directory.join(face.file_name());
            debug!("Loading font face {:?} from {}", face, path.display());
            FontData::load(&path, None).map_err(|err| FormError::asset(&path, err))
        };

        let set = Self {
            regular: load(FontFace::Regular)?,
            bold: load(FontFace::Bold)?,
            italic: load(FontFace::Italic)?,
            bold_italic: load(FontFace::BoldItalic)?,
            light: load(FontFace::Light)?,
        };
        info!(
            "Loaded {} font family from {}",
            FONT_FAMILY_NAME,
            directory.display()
        );
        Ok(set)
    }

    /// The four-face family used as the document default.
    pub fn primary_family(&self) -> FontFamily<FontData> {
        FontFamily {
            regular: self.regular.clone(),
            bold: self.bold.clone(),
            italic: self.italic.clone(),
            bold_italic: self.bold_italic.clone(),
        }
    }

    fn light_family(&self) -> FontFamily<FontData> {
        FontFamily {
            regular: self.light.clone(),
            bold: self.light.clone(),
            italic: self.light.clone(),
            bold_italic: self.light.clone(),
        }
    }
}

/// Capability returned by the one-time font registration.
///
/// The primary family is the document default, so only the light face needs an explicit family
/// reference.
#[derive(Clone, Copy, Debug)]
pub struct FontHandle {
    light: FontFamily<Font>,
}

impl FontHandle {
    /// Registers the faces that are not part of the document default family.
    ///
    /// `document` must have been created from [`FontSet::primary_family`].
    pub fn install(document: &mut Document, fonts: &FontSet) -> Self {
        let light = document.add_font_family(fonts.light_family());
        Self { light }
    }

    /// Builds a `genpdf` style drawing `face` at `size` points.
    pub fn style(&self, face: FontFace, size: f64) -> Style {
        let mut style = Style::new();
        style.set_font_size(font_size(size));
        match face {
            FontFace::Regular => {}
            FontFace::Bold => style.set_bold(),
            FontFace::Italic => style.set_italic(),
            FontFace::BoldItalic => {
                style.set_bold();
                style.set_italic();
            }
            FontFace::Light => style.set_font_family(self.light),
        }
        style
    }
}

/// `genpdf` only supports integral font sizes.
pub(crate) fn font_size(size: f64) -> u8 {
    size.round().clamp(1.0, f64::from(u8::MAX)) as u8
}
