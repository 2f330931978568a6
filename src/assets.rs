//! Fonts and images, loaded once before anything is rendered.

use std::collections::BTreeMap;
use std::path::Path;

use image::DynamicImage;
use log::debug;

use crate::config::FormConfig;
use crate::error::FormError;
use crate::fonts::FontSet;

/// Key under which the club logo is registered.
pub const LOGO_KEY: &str = "logo";

/// Decodes the image at `path`.
///
/// The alpha channel is dropped because `genpdf` only embeds opaque images.
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage, FormError> {
    let path = path.as_ref();
    let image = image::io::Reader::open(path)
        .map_err(|err| FormError::asset(path, err))?
        .with_guessed_format()
        .map_err(|err| FormError::asset(path, err))?
        .decode()
        .map_err(|err| FormError::asset(path, err))?;
    debug!(
        "Decoded image {} ({:?})",
        path.display(),
        image.color()
    );
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

/// Every external file the renderer needs besides the content store.
#[derive(Clone, Debug)]
pub struct Assets {
    fonts: FontSet,
    images: BTreeMap<String, DynamicImage>,
}

impl Assets {
    /// Loads the five font faces and the logo named by `config`.
    pub fn load(config: &FormConfig) -> Result<Self, FormError> {
        let fonts = FontSet::load(config.fonts_dir())?;
        let mut assets = Self::new(fonts);
        assets.insert_image(LOGO_KEY, load_image(config.logo_path())?);
        Ok(assets)
    }

    /// Wraps loaded fonts without any images.
    pub fn new(fonts: FontSet) -> Self {
        Self {
            fonts,
            images: BTreeMap::new(),
        }
    }

    /// Registers an image under `key`.
    pub fn insert_image(&mut self, key: impl Into<String>, image: DynamicImage) {
        self.images.insert(key.into(), image);
    }

    /// The loaded fonts.
    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    /// Registered images by key.
    pub fn images(&self) -> &BTreeMap<String, DynamicImage> {
        &self.images
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_is_asset_error() {
        let err = load_image("/__membership_form_missing__/logo.png").unwrap_err();
        assert!(err.is_asset_error());
    }

    #[test]
    fn images_lose_their_alpha_channel() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("logo.png");
        image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 128]))
            .save(&path)
            .expect("write png");

        let image = load_image(&path).expect("decode png");
        assert_eq!(image.color(), image::ColorType::Rgb8);
    }
}
