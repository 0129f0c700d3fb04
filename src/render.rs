use std::{fs::File, io, path::Path};

use crate::{error::Error, PromptPay, DEFAULT_QR_IMAGE_SIZE};

/// Image format the QR code is written as
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageType {
    #[default]
    Png,
    Jpg,
    Gif,
    Bmp,
}

impl ImageType {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }
}

/// Turns a payload into a scannable image on disk
///
/// Implemented by whatever QR encoder the application uses, this crate
/// only hands over the payload text.
pub trait QrRenderer {
    /// Writes a `size` x `size` pixels image of `payload` to `path`, replacing any existing file
    fn render(&self, payload: &str, path: &Path, image_type: ImageType, size: u32)
        -> io::Result<File>;
}

impl<R: QrRenderer + ?Sized> QrRenderer for &R {
    fn render(
        &self,
        payload: &str,
        path: &Path,
        image_type: ImageType,
        size: u32,
    ) -> io::Result<File> {
        (**self).render(payload, path, image_type, size)
    }
}

impl PromptPay {
    /// Renders the payload with the default 250 pixels size
    pub fn generate_qr_code<R: QrRenderer>(
        &self,
        renderer: R,
        path: impl AsRef<Path>,
        image_type: ImageType,
    ) -> Result<File, Error> {
        self.generate_qr_code_with_size(renderer, path, image_type, DEFAULT_QR_IMAGE_SIZE)
    }

    /// Renders the payload as a `size` x `size` pixels image
    ///
    /// # Errors
    ///
    /// Renderer failures are returned as [`Error::ImageWrite`], the request
    /// and its payload stay valid.
    pub fn generate_qr_code_with_size<R: QrRenderer>(
        &self,
        renderer: R,
        path: impl AsRef<Path>,
        image_type: ImageType,
        size: u32,
    ) -> Result<File, Error> {
        let path = path.as_ref();
        let payload = self.generate();
        log::debug!("rendering {size}x{size} {image_type:?} to {}", path.display());
        renderer
            .render(&payload, path, image_type, size)
            .map_err(|e| {
                log::warn!("unable to write {}: {e}", path.display());
                Error::ImageWrite(e)
            })
    }
}
