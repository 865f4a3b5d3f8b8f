use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader, RgbImage};

use crate::error::{ForensicsError, Result};

/// Decoded 8-bit RGB raster the analyzers read from.
///
/// Any decodable layout (gray, gray+alpha, RGBA, 16-bit and float variants)
/// is normalized to three 8-bit channels on construction. Alpha is dropped,
/// not composited.
#[derive(Debug, Clone)]
pub struct SourceImage {
    raster: RgbImage,
    location: Option<PathBuf>,
}

impl SourceImage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let decoded = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(ForensicsError::Decode)?;

        let mut source = Self::from_dynamic(decoded)?;
        source.location = Some(path.to_path_buf());
        Ok(source)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes).map_err(ForensicsError::Decode)?;
        Self::from_dynamic(decoded)
    }

    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        let raster = match image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgba8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_)
            | DynamicImage::ImageRgb32F(_)
            | DynamicImage::ImageRgba32F(_) => {
                log::debug!("normalizing {:?} source to RGB8", image.color());
                image.to_rgb8()
            }
            other => {
                return Err(ForensicsError::UnsupportedChannelLayout(format!(
                    "{:?}",
                    other.color()
                )));
            }
        };

        if raster.width() == 0 || raster.height() == 0 {
            return Err(ForensicsError::InvalidParameter(
                "source image has no pixels".into(),
            ));
        }

        Ok(Self {
            raster,
            location: None,
        })
    }

    pub fn with_location<P: Into<PathBuf>>(mut self, location: P) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn raster(&self) -> &RgbImage {
        &self.raster
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }
}

impl From<RgbImage> for SourceImage {
    fn from(raster: RgbImage) -> Self {
        Self {
            raster,
            location: None,
        }
    }
}
