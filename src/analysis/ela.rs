use std::io::Cursor;

use image::{Rgb, RgbImage, codecs::jpeg::JpegEncoder};

use crate::error::{ForensicsError, Result};

pub const DEFAULT_ELA_QUALITY: u8 = 90;
pub const DEFAULT_ELA_AMPLIFICATION: f64 = 30.0;

/// Error-level analysis: difference between a raster and its own JPEG
/// recompression, brightened so that low error levels become visible.
///
/// The defaults (quality 90, x30) are the values downstream scoring is
/// calibrated against.
#[derive(Debug, Clone)]
pub struct ElaAnalyzer {
    quality: u8,
    amplification: f64,
}

impl ElaAnalyzer {
    pub fn new(quality: u8) -> Result<Self> {
        if !(1..=100).contains(&quality) {
            return Err(ForensicsError::InvalidParameter(format!(
                "ELA quality must be within 1..=100, got {quality}"
            )));
        }

        Ok(Self {
            quality,
            amplification: DEFAULT_ELA_AMPLIFICATION,
        })
    }

    pub fn with_amplification(mut self, amp: f64) -> Result<Self> {
        if !amp.is_finite() || amp < 0.0 {
            return Err(ForensicsError::InvalidParameter(format!(
                "ELA amplification must be a finite non-negative number, got {amp}"
            )));
        }
        self.amplification = amp;
        Ok(self)
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn amplification(&self) -> f64 {
        self.amplification
    }

    pub fn analyze(&self, image: &RgbImage) -> Result<RgbImage> {
        let (width, height) = image.dimensions();
        let recompressed = self.recompress_jpeg(image)?;

        if recompressed.dimensions() != (width, height) {
            return Err(ForensicsError::Encode(image::ImageError::Parameter(
                image::error::ParameterError::from_kind(
                    image::error::ParameterErrorKind::DimensionMismatch,
                ),
            )));
        }

        let mut ela_image = RgbImage::new(width, height);

        for (x, y, orig) in image.enumerate_pixels() {
            let recomp = recompressed.get_pixel(x, y);
            let mut channels = [0u8; 3];

            for (c, out) in channels.iter_mut().enumerate() {
                *out = amplify(orig[c].abs_diff(recomp[c]), self.amplification);
            }

            ela_image.put_pixel(x, y, Rgb(channels));
        }

        Ok(ela_image)
    }

    /// JPEG round-trip through an in-memory buffer.
    fn recompress_jpeg(&self, image: &RgbImage) -> Result<RgbImage> {
        let mut buffer = Cursor::new(Vec::new());

        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
        image
            .write_with_encoder(encoder)
            .map_err(ForensicsError::Encode)?;

        let recompressed =
            image::load_from_memory(buffer.get_ref()).map_err(ForensicsError::Encode)?;

        Ok(recompressed.to_rgb8())
    }
}

/// Brightens a difference level, truncating toward zero and saturating at 255.
fn amplify(diff: u8, amplification: f64) -> u8 {
    (diff as f64 * amplification).min(255.0) as u8
}

impl Default for ElaAnalyzer {
    fn default() -> Self {
        Self {
            quality: DEFAULT_ELA_QUALITY,
            amplification: DEFAULT_ELA_AMPLIFICATION,
        }
    }
}
