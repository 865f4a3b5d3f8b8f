use image::{GrayImage, RgbImage};

use crate::image_utils::{array_to_gray, laplacian_magnitude, rgb_to_gray};

/// High-pass noise residual: the absolute Laplacian of the luminance,
/// saturated into 8 bits.
///
/// Camera sensor noise produces a fine, even residual; pasted or synthetic
/// regions tend to show up as patches that are smoother or harsher than
/// their surroundings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoiseAnalyzer;

impl NoiseAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, image: &RgbImage) -> GrayImage {
        let gray = rgb_to_gray(image);
        array_to_gray(&laplacian_magnitude(&gray))
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn test_output_dimensions_match_input() {
        let image = RgbImage::from_pixel(13, 7, Rgb([5, 6, 7]));
        assert_eq!(NoiseAnalyzer::new().analyze(&image).dimensions(), (13, 7));
    }

    #[test]
    fn test_flat_image_has_no_residual() {
        let image = RgbImage::from_pixel(20, 20, Rgb([120, 30, 200]));
        assert!(NoiseAnalyzer::new().analyze(&image).pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_step_edge_is_highlighted() {
        let image = RgbImage::from_fn(20, 10, |x, _| {
            if x < 10 { Rgb([20, 20, 20]) } else { Rgb([60, 60, 60]) }
        });
        let noise = NoiseAnalyzer::new().analyze(&image);

        assert_eq!(noise.get_pixel(9, 5)[0], 40);
        assert_eq!(noise.get_pixel(10, 5)[0], 40);
        assert_eq!(noise.get_pixel(3, 5)[0], 0);
        assert_eq!(noise.get_pixel(16, 5)[0], 0);
    }

    #[test]
    fn test_large_response_saturates() {
        let image = RgbImage::from_fn(9, 9, |x, y| {
            if (x + y) % 2 == 0 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
        });
        let noise = NoiseAnalyzer::new().analyze(&image);
        assert_eq!(noise.get_pixel(4, 4)[0], 255);
    }
}
