use image::{GrayImage, Luma, RgbImage};
use ndarray::Array2;

use crate::{
    image_utils::{laplacian_magnitude, rgb_to_gray},
    report::visualization::{ColorScheme, Visualizer},
};

/// Focus-inconsistency heatmap along with the intermediate it was colored from.
#[derive(Debug, Clone)]
pub struct FocusHeatmap {
    pub image: RgbImage,
    /// Laplacian magnitude scaled so the peak maps to 255.
    pub scaled_magnitude: GrayImage,
    pub peak_magnitude: f64,
}

impl FocusHeatmap {
    /// A flat source has no Laplacian response at all; its heatmap is the
    /// low end of the color scheme everywhere.
    pub fn is_degenerate(&self) -> bool {
        self.peak_magnitude == 0.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct FocusAnalyzer {
    color_scheme: ColorScheme,
}

impl FocusAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color_scheme(mut self, scheme: ColorScheme) -> Self {
        self.color_scheme = scheme;
        self
    }

    pub fn analyze(&self, image: &RgbImage) -> FocusHeatmap {
        let gray = rgb_to_gray(image);
        let magnitude = laplacian_magnitude(&gray);
        let (scaled_magnitude, peak_magnitude) = normalize_to_peak(&magnitude);

        let image = Visualizer::new(self.color_scheme).colorize(&scaled_magnitude);

        FocusHeatmap {
            image,
            scaled_magnitude,
            peak_magnitude,
        }
    }
}

/// `(v / max) * 255`, truncated. A zero peak yields an all-zero raster
/// instead of dividing by zero.
fn normalize_to_peak(magnitude: &Array2<f64>) -> (GrayImage, f64) {
    let (height, width) = magnitude.dim();
    let peak = magnitude
        .iter()
        .cloned()
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max);

    let mut scaled = GrayImage::new(width as u32, height as u32);

    if peak <= 0.0 {
        log::debug!("flat luminance, focus heatmap is uniformly zero");
        return (scaled, 0.0);
    }

    for ((y, x), &value) in magnitude.indexed_iter() {
        let level = (value / peak * 255.0).clamp(0.0, 255.0) as u8;
        scaled.put_pixel(x as u32, y as u32, Luma([level]));
    }

    (scaled, peak)
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn test_uniform_input_is_degenerate_not_nan() {
        let image = RgbImage::from_pixel(31, 17, Rgb([90, 90, 90]));
        let heatmap = FocusAnalyzer::new().analyze(&image);

        assert!(heatmap.is_degenerate());
        assert_eq!(heatmap.image.dimensions(), (31, 17));
        assert!(heatmap.scaled_magnitude.pixels().all(|p| p[0] == 0));
        assert!(heatmap.image.pixels().all(|p| p.0 == [0, 0, 128]));
    }

    #[test]
    fn test_peak_maps_to_top_of_range() {
        let image = RgbImage::from_fn(16, 16, |x, y| {
            if x == 8 && y == 8 { Rgb([200, 200, 200]) } else { Rgb([40, 40, 40]) }
        });
        let heatmap = FocusAnalyzer::new().analyze(&image);

        assert_eq!(heatmap.peak_magnitude, 640.0);
        assert_eq!(heatmap.scaled_magnitude.get_pixel(8, 8)[0], 255);
        // Each 4-neighbour sees a quarter of the centre response.
        assert_eq!(heatmap.scaled_magnitude.get_pixel(8, 7)[0], 63);
        assert_eq!(heatmap.image.get_pixel(8, 8).0, [128, 0, 0]);
        assert_eq!(heatmap.image.get_pixel(0, 0).0, [0, 0, 128]);
    }

    #[test]
    fn test_normalize_truncates() {
        let magnitude = Array2::from_shape_vec((1, 3), vec![0.0, 1.5, 3.0]).unwrap();
        let (scaled, peak) = normalize_to_peak(&magnitude);

        assert_eq!(peak, 3.0);
        assert_eq!(scaled.get_pixel(1, 0)[0], 127);
        assert_eq!(scaled.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn test_grayscale_scheme_passes_magnitude_through() {
        let image = RgbImage::from_fn(12, 12, |x, _| Rgb([(x * 20) as u8, 0, 0]));
        let heatmap = FocusAnalyzer::new()
            .with_color_scheme(ColorScheme::Grayscale)
            .analyze(&image);

        for (x, y, pixel) in heatmap.image.enumerate_pixels() {
            let v = heatmap.scaled_magnitude.get_pixel(x, y)[0];
            assert_eq!(pixel.0, [v, v, v]);
        }
    }
}
