use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::map::map_colors;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Dark blue through cyan and yellow to dark red.
    #[default]
    Jet,
    Grayscale,
}

pub struct Visualizer {
    color_scheme: ColorScheme,
}

impl Visualizer {
    pub fn new(color_scheme: ColorScheme) -> Self {
        Self { color_scheme }
    }

    pub fn colorize(&self, gray: &GrayImage) -> RgbImage {
        let lut = self.lookup_table();
        map_colors(gray, |Luma([v])| lut[v as usize])
    }

    fn lookup_table(&self) -> [Rgb<u8>; 256] {
        let mut lut = [Rgb([0, 0, 0]); 256];
        for (level, entry) in lut.iter_mut().enumerate() {
            *entry = self.intensity_to_color(level as u8);
        }
        lut
    }

    fn intensity_to_color(&self, level: u8) -> Rgb<u8> {
        match self.color_scheme {
            ColorScheme::Jet => {
                let t = level as f64 / 255.0;
                Rgb([
                    Self::jet_channel(t, 3.0),
                    Self::jet_channel(t, 2.0),
                    Self::jet_channel(t, 1.0),
                ])
            }
            ColorScheme::Grayscale => Rgb([level, level, level]),
        }
    }

    /// Triangular ramp of height 1.5 centred at `center / 4`, clipped to [0, 1].
    fn jet_channel(t: f64, center: f64) -> u8 {
        let v = (1.5 - (4.0 * t - center).abs()).clamp(0.0, 1.0);
        (v * 255.0).round() as u8
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new(ColorScheme::default())
    }
}
