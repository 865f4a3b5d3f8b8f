//! The three forensic filters. Each is a pure raster-in, raster-out
//! transform over the same read-only source; none depends on another.

pub mod ela;
pub mod focus;
pub mod noise;

use image::{GrayImage, RgbImage};

use crate::error::Result;

use self::{ela::ElaAnalyzer, focus::FocusAnalyzer, noise::NoiseAnalyzer};

pub fn compute_ela(image: &RgbImage, quality: u8, amplification: f64) -> Result<RgbImage> {
    ElaAnalyzer::new(quality)?
        .with_amplification(amplification)?
        .analyze(image)
}

pub fn compute_noise_residual(image: &RgbImage) -> GrayImage {
    NoiseAnalyzer::new().analyze(image)
}

pub fn compute_focus_heatmap(image: &RgbImage) -> RgbImage {
    FocusAnalyzer::new().analyze(image).image
}
