pub mod visualization;

use image::{GrayImage, RgbImage};
use serde::Serialize;

use crate::{ArtifactRef, ForensicResult, SuiteArtifacts};

/// One entry of the link report: a servable reference or the reason the
/// artifact is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LinkEntry {
    Link(String),
    Failure { error: String },
}

/// `{"original", "ela", "noise", "heatmap"}`, the shape the upload endpoint
/// hands back to the browser.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub original: LinkEntry,
    pub ela: LinkEntry,
    pub noise: LinkEntry,
    pub heatmap: LinkEntry,
}

impl JsonReport {
    /// `prefix` is prepended to every stored path, e.g. `"/"` for paths
    /// served relative to the web root.
    pub fn new(result: &ForensicResult, prefix: &str) -> Self {
        let entry = |artifact: &ArtifactRef| match artifact {
            ArtifactRef::Stored(path) => {
                let path = path.to_string_lossy().replace('\\', "/");
                let path = if prefix.ends_with('/') {
                    path.trim_start_matches('/').to_string()
                } else {
                    path
                };
                LinkEntry::Link(format!("{prefix}{path}"))
            }
            ArtifactRef::Failed(reason) => LinkEntry::Failure {
                error: reason.clone(),
            },
        };

        Self {
            original: entry(&result.original),
            ela: entry(&result.ela),
            noise: entry(&result.noise),
            heatmap: entry(&result.heatmap),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Summary statistics of the in-memory artifacts, handed to downstream
/// scoring as supporting evidence.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub ela_analysis: Option<ElaReportSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ela_error: Option<String>,
    pub noise_analysis: NoiseReportSection,
    pub heatmap_analysis: HeatmapReportSection,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElaReportSection {
    pub max_level: u8,
    pub mean_level: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoiseReportSection {
    pub max_residual: u8,
    pub mean_residual: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapReportSection {
    pub peak_magnitude: f64,
    pub mean_scaled_magnitude: f64,
    pub degenerate: bool,
}

impl From<&SuiteArtifacts> for SuiteReport {
    fn from(artifacts: &SuiteArtifacts) -> Self {
        let (ela_analysis, ela_error) = match &artifacts.ela {
            Ok(ela) => {
                let (max_level, mean_level) = rgb_stats(ela);
                (Some(ElaReportSection { max_level, mean_level }), None)
            }
            Err(e) => (None, Some(e.to_string())),
        };

        let (max_residual, mean_residual) = gray_stats(&artifacts.noise);
        let (_, mean_scaled_magnitude) = gray_stats(&artifacts.heatmap.scaled_magnitude);

        Self {
            ela_analysis,
            ela_error,
            noise_analysis: NoiseReportSection {
                max_residual,
                mean_residual,
            },
            heatmap_analysis: HeatmapReportSection {
                peak_magnitude: artifacts.heatmap.peak_magnitude,
                mean_scaled_magnitude,
                degenerate: artifacts.heatmap.is_degenerate(),
            },
        }
    }
}

impl SuiteReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn gray_stats(image: &GrayImage) -> (u8, f64) {
    samples_stats(image.as_raw())
}

fn rgb_stats(image: &RgbImage) -> (u8, f64) {
    samples_stats(image.as_raw())
}

fn samples_stats(samples: &[u8]) -> (u8, f64) {
    if samples.is_empty() {
        return (0, 0.0);
    }
    let max = samples.iter().copied().max().unwrap_or(0);
    let mean = samples.iter().map(|&v| v as f64).sum::<f64>() / samples.len() as f64;
    (max, mean)
}

#[cfg(test)]
mod tests {
    use image::{Luma, Rgb};

    use super::*;
    use crate::{analysis::focus::FocusAnalyzer, error::ForensicsError};

    fn result() -> ForensicResult {
        ForensicResult {
            original: ArtifactRef::Stored("uploads/post.jpg".into()),
            ela: ArtifactRef::Stored("uploads/post_ela.jpg".into()),
            noise: ArtifactRef::Failed("permission denied".into()),
            heatmap: ArtifactRef::Stored("/abs/post_heatmap.jpg".into()),
        }
    }

    #[test]
    fn test_link_report_shape() {
        let report = JsonReport::new(&result(), "/");
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["original"], "/uploads/post.jpg");
        assert_eq!(value["ela"], "/uploads/post_ela.jpg");
        assert_eq!(value["noise"]["error"], "permission denied");
        assert_eq!(value["heatmap"], "/abs/post_heatmap.jpg");
    }

    #[test]
    fn test_link_report_without_prefix() {
        let report = JsonReport::new(&result(), "");
        assert_eq!(report.ela, LinkEntry::Link("uploads/post_ela.jpg".into()));
    }

    #[test]
    fn test_suite_report_stats() {
        let flat = RgbImage::from_pixel(4, 4, Rgb([50, 50, 50]));
        let artifacts = SuiteArtifacts {
            ela: Err(ForensicsError::InvalidParameter("boom".into())),
            noise: GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 10 } else { 30 }])),
            heatmap: FocusAnalyzer::new().analyze(&flat),
        };
        let report = SuiteReport::from(&artifacts);

        assert!(report.ela_analysis.is_none());
        assert!(report.ela_error.unwrap().contains("boom"));
        assert_eq!(report.noise_analysis.max_residual, 30);
        assert_eq!(report.noise_analysis.mean_residual, 20.0);
        assert!(report.heatmap_analysis.degenerate);
        assert_eq!(report.heatmap_analysis.mean_scaled_magnitude, 0.0);
    }
}
