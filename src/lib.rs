//! Local forensic filters for uploaded images: error-level analysis, a
//! Laplacian noise residual, and a focus-inconsistency heatmap, plus the
//! orchestration that runs them side by side and persists the results.

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::{DynamicImage, GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::{
    analysis::{
        ela::{DEFAULT_ELA_AMPLIFICATION, DEFAULT_ELA_QUALITY, ElaAnalyzer},
        focus::{FocusAnalyzer, FocusHeatmap},
        noise::NoiseAnalyzer,
    },
    error::{ForensicsError, Result},
    report::visualization::ColorScheme,
    storage::{ArtifactFormat, ArtifactKind, ArtifactNaming, ArtifactStore},
};

pub mod analysis;
pub mod error;
pub mod image_utils;
pub mod report;
pub mod source;
pub mod storage;

pub use source::SourceImage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForensicConfig {
    pub ela_quality: u8,
    pub ela_amplification: f64,
    pub parallel: bool,
    pub artifact_format: ArtifactFormat,
    pub color_scheme: ColorScheme,
}

impl Default for ForensicConfig {
    fn default() -> Self {
        Self {
            ela_quality: DEFAULT_ELA_QUALITY,
            ela_amplification: DEFAULT_ELA_AMPLIFICATION,
            parallel: true,
            artifact_format: ArtifactFormat::default(),
            color_scheme: ColorScheme::default(),
        }
    }
}

impl ForensicConfig {
    /// Reads a JSON config; missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_ela_quality(mut self, quality: u8) -> Self {
        self.ela_quality = quality;
        self
    }

    pub fn with_ela_amplification(mut self, amplification: f64) -> Self {
        self.ela_amplification = amplification;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_artifact_format(mut self, format: ArtifactFormat) -> Self {
        self.artifact_format = format;
        self
    }

    pub fn with_color_scheme(mut self, scheme: ColorScheme) -> Self {
        self.color_scheme = scheme;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.ela_analyzer()?;

        if let ArtifactFormat::Jpeg { quality } = self.artifact_format {
            if !(1..=100).contains(&quality) {
                return Err(ForensicsError::InvalidParameter(format!(
                    "artifact JPEG quality must be within 1..=100, got {quality}"
                )));
            }
        }

        Ok(())
    }

    fn ela_analyzer(&self) -> Result<ElaAnalyzer> {
        ElaAnalyzer::new(self.ela_quality)?.with_amplification(self.ela_amplification)
    }
}

/// Where one artifact ended up, or why it didn't.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactRef {
    Stored(PathBuf),
    Failed(String),
}

impl ArtifactRef {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Stored(path) => Some(path),
            Self::Failed(_) => None,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForensicResult {
    pub original: ArtifactRef,
    pub ela: ArtifactRef,
    pub noise: ArtifactRef,
    pub heatmap: ArtifactRef,
}

impl ForensicResult {
    pub fn get(&self, kind: ArtifactKind) -> &ArtifactRef {
        match kind {
            ArtifactKind::Original => &self.original,
            ArtifactKind::Ela => &self.ela,
            ArtifactKind::Noise => &self.noise,
            ArtifactKind::Heatmap => &self.heatmap,
        }
    }

    pub fn failures(&self) -> Vec<(ArtifactKind, &str)> {
        ArtifactKind::ALL
            .iter()
            .filter_map(|&kind| match self.get(kind) {
                ArtifactRef::Failed(reason) => Some((kind, reason.as_str())),
                ArtifactRef::Stored(_) => None,
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        ArtifactKind::ALL.iter().all(|&kind| self.get(kind).is_stored())
    }
}

/// In-memory output of one suite run.
#[derive(Debug)]
pub struct SuiteArtifacts {
    pub ela: Result<RgbImage>,
    pub noise: GrayImage,
    pub heatmap: FocusHeatmap,
}

pub struct ForensicSuite {
    config: ForensicConfig,
    ela: ElaAnalyzer,
    noise: NoiseAnalyzer,
    focus: FocusAnalyzer,
}

impl ForensicSuite {
    pub fn new(config: ForensicConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ela: config.ela_analyzer()?,
            noise: NoiseAnalyzer::new(),
            focus: FocusAnalyzer::new().with_color_scheme(config.color_scheme),
            config,
        })
    }

    pub fn config(&self) -> &ForensicConfig {
        &self.config
    }

    /// Runs the three filters without touching storage.
    pub fn analyze(&self, source: &SourceImage) -> SuiteArtifacts {
        let raster = source.raster();

        let (ela, (noise, heatmap)) = self.fork(
            || self.ela.analyze(raster),
            || self.fork(|| self.noise.analyze(raster), || self.focus.analyze(raster)),
        );

        if let Err(e) = &ela {
            log::warn!("ELA failed: {e}");
        }

        SuiteArtifacts {
            ela,
            noise,
            heatmap,
        }
    }

    pub fn run<S>(&self, source: &SourceImage, naming: &ArtifactNaming, store: &S) -> ForensicResult
    where
        S: ArtifactStore + ?Sized,
    {
        self.run_with_artifacts(source, naming, store).0
    }

    /// Analyzes and persists every artifact. A failure in one slot is
    /// recorded in that slot and never stops the others.
    pub fn run_with_artifacts<S>(
        &self,
        source: &SourceImage,
        naming: &ArtifactNaming,
        store: &S,
    ) -> (ForensicResult, SuiteArtifacts)
    where
        S: ArtifactStore + ?Sized,
    {
        let artifacts = self.analyze(source);

        let persist = |kind: ArtifactKind, image: DynamicImage| -> ArtifactRef {
            let path = naming.path(kind);
            match store.store(&image, &path, self.config.artifact_format) {
                Ok(()) => ArtifactRef::Stored(path),
                Err(e) => ArtifactRef::Failed(e.to_string()),
            }
        };

        let ((original, ela), (noise, heatmap)) = self.fork(
            || {
                self.fork(
                    || match source.location() {
                        Some(location) => ArtifactRef::Stored(location.to_path_buf()),
                        None => persist(
                            ArtifactKind::Original,
                            DynamicImage::ImageRgb8(source.raster().clone()),
                        ),
                    },
                    || match &artifacts.ela {
                        Ok(ela) => persist(ArtifactKind::Ela, DynamicImage::ImageRgb8(ela.clone())),
                        Err(e) => ArtifactRef::Failed(e.to_string()),
                    },
                )
            },
            || {
                self.fork(
                    || {
                        persist(
                            ArtifactKind::Noise,
                            DynamicImage::ImageLuma8(artifacts.noise.clone()),
                        )
                    },
                    || {
                        persist(
                            ArtifactKind::Heatmap,
                            DynamicImage::ImageRgb8(artifacts.heatmap.image.clone()),
                        )
                    },
                )
            },
        );

        let result = ForensicResult {
            original,
            ela,
            noise,
            heatmap,
        };

        for (kind, reason) in result.failures() {
            log::warn!("{} artifact unavailable: {reason}", kind.as_str());
        }
        log::info!(
            "forensic suite finished for {}x{} source, {}/4 artifacts stored",
            source.dimensions().0,
            source.dimensions().1,
            4 - result.failures().len()
        );

        (result, artifacts)
    }

    fn fork<A, B, RA, RB>(&self, a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        if self.config.parallel {
            rayon::join(a, b)
        } else {
            (a(), b())
        }
    }
}

/// Loads `path` through `store` and runs the default suite, writing the
/// artifacts beside it in `output_dir`.
pub fn run_forensic_suite<S>(path: &Path, output_dir: &Path, store: &S) -> Result<ForensicResult>
where
    S: ArtifactStore + ?Sized,
{
    let suite = ForensicSuite::new(ForensicConfig::default())?;
    let source = store.load(path)?;
    let naming = ArtifactNaming::for_source(output_dir, &source, suite.config().artifact_format);

    Ok(suite.run(&source, &naming, store))
}
