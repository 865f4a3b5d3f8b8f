use std::{
    collections::HashMap,
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{DynamicImage, ImageError, ImageFormat, codecs::jpeg::JpegEncoder};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ForensicsError, Result},
    source::SourceImage,
};

/// Encoding used when an artifact is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ArtifactFormat {
    Jpeg { quality: u8 },
    Png,
}

impl Default for ArtifactFormat {
    fn default() -> Self {
        Self::Jpeg { quality: 95 }
    }
}

impl ArtifactFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }

    pub fn encode(&self, image: &DynamicImage) -> std::result::Result<Vec<u8>, ImageError> {
        let mut buffer = Cursor::new(Vec::new());

        match *self {
            Self::Jpeg { quality } => {
                let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
                image.write_with_encoder(encoder)?;
            }
            Self::Png => image.write_to(&mut buffer, ImageFormat::Png)?,
        }

        Ok(buffer.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Original,
    Ela,
    Noise,
    Heatmap,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [Self::Original, Self::Ela, Self::Noise, Self::Heatmap];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Ela => "ela",
            Self::Noise => "noise",
            Self::Heatmap => "heatmap",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Self::Original => "",
            Self::Ela => "_ela",
            Self::Noise => "_noise",
            Self::Heatmap => "_heatmap",
        }
    }
}

/// Output locations for one suite run: `<dir>/<stem><suffix>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNaming {
    dir: PathBuf,
    stem: String,
    extension: &'static str,
}

impl ArtifactNaming {
    pub const DEFAULT_STEM: &'static str = "upload";

    pub fn new<P: Into<PathBuf>, S: Into<String>>(dir: P, stem: S, format: ArtifactFormat) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
            extension: format.extension(),
        }
    }

    /// Uses the source's file stem, or [`Self::DEFAULT_STEM`] for in-memory uploads.
    pub fn for_source<P: Into<PathBuf>>(
        dir: P,
        source: &SourceImage,
        format: ArtifactFormat,
    ) -> Self {
        let stem = source
            .location()
            .and_then(Path::file_stem)
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_STEM.to_string());

        Self::new(dir, stem, format)
    }

    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.dir
            .join(format!("{}{}.{}", self.stem, kind.suffix(), self.extension))
    }
}

/// Where decoded sources come from and where derived rasters go.
pub trait ArtifactStore: Send + Sync {
    fn load(&self, path: &Path) -> Result<SourceImage>;

    fn store(&self, image: &DynamicImage, path: &Path, format: ArtifactFormat) -> Result<()>;
}

/// Plain files on disk. Parent directories are created on demand.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl ArtifactStore for FsStore {
    fn load(&self, path: &Path) -> Result<SourceImage> {
        SourceImage::open(path)
    }

    fn store(&self, image: &DynamicImage, path: &Path, format: ArtifactFormat) -> Result<()> {
        let persistence = |source: ImageError| ForensicsError::Persistence {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| persistence(ImageError::IoError(e)))?;
        }

        let bytes = format.encode(image).map_err(persistence)?;
        fs::write(path, bytes).map_err(|e| persistence(ImageError::IoError(e)))?;

        log::debug!("wrote {}", path.display());
        Ok(())
    }
}

/// Encoded artifacts kept in memory, keyed by their would-be path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<P: Into<PathBuf>>(&self, path: P, bytes: Vec<u8>) {
        self.entries.lock().insert(path.into(), bytes);
    }

    pub fn bytes(&self, path: &Path) -> Option<Vec<u8>> {
        self.entries.lock().get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.lock().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl ArtifactStore for MemoryStore {
    fn load(&self, path: &Path) -> Result<SourceImage> {
        let bytes = self
            .bytes(path)
            .ok_or_else(|| ForensicsError::ArtifactMissing(path.to_path_buf()))?;

        Ok(SourceImage::from_bytes(&bytes)?.with_location(path))
    }

    fn store(&self, image: &DynamicImage, path: &Path, format: ArtifactFormat) -> Result<()> {
        let bytes = format
            .encode(image)
            .map_err(|source| ForensicsError::Persistence {
                path: path.to_path_buf(),
                source,
            })?;

        self.insert(path, bytes);
        Ok(())
    }
}
