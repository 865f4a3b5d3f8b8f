use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForensicsError {
    #[error("Image decoding error: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Recompression proxy encoding error: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Failed to persist artifact {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Unsupported channel layout: {0}")]
    UnsupportedChannelLayout(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("No artifact stored at {}", .0.display())]
    ArtifactMissing(PathBuf),
}

pub type Result<T> = std::result::Result<T, ForensicsError>;
