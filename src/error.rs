//! Error types for glyph-trainer.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for training, data and checkpoint operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A batch source or dataset broke its contract (inconsistent batch
    /// shapes, empty source, undersized dataset, malformed sample).
    #[error("data contract violation: {0}")]
    DataContract(String),

    /// Tensor or parameter dimensions do not line up.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// A checkpoint file exists but cannot be turned back into run state.
    #[error("invalid checkpoint {}: {reason}", path.display())]
    Checkpoint { path: PathBuf, reason: String },

    #[error("unsupported checkpoint format version {found} (expected {expected})")]
    CheckpointVersion { found: u32, expected: u32 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    pub fn data_contract(msg: impl Into<String>) -> Self {
        Self::DataContract(msg.into())
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
