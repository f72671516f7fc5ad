use storycard_common::{RangeAddress, RangeError};
use thiserror::Error;

/// Host-level failures. The card engine treats every one of these as fatal.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "json")]
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("sheet already exists: {0}")]
    SheetExists(String),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("{range} lies outside the sheet ({max_rows} rows x {max_cols} columns)")]
    OutOfBounds {
        range: RangeAddress,
        max_rows: u32,
        max_cols: u32,
    },

    #[error("copy source {source_range} and destination {dest} differ in shape")]
    ShapeMismatch {
        source_range: RangeAddress,
        dest: RangeAddress,
    },

    #[error("{backend}: {message}")]
    Backend { backend: String, message: String },

    #[error("unsupported {feature} ({context})")]
    Unsupported { feature: String, context: String },
}

impl IoError {
    pub fn from_backend(backend: &str, err: impl std::fmt::Display) -> Self {
        IoError::Backend {
            backend: backend.to_string(),
            message: err.to_string(),
        }
    }
}
