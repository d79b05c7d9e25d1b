//! Error types for the hypothesis store.

use std::path::PathBuf;

use research_types::TypesError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer errors.
///
/// Absent records are not errors: lookups return `None` and deletes return
/// `false`. A file that exists but cannot be read back is always an error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A persisted file exists but is not valid JSON of the expected shape.
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A persisted file decoded but contradicts where it was found.
    #[error("corrupt record file {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// Filesystem failure other than a missing file.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether this error means a persisted file is unreadable and needs
    /// operator attention.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Corrupt { .. })
    }
}

impl From<TypesError> for StoreError {
    fn from(err: TypesError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
