//! Domain errors for the healmap pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Domain-level errors that can occur anywhere in the retrieval and
/// generation pipeline.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Snapshot not found at {0}")]
    SnapshotMissing(PathBuf),

    #[error("Snapshot at {path} is corrupt: {reason}")]
    SnapshotCorrupt { path: PathBuf, reason: String },

    #[error("Vector index at {path} is corrupt: {reason}")]
    IndexCorrupt { path: PathBuf, reason: String },

    #[error("Embedding provider unavailable: {0}")]
    EmbeddingProviderUnavailable(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("No structured value found in model output")]
    NoStructuredValueFound,

    #[error("Malformed structured value: {0}")]
    MalformedStructuredValue(String),

    #[error("Template placeholder has no value: {{{0}}}")]
    MissingPlaceholder(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl DomainError {
    /// True for the failures that mean "the generative step produced no
    /// usable result", as opposed to system-level errors.
    pub fn is_no_structured_result(&self) -> bool {
        matches!(
            self,
            Self::GenerationFailed(_)
                | Self::NoStructuredValueFound
                | Self::MalformedStructuredValue(_)
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedStructuredValue(err.to_string())
    }
}
