//! Index snapshot models.
//!
//! A snapshot is the persisted unit of one index build: every passage, its
//! embedding vector, and a fingerprint identifying which document and which
//! embedding backend produced them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::passage::Passage;

/// Current on-disk snapshot format version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Identity of the inputs an index was built from.
///
/// Two fingerprints compare equal only when the document text, the
/// embedding backend and model, the vector dimensionality and the chunk
/// size all match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFingerprint {
    /// Hex-encoded SHA-256 of the source document text
    pub document_sha256: String,

    /// Embedding backend name (e.g. "openai", "local")
    pub embedding_backend: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Vector dimensionality
    pub dimension: usize,

    /// Chunk window size in tokens
    pub chunk_max_len: usize,
}

impl SnapshotFingerprint {
    pub fn new(
        document: &str,
        embedding_backend: impl Into<String>,
        embedding_model: impl Into<String>,
        dimension: usize,
        chunk_max_len: usize,
    ) -> Self {
        Self {
            document_sha256: document_digest(document),
            embedding_backend: embedding_backend.into(),
            embedding_model: embedding_model.into(),
            dimension,
            chunk_max_len,
        }
    }

    /// Short form for log lines
    pub fn short(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            &self.document_sha256[..self.document_sha256.len().min(12)],
            self.embedding_backend,
            self.embedding_model,
            self.dimension
        )
    }
}

/// Hex-encoded SHA-256 of a document's text.
pub fn document_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Embedding vectors and passages of one build, stored as parallel arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSnapshot {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub fingerprint: SnapshotFingerprint,
    pub passages: Vec<Passage>,
    pub vectors: Vec<Vec<f32>>,
}

impl EmbeddingSnapshot {
    pub fn new(
        fingerprint: SnapshotFingerprint,
        passages: Vec<Passage>,
        vectors: Vec<Vec<f32>>,
    ) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            created_at: Utc::now(),
            fingerprint,
            passages,
            vectors,
        }
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}
