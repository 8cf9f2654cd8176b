//! Embedding provider port for semantic vector generation.
//!
//! Defines the trait for embedding providers that convert text into
//! dense vector representations for nearest-neighbour search. The same
//! provider configuration must be used to build an index and to query it;
//! the snapshot fingerprint records `name()`, `model()` and `dimension()` so
//! a mismatch forces a rebuild.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Trait for embedding providers (remote API or in-process model).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name (e.g., "openai", "local").
    fn name(&self) -> &'static str;

    /// Model identifier used by this provider.
    fn model(&self) -> &str;

    /// Embedding dimension for this provider/model.
    fn dimension(&self) -> usize;

    /// Generate an embedding for a single text (query path).
    async fn embed_one(&self, text: &str) -> DomainResult<Vec<f32>>;

    /// Generate embeddings for many texts (passage path).
    ///
    /// Output order matches input order and output length equals input
    /// length. Implementations split by `max_batch_size` themselves.
    async fn embed_many(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>>;

    /// Maximum number of texts per single call.
    fn max_batch_size(&self) -> usize;
}
