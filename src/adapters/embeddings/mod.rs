//! Embedding provider adapters and factory.

pub mod openai;

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{EmbeddingBackend, EmbeddingConfig};
use crate::domain::ports::EmbeddingProvider;
use crate::infrastructure::vector::LocalEmbeddingProvider;

pub use openai::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};

/// Create the embedding provider selected by configuration.
pub fn create_embedding_provider(
    config: &EmbeddingConfig,
) -> DomainResult<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.backend {
        EmbeddingBackend::OpenAi => Arc::new(OpenAiEmbeddingProvider::new(
            OpenAiEmbeddingConfig::from(config),
        )?),
        EmbeddingBackend::Local => Arc::new(
            LocalEmbeddingProvider::new(config.dimension)?
                .with_max_batch_size(config.max_batch_size),
        ),
    };
    Ok(provider)
}
