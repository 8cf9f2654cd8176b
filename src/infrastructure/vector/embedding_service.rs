//! Local embedding provider
//!
//! Hashed bag-of-words embeddings computed in-process. Every lowercase
//! alphanumeric token is hashed into one of `dimension` buckets with a
//! hash-derived sign, and the resulting vector is normalized to unit length.
//! Texts that share vocabulary land close together under L2 distance, which
//! is enough for offline use and for tests that must not touch the network.

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::EmbeddingProvider;

/// Model identifier recorded in snapshot fingerprints
pub const LOCAL_MODEL_NAME: &str = "hashed-bow-v1";

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// In-process embedding provider
#[derive(Debug, Clone)]
pub struct LocalEmbeddingProvider {
    dimension: usize,
    max_batch_size: usize,
}

impl LocalEmbeddingProvider {
    /// Create a provider producing vectors of `dimension` components
    pub fn new(dimension: usize) -> DomainResult<Self> {
        if dimension == 0 {
            return Err(DomainError::InvalidArgument(
                "embedding dimension must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            max_batch_size: 2048,
        })
    }

    #[must_use]
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    /// Compute the embedding for one text
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];

        for token in tokens(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        let magnitude = embedding
            .iter()
            .map(|x| f64::from(*x) * f64::from(*x))
            .sum::<f64>()
            .sqrt() as f32;

        if magnitude > 1e-10 {
            for val in &mut embedding {
                *val /= magnitude;
            }
        } else {
            // No tokens, or every bucket cancelled out
            let uniform = 1.0 / (self.dimension as f32).sqrt();
            embedding.fill(uniform);
        }

        embedding
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn model(&self) -> &str {
        LOCAL_MODEL_NAME
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_one(&self, text: &str) -> DomainResult<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    async fn embed_many(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::vector::flat_index::squared_l2;

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(LocalEmbeddingProvider::new(0).is_err());
    }

    #[tokio::test]
    async fn test_embed_one_matches_dimension() {
        let provider = LocalEmbeddingProvider::new(64).unwrap();
        let embedding = provider.embed_one("Chiron in Aries").await.unwrap();
        assert_eq!(embedding.len(), 64);
    }

    #[tokio::test]
    async fn test_embed_many_preserves_order() {
        let provider = LocalEmbeddingProvider::new(32).unwrap();
        let texts = vec!["Aries".to_string(), "Taurus".to_string(), "Gemini".to_string()];
        let embeddings = provider.embed_many(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 3);
        for (text, embedding) in texts.iter().zip(&embeddings) {
            assert_eq!(embedding, &provider.embed_text(text));
        }
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let provider = LocalEmbeddingProvider::new(128).unwrap();
        assert_eq!(
            provider.embed_text("Aries energy is bold."),
            provider.embed_text("aries ENERGY, is bold")
        );
    }

    #[test]
    fn test_shared_vocabulary_is_closer() {
        let provider = LocalEmbeddingProvider::new(256).unwrap();
        let query = provider.embed_text("Aries boldness");
        let aries = provider.embed_text("Aries energy is bold. Aries boldness leads.");
        let taurus = provider.embed_text("Taurus energy is steady and patient.");
        assert!(squared_l2(&query, &aries) < squared_l2(&query, &taurus));
    }

    #[test]
    fn test_empty_text_is_uniform_unit_vector() {
        let provider = LocalEmbeddingProvider::new(16).unwrap();
        let embedding = provider.embed_text("   ");
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-5);
        assert!(embedding.windows(2).all(|w| (w[0] - w[1]).abs() < f32::EPSILON));
    }

    #[test]
    fn test_provider_identity() {
        let provider = LocalEmbeddingProvider::new(8).unwrap().with_max_batch_size(0);
        assert_eq!(provider.name(), "local");
        assert_eq!(provider.model(), LOCAL_MODEL_NAME);
        assert_eq!(provider.dimension(), 8);
        assert_eq!(provider.max_batch_size(), 1);
    }
}
