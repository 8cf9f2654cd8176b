//! Retriever service
//!
//! Embeds a query and returns the nearest passages of a loaded index.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{RetrievalHit, RetrievalResult};
use crate::domain::ports::EmbeddingProvider;

use super::index_service::LoadedIndex;

/// Top-k passage retrieval over a loaded index
///
/// The embedding provider must be the one the index was built with; the
/// index service guarantees this through the snapshot fingerprint.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }

    /// Search for the `k` passages nearest to `query`
    ///
    /// # Arguments
    /// * `index` - Loaded snapshot and vector index
    /// * `query` - Free-text query, embedded exactly once
    /// * `k` - Maximum number of hits; must be at least 1
    ///
    /// # Returns
    /// Hits ascending by squared L2 distance, ties by ascending passage id.
    /// An index smaller than `k` returns every passage.
    #[instrument(skip(self, index, query), fields(query_len = query.len(), k))]
    pub async fn search(
        &self,
        index: &LoadedIndex,
        query: &str,
        k: usize,
    ) -> DomainResult<RetrievalResult> {
        if k == 0 {
            return Err(DomainError::InvalidArgument(
                "k must be at least 1".to_string(),
            ));
        }

        let vector = self.embedder.embed_one(query).await?;
        let neighbours = index.index.search(&vector, k)?;

        let hits = neighbours
            .into_iter()
            .map(|(id, distance)| {
                let passage = index.passage(id).cloned().ok_or_else(|| {
                    DomainError::IndexCorrupt {
                        path: PathBuf::new(),
                        reason: format!("index row {id} has no passage"),
                    }
                })?;
                Ok(RetrievalHit { passage, distance })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        debug!(hits = hits.len(), "Retrieved passages");
        Ok(RetrievalResult { hits })
    }
}
