//! OpenAI embedding provider adapter.
//!
//! Calls the OpenAI `/v1/embeddings` endpoint. Compatible with any
//! OpenAI-compatible embedding API (e.g., Azure OpenAI, local servers).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::adapters::http_error::HttpApiError;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::EmbeddingConfig;
use crate::domain::ports::EmbeddingProvider;

const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Configuration for the OpenAI embedding provider.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    /// API key. Falls back to `OPENAI_API_KEY` env var.
    pub api_key: Option<String>,
    /// Base URL for the API. Default: `https://api.openai.com/v1`.
    pub base_url: String,
    /// Embedding model. Default: `text-embedding-3-small`.
    pub model: String,
    /// Expected embedding dimension. Default: 1536.
    pub dimension: usize,
    /// Request timeout in seconds. Default: 30.
    pub timeout_secs: u64,
    /// Maximum texts per single API request. Default: 2048.
    pub max_batch_size: usize,
}

impl Default for OpenAiEmbeddingConfig {
    fn default() -> Self {
        Self::from(&EmbeddingConfig::default())
    }
}

impl From<&EmbeddingConfig> for OpenAiEmbeddingConfig {
    fn from(config: &EmbeddingConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
            timeout_secs: config.timeout_secs,
            max_batch_size: config.max_batch_size.max(1),
        }
    }
}

impl OpenAiEmbeddingConfig {
    fn get_api_key(&self) -> Result<String, HttpApiError> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.is_empty())
            .ok_or(HttpApiError::MissingApiKey(API_KEY_ENV))
    }
}

/// OpenAI embedding provider.
pub struct OpenAiEmbeddingProvider {
    config: OpenAiEmbeddingConfig,
    client: reqwest::Client,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: OpenAiEmbeddingConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                DomainError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self { config, client })
    }

    #[instrument(skip(self, texts), fields(model = %self.config.model, count = texts.len()))]
    async fn call_embeddings_api(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, HttpApiError> {
        let api_key = self.config.get_api_key()?;
        let url = format!("{}/embeddings", self.config.base_url);

        let request_body = EmbeddingsRequest {
            model: &self.config.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| HttpApiError::from_reqwest(&e, self.config.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            let err = HttpApiError::from_status(status, &body);
            warn!(%status, transient = err.is_transient(), "Embedding API returned an error");
            return Err(err);
        }

        let body = response
            .text()
            .await
            .map_err(|e| HttpApiError::from_reqwest(&e, self.config.timeout_secs))?;
        let result: EmbeddingsResponse = serde_json::from_str(&body).map_err(|e| {
            HttpApiError::MalformedResponse(format!("Failed to parse embedding response: {e}"))
        })?;

        // Sort by index to maintain input order
        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        if data.len() != texts.len() || data.iter().enumerate().any(|(i, d)| d.index != i) {
            return Err(HttpApiError::MalformedResponse(format!(
                "expected {} embeddings indexed from 0, got {}",
                texts.len(),
                data.len()
            )));
        }

        debug!(count = data.len(), "Received embeddings");
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn check_dimensions(&self, vectors: &[Vec<f32>]) -> DomainResult<()> {
        match vectors.iter().find(|v| v.len() != self.config.dimension) {
            Some(bad) => Err(DomainError::DimensionMismatch {
                expected: self.config.dimension,
                actual: bad.len(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed_one(&self, text: &str) -> DomainResult<Vec<f32>> {
        let mut vectors = self.embed_many(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| {
            DomainError::EmbeddingProviderUnavailable("Empty embedding response".to_string())
        })
    }

    async fn embed_many(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.max_batch_size()) {
            let vectors = self
                .call_embeddings_api(batch)
                .await
                .map_err(HttpApiError::into_embedding_error)?;
            self.check_dimensions(&vectors)?;
            all_vectors.extend(vectors);
        }

        Ok(all_vectors)
    }

    fn max_batch_size(&self) -> usize {
        self.config.max_batch_size.max(1)
    }
}

// -- OpenAI API request/response types --

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
