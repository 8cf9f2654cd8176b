//! Anthropic Messages API generation client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::adapters::http_error::HttpApiError;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::GenerationConfig;
use crate::domain::ports::{validate_temperature, GenerationClient};

const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Configuration for the Anthropic client.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (read from ANTHROPIC_API_KEY when not set).
    pub api_key: Option<String>,
    /// API base URL.
    pub base_url: String,
    pub model: String,
    /// API version header.
    pub api_version: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl From<&GenerationConfig> for AnthropicConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: config.model.clone(),
            api_version: "2023-06-01".to_string(),
            timeout_secs: config.timeout_secs,
            max_tokens: config.max_tokens,
        }
    }
}

impl AnthropicConfig {
    fn get_api_key(&self) -> Result<String, HttpApiError> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.is_empty())
            .ok_or(HttpApiError::MissingApiKey(API_KEY_ENV))
    }
}

/// Anthropic Messages API client.
pub struct AnthropicClient {
    config: AnthropicConfig,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                DomainError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self { config, client })
    }

    async fn call_messages_api(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, HttpApiError> {
        let api_key = self.config.get_api_key()?;

        let api_request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&api_request)
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
            warn!(%status, transient = err.is_transient(), "Messages API returned an error");
            return Err(err);
        }

        let body = response
            .text()
            .await
            .map_err(|e| HttpApiError::from_reqwest(&e, self.config.timeout_secs))?;
        let result: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            HttpApiError::MalformedResponse(format!("Failed to parse messages response: {e}"))
        })?;

        debug!(stop_reason = ?result.stop_reason, "Message completed");

        // Extract text from content blocks
        let text: String = result
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(HttpApiError::MalformedResponse(
                "response has no text content".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl GenerationClient for AnthropicClient {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip(self, prompt), fields(model = %self.config.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, temperature: f32) -> DomainResult<String> {
        validate_temperature(temperature)?;
        self.call_messages_api(prompt, temperature)
            .await
            .map_err(HttpApiError::into_generation_error)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}
