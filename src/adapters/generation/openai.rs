//! OpenAI chat completions generation client.
//!
//! Sends the assembled prompt as a single user message to
//! `/chat/completions` and returns the first choice's content.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::adapters::http_error::HttpApiError;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::GenerationConfig;
use crate::domain::ports::{validate_temperature, GenerationClient};

const API_KEY_ENV: &str = "OPENAI_API_KEY";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for the OpenAI chat client.
#[derive(Debug, Clone)]
pub struct OpenAiChatConfig {
    /// API key. Falls back to `OPENAI_API_KEY` env var.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for OpenAiChatConfig {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

impl From<&GenerationConfig> for OpenAiChatConfig {
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
            timeout_secs: config.timeout_secs,
            max_tokens: config.max_tokens,
        }
    }
}

impl OpenAiChatConfig {
    fn get_api_key(&self) -> Result<String, HttpApiError> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.is_empty())
            .ok_or(HttpApiError::MissingApiKey(API_KEY_ENV))
    }
}

/// OpenAI-compatible chat completions client.
pub struct OpenAiChatClient {
    config: OpenAiChatConfig,
    client: reqwest::Client,
}

impl OpenAiChatClient {
    pub fn new(config: OpenAiChatConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                DomainError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self { config, client })
    }

    async fn call_chat_api(&self, prompt: &str, temperature: f32) -> Result<String, HttpApiError> {
        let api_key = self.config.get_api_key()?;
        let url = format!("{}/chat/completions", self.config.base_url);

        let request_body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens: self.config.max_tokens,
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
            warn!(%status, transient = err.is_transient(), "Chat API returned an error");
            return Err(err);
        }

        let body = response
            .text()
            .await
            .map_err(|e| HttpApiError::from_reqwest(&e, self.config.timeout_secs))?;
        let result: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            HttpApiError::MalformedResponse(format!("Failed to parse chat response: {e}"))
        })?;

        let choice = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| HttpApiError::MalformedResponse("response has no choices".to_string()))?;

        if let Some(reason) = choice.finish_reason.as_deref() {
            debug!(finish_reason = reason, "Chat completion finished");
        }

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(HttpApiError::MalformedResponse(
                "choice has empty content".to_string(),
            )),
        }
    }
}

#[async_trait]
impl GenerationClient for OpenAiChatClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip(self, prompt), fields(model = %self.config.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, temperature: f32) -> DomainResult<String> {
        validate_temperature(temperature)?;
        self.call_chat_api(prompt, temperature)
            .await
            .map_err(HttpApiError::into_generation_error)
    }
}

// -- Chat completions request/response types --

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
