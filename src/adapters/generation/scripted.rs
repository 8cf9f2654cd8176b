//! Scripted generation client for tests and dry runs.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{validate_temperature, GenerationClient};

/// One canned reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Raw model text
    Text(String),
    /// Simulated transport or API failure
    Failure(String),
}

impl ScriptedReply {
    pub fn text(output: impl Into<String>) -> Self {
        Self::Text(output.into())
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure(error.into())
    }
}

/// Replays canned replies in order and records every prompt it receives.
///
/// Once the script is exhausted the fallback reply (if any) is repeated.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<ScriptedReply>>,
    fallback: Option<ScriptedReply>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Client answering every prompt with the same text
    pub fn always(output: impl Into<String>) -> Self {
        Self {
            fallback: Some(ScriptedReply::text(output)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, reply: ScriptedReply) -> Self {
        self.fallback = Some(reply);
        self
    }

    /// Prompts received so far, oldest first
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, temperature: f32) -> DomainResult<String> {
        validate_temperature(temperature)?;
        self.prompts.lock().await.push(prompt.to_string());

        let next = self.script.lock().await.pop_front();
        match next.or_else(|| self.fallback.clone()) {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Failure(error)) => Err(DomainError::GenerationFailed(error)),
            None => Err(DomainError::GenerationFailed(
                "scripted client has no reply left".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_then_fails() {
        let client = ScriptedClient::new([
            ScriptedReply::text("first"),
            ScriptedReply::failure("503 Service Unavailable"),
        ]);

        assert_eq!(client.generate("a", 0.3).await.unwrap(), "first");
        assert!(matches!(
            client.generate("b", 0.3).await,
            Err(DomainError::GenerationFailed(ref m)) if m.contains("503")
        ));
        assert!(client.generate("c", 0.3).await.is_err());
        assert_eq!(client.prompts().await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_always_repeats() {
        let client = ScriptedClient::always("[]");
        for _ in 0..3 {
            assert_eq!(client.generate("q", 0.0).await.unwrap(), "[]");
        }
    }

    #[tokio::test]
    async fn test_invalid_temperature_not_recorded() {
        let client = ScriptedClient::always("[]");
        assert!(matches!(
            client.generate("q", -1.0).await,
            Err(DomainError::InvalidArgument(_))
        ));
        assert!(client.prompts().await.is_empty());
    }
}
