//! Generation client port.
//!
//! A generation client sends one prompt to a generative text model and
//! returns the raw reply text. No retries, no streaming; any transport or
//! envelope failure is reported as `DomainError::GenerationFailed`.

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};

/// Trait for generative text model clients.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Backend name (e.g., "openai", "anthropic", "scripted").
    fn name(&self) -> &'static str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Generate a reply for `prompt` at the given temperature.
    async fn generate(&self, prompt: &str, temperature: f32) -> DomainResult<String>;
}

/// Reject temperatures outside `[0, 1]` before any network call.
pub fn validate_temperature(temperature: f32) -> DomainResult<()> {
    if (0.0..=1.0).contains(&temperature) {
        Ok(())
    } else {
        Err(DomainError::InvalidArgument(format!(
            "temperature must be within [0, 1], got {temperature}"
        )))
    }
}
