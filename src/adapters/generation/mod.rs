//! Generation client adapters and factory.

pub mod anthropic;
pub mod openai;
pub mod scripted;

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{GenerationBackend, GenerationConfig};
use crate::domain::ports::GenerationClient;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use openai::{OpenAiChatClient, OpenAiChatConfig};
pub use scripted::{ScriptedClient, ScriptedReply};

/// Create the generation client selected by configuration.
pub fn create_generation_client(
    config: &GenerationConfig,
) -> DomainResult<Arc<dyn GenerationClient>> {
    let client: Arc<dyn GenerationClient> = match config.backend {
        GenerationBackend::OpenAi => {
            Arc::new(OpenAiChatClient::new(OpenAiChatConfig::from(config))?)
        }
        GenerationBackend::Anthropic => {
            Arc::new(AnthropicClient::new(AnthropicConfig::from(config))?)
        }
    };
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_selects_backend() {
        let client = create_generation_client(&GenerationConfig::default()).unwrap();
        assert_eq!(client.name(), "openai");

        let client = create_generation_client(&GenerationConfig {
            backend: GenerationBackend::Anthropic,
            model: "claude-3-5-haiku-latest".to_string(),
            ..GenerationConfig::default()
        })
        .unwrap();
        assert_eq!(client.name(), "anthropic");
        assert_eq!(client.model(), "claude-3-5-haiku-latest");
    }
}
