//! Adapters for remote model APIs.

pub mod embeddings;
pub mod generation;
pub mod http_error;

pub use embeddings::create_embedding_provider;
pub use generation::create_generation_client;
pub use http_error::HttpApiError;
