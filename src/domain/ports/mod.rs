//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - EmbeddingProvider: text to vector (remote API or local model)
//! - GenerationClient: prompt to raw model reply
//! - DocumentSource: the extracted text of the reference document
//!
//! These traits keep the pipeline independent of specific vendors.

pub mod document;
pub mod embedding;
pub mod generation;

pub use document::{DocumentSource, InMemorySource, TextFileSource};
pub use embedding::EmbeddingProvider;
pub use generation::{validate_temperature, GenerationClient};
