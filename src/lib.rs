//! healmap - retrieval-augmented structured generation
//!
//! Answers questions about a Chiron "healing map" document: the document is
//! chunked and embedded into a persistent flat L2 index, the passages nearest
//! to a question are retrieved, and a generative model is asked for a
//! structured record (a day-by-day plan, a thematic overview, or a sectioned
//! analysis) that is extracted and normalized from its free-text reply.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, the error taxonomy and port traits
//! - **Adapters** (`adapters`): remote embedding and generation APIs
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging,
//!   chunking, the vector index and structured output extraction
//! - **Service Layer** (`services`): index lifecycle, retrieval, prompt
//!   assembly and the pipeline facade
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use healmap::{ConfigLoader, HealmapPipeline, PlacementRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let pipeline = HealmapPipeline::from_config(&config).await?;
//!     let request = PlacementRequest::new("How do I heal my sense of worth?")
//!         .with_sign("Taurus")
//!         .with_house("2nd");
//!     let outcome = pipeline.generate_plan(&request).await?;
//!     println!("{}", serde_json::to_string_pretty(&outcome)?);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Analysis, Config, CycleState, GenerationOutcome, HealingPlan, JsonShape, Overview, Passage,
    PlacementRequest, RetrievalResult,
};
pub use domain::ports::{DocumentSource, EmbeddingProvider, GenerationClient};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::extraction::find_balanced_span;
pub use infrastructure::vector::{chunk, Chunker};
pub use services::{assemble, HealmapPipeline, IndexService, Retriever};
