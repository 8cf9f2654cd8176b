pub mod config;
pub mod generation;
pub mod passage;
pub mod record;
pub mod snapshot;

pub use config::{
    ChunkingConfig, Config, EmbeddingBackend, EmbeddingConfig, GenerationBackend,
    GenerationConfig, LoggingConfig, RetrievalConfig, SnapshotConfig, TemplatesConfig,
};
pub use generation::{CycleState, GenerationOutcome, PlacementParameters, PlacementRequest};
pub use passage::{Passage, RetrievalHit, RetrievalResult};
pub use record::{Analysis, HealingPlan, JsonShape, Overview, PlanDay, StructuredRecord};
pub use snapshot::{document_digest, EmbeddingSnapshot, SnapshotFingerprint, SNAPSHOT_FORMAT_VERSION};
