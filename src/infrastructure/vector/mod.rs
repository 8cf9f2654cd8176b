//! Vector infrastructure components
//!
//! Provides text chunking, the in-process embedding provider, the flat L2
//! index, and snapshot persistence for retrieval.

pub mod chunker;
pub mod embedding_service;
pub mod flat_index;
pub mod snapshot_store;

pub use chunker::{chunk, Chunker};
pub use embedding_service::{LocalEmbeddingProvider, LOCAL_MODEL_NAME};
pub use flat_index::{squared_l2, FlatL2Index};
pub use snapshot_store::{LocationLock, SnapshotStore};
