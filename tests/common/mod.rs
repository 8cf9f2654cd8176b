//! Common test utilities for integration tests
//!
//! Provides shared fixtures, helpers, and test utilities used across
//! multiple integration test files.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use healmap::adapters::generation::ScriptedClient;
use healmap::domain::models::{Config, EmbeddingBackend, GenerationConfig};
use healmap::domain::ports::{EmbeddingProvider, TextFileSource};
use healmap::infrastructure::vector::{Chunker, LocalEmbeddingProvider, SnapshotStore};
use healmap::services::{HealmapPipeline, IndexService, PipelineSettings, PromptTemplates};
use healmap::DomainResult;
use tempfile::TempDir;

/// A small healing map, one placement per paragraph
pub const HEALING_MAP: &str = "\
Chiron in Aries carries a wound around the right to exist and to take up space. \
Healing comes through courageous self-assertion and honouring the body.

Chiron in Taurus carries a wound around worth, safety and material security. \
Healing comes through slow embodiment and trusting one's own value.

Chiron in Gemini carries a wound around voice, learning and being understood. \
Healing comes through curious listening and speaking one's truth.

Chiron in Cancer carries a wound around belonging, family and emotional safety. \
Healing comes through reparenting and building a chosen home.";

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Write the document to `dir/healing_map.txt`
pub fn write_document(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("healing_map.txt");
    std::fs::write(&path, text).expect("Failed to write document");
    path
}

/// Offline configuration rooted in `dir`: local embeddings, small chunks
pub fn local_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.document_path = write_document(dir, HEALING_MAP);
    config.snapshot.embeddings_path = dir.join("vector_db/embeddings.json");
    config.snapshot.index_path = dir.join("vector_db/index.hmix");
    config.chunking.max_len = 20;
    config.embedding.backend = EmbeddingBackend::Local;
    config.embedding.dimension = 128;
    config.generation = GenerationConfig {
        api_key: Some("unused".to_string()),
        ..GenerationConfig::default()
    };
    config
}

/// Pipeline over `config` answering with a scripted client
pub fn scripted_pipeline(config: &Config, client: Arc<ScriptedClient>) -> HealmapPipeline {
    let index_service = IndexService::from_config(config).expect("Failed to build index service");
    HealmapPipeline::new(
        index_service,
        client,
        PromptTemplates::default(),
        PipelineSettings::from(config),
    )
}

/// Index service over the document at `document`, storing under `dir`
pub fn index_service(
    dir: &Path,
    document: &Path,
    provider: Arc<dyn EmbeddingProvider>,
    max_len: usize,
) -> IndexService {
    IndexService::new(
        Arc::new(TextFileSource::new(document)),
        provider,
        SnapshotStore::new(dir.join("embeddings.json"), dir.join("index.hmix")),
        Chunker::new(max_len).expect("valid chunk size"),
    )
}

/// Local provider that counts batch calls and can be slowed down
pub struct CountingProvider {
    inner: LocalEmbeddingProvider,
    batches: AtomicUsize,
    delay: Duration,
}

impl CountingProvider {
    pub fn new(dimension: usize, delay: Duration) -> Self {
        Self {
            inner: LocalEmbeddingProvider::new(dimension).expect("valid dimension"),
            batches: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed_one(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.inner.embed_one(text).await
    }

    async fn embed_many(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.inner.embed_many(texts).await
    }

    fn max_batch_size(&self) -> usize {
        self.inner.max_batch_size()
    }
}
