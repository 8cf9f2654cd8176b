//! Index lifecycle: load a persisted snapshot or build a fresh one
//!
//! Work for one storage location is serialized twice: an async mutex from a
//! registry shared by every clone of the service orders callers inside one
//! service, and the store's advisory lock file orders independent services
//! and processes. The first caller loads or builds; later callers reuse the
//! cached in-memory index or load what the first one persisted, so at most
//! one build runs per location.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::adapters::create_embedding_provider;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Config, EmbeddingSnapshot, Passage, SnapshotFingerprint};
use crate::domain::ports::{DocumentSource, EmbeddingProvider, TextFileSource};
use crate::infrastructure::vector::{Chunker, FlatL2Index, SnapshotStore};

/// A snapshot and its index, ready for read-only retrieval
#[derive(Debug)]
pub struct LoadedIndex {
    pub snapshot: EmbeddingSnapshot,
    pub index: FlatL2Index,
}

impl LoadedIndex {
    pub fn fingerprint(&self) -> &SnapshotFingerprint {
        &self.snapshot.fingerprint
    }

    pub fn passage(&self, id: usize) -> Option<&Passage> {
        self.snapshot.passages.get(id)
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}

/// How `ensure` obtained the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOrigin {
    /// Reused from memory
    Cached,
    /// Read from the snapshot and index files
    Loaded,
    /// Index file rebuilt from the stored snapshot vectors
    Reindexed,
    /// Chunked and embedded from the document
    Built,
}

impl fmt::Display for IndexOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cached => "cached",
            Self::Loaded => "loaded",
            Self::Reindexed => "reindexed",
            Self::Built => "built",
        };
        f.write_str(s)
    }
}

type Slot = Arc<Mutex<Option<Arc<LoadedIndex>>>>;

/// Per-location locks and cached indexes
///
/// Share one registry between services that point at the same location.
#[derive(Clone, Default)]
pub struct IndexRegistry {
    slots: Arc<Mutex<HashMap<PathBuf, Slot>>>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, location: &Path) -> Slot {
        let mut slots = self.slots.lock().await;
        Arc::clone(slots.entry(location.to_path_buf()).or_default())
    }
}

impl fmt::Debug for IndexRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexRegistry").finish_non_exhaustive()
    }
}

/// Loads, validates and builds the retrieval index
#[derive(Clone)]
pub struct IndexService {
    document: Arc<dyn DocumentSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: SnapshotStore,
    chunker: Chunker,
    registry: IndexRegistry,
}

impl IndexService {
    pub fn new(
        document: Arc<dyn DocumentSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: SnapshotStore,
        chunker: Chunker,
    ) -> Self {
        Self {
            document,
            embedder,
            store,
            chunker,
            registry: IndexRegistry::new(),
        }
    }

    /// Wire the text-file document, configured provider and snapshot paths
    pub fn from_config(config: &Config) -> DomainResult<Self> {
        Ok(Self::new(
            Arc::new(TextFileSource::new(&config.document_path)),
            create_embedding_provider(&config.embedding)?,
            SnapshotStore::from_config(&config.snapshot),
            Chunker::new(config.chunking.max_len)?,
        ))
    }

    #[must_use]
    pub fn with_registry(mut self, registry: IndexRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Return the current index, loading or building it when needed
    pub async fn load_or_build(&self) -> DomainResult<Arc<LoadedIndex>> {
        self.ensure(false).await.map(|(index, _)| index)
    }

    /// Discard whatever is persisted and build from the document
    pub async fn rebuild(&self) -> DomainResult<Arc<LoadedIndex>> {
        self.ensure(true).await.map(|(index, _)| index)
    }

    /// Load-or-build, reporting where the index came from
    ///
    /// The document is read and fingerprinted before any lock is taken, so a
    /// cache hit only waits for callers of its own location.
    #[instrument(skip(self), fields(
        location = %self.store.snapshot_path().display(),
        document = %self.document.describe()
    ))]
    pub async fn ensure(&self, force: bool) -> DomainResult<(Arc<LoadedIndex>, IndexOrigin)> {
        let document = self.document.load_text().await?;
        let expected = SnapshotFingerprint::new(
            &document,
            self.embedder.name(),
            self.embedder.model(),
            self.embedder.dimension(),
            self.chunker.max_len(),
        );

        let slot = self.registry.slot(self.store.snapshot_path()).await;
        let mut cached = slot.lock().await;

        if !force {
            if let Some(current) = cached.as_ref().filter(|c| *c.fingerprint() == expected) {
                return Ok((Arc::clone(current), IndexOrigin::Cached));
            }
        }

        let _location = self.store.lock().await?;

        if !force {
            if let Some((loaded, origin)) = self.load_matching(&expected).await? {
                let loaded = Arc::new(loaded);
                *cached = Some(Arc::clone(&loaded));
                return Ok((loaded, origin));
            }
        }

        let built = Arc::new(self.build(&document, expected).await?);
        *cached = Some(Arc::clone(&built));
        Ok((built, IndexOrigin::Built))
    }

    /// Load the persisted snapshot if it matches `expected`
    ///
    /// A stale or missing snapshot is `None`. A missing or inconsistent index
    /// file next to a valid snapshot is rebuilt from the stored vectors.
    async fn load_matching(
        &self,
        expected: &SnapshotFingerprint,
    ) -> DomainResult<Option<(LoadedIndex, IndexOrigin)>> {
        let snapshot = match self.store.require_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(DomainError::SnapshotMissing(path)) => {
                info!(path = %path.display(), "No snapshot found, building index");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if snapshot.fingerprint != *expected {
            info!(
                stored = %snapshot.fingerprint.short(),
                expected = %expected.short(),
                "Snapshot is stale, rebuilding index"
            );
            return Ok(None);
        }

        let index = match self.store.load_index().await? {
            Some(index)
                if index.len() == snapshot.len() && index.dimension() == expected.dimension =>
            {
                info!(passages = snapshot.len(), "Loaded index from disk");
                return Ok(Some((LoadedIndex { snapshot, index }, IndexOrigin::Loaded)));
            }
            Some(index) => {
                warn!(
                    index_rows = index.len(),
                    passages = snapshot.len(),
                    "Index file does not match snapshot, reindexing stored vectors"
                );
                FlatL2Index::from_vectors(expected.dimension, &snapshot.vectors)?
            }
            None => {
                info!("Index file missing, reindexing stored vectors");
                FlatL2Index::from_vectors(expected.dimension, &snapshot.vectors)?
            }
        };

        self.store.save_index(&index).await?;
        Ok(Some((LoadedIndex { snapshot, index }, IndexOrigin::Reindexed)))
    }

    #[instrument(skip(self, document), fields(document_len = document.len(), fingerprint = %fingerprint.short()))]
    async fn build(
        &self,
        document: &str,
        fingerprint: SnapshotFingerprint,
    ) -> DomainResult<LoadedIndex> {
        let passages = self.chunker.chunk_passages(document);
        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();

        info!(
            passages = passages.len(),
            batches = texts.len().div_ceil(self.embedder.max_batch_size().max(1)),
            backend = self.embedder.name(),
            "Embedding passages"
        );
        let vectors = self.embedder.embed_many(&texts).await?;

        if vectors.len() != passages.len() {
            return Err(DomainError::EmbeddingProviderUnavailable(format!(
                "provider returned {} vectors for {} passages",
                vectors.len(),
                passages.len()
            )));
        }

        let index = FlatL2Index::from_vectors(fingerprint.dimension, &vectors)?;
        let snapshot = EmbeddingSnapshot::new(fingerprint, passages, vectors);

        self.store.save_snapshot(&snapshot).await?;
        self.store.save_index(&index).await?;

        info!(passages = snapshot.len(), "Index built and persisted");
        Ok(LoadedIndex { snapshot, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::InMemorySource;
    use crate::infrastructure::vector::LocalEmbeddingProvider;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const DOCUMENT: &str = "Aries energy is bold. Taurus energy is steady.";

    /// Local provider that counts builds and can be slowed down
    struct CountingProvider {
        inner: LocalEmbeddingProvider,
        batches: AtomicUsize,
        delay: Duration,
    }

    impl CountingProvider {
        fn new(delay: Duration) -> Self {
            Self {
                inner: LocalEmbeddingProvider::new(16).unwrap(),
                batches: AtomicUsize::new(0),
                delay,
            }
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

    fn service(
        dir: &Path,
        document: &str,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> IndexService {
        IndexService::new(
            Arc::new(InMemorySource::new("test", document)),
            provider,
            SnapshotStore::new(dir.join("embeddings.json"), dir.join("index.hmix")),
            Chunker::new(3).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_builds_then_caches_then_loads() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(CountingProvider::new(Duration::ZERO));
        let svc = service(dir.path(), DOCUMENT, provider.clone());

        let (index, origin) = svc.ensure(false).await.unwrap();
        assert_eq!(origin, IndexOrigin::Built);
        assert_eq!(index.len(), 3);
        assert_eq!(index.passage(1).unwrap().text, "bold. Taurus energy");

        let (_, origin) = svc.ensure(false).await.unwrap();
        assert_eq!(origin, IndexOrigin::Cached);

        // A fresh service has an empty cache and reads the files
        let fresh = service(dir.path(), DOCUMENT, provider.clone());
        let (loaded, origin) = fresh.ensure(false).await.unwrap();
        assert_eq!(origin, IndexOrigin::Loaded);
        assert_eq!(loaded.snapshot.passages, index.snapshot.passages);
        assert_eq!(provider.batches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_calls_build_once() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(CountingProvider::new(Duration::from_millis(50)));
        let svc = service(dir.path(), DOCUMENT, provider.clone());

        let svc2 = svc.clone();
        let (a, b) = tokio::join!(svc.load_or_build(), svc2.load_or_build());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(provider.batches.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_shared_registry_across_services() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(CountingProvider::new(Duration::from_millis(50)));
        let registry = IndexRegistry::new();
        let first = service(dir.path(), DOCUMENT, provider.clone()).with_registry(registry.clone());
        let second = service(dir.path(), DOCUMENT, provider.clone()).with_registry(registry);

        let (a, b) = tokio::join!(first.load_or_build(), second.load_or_build());
        a.unwrap();
        b.unwrap();
        assert_eq!(provider.batches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_changed_document_triggers_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(CountingProvider::new(Duration::ZERO));
        service(dir.path(), DOCUMENT, provider.clone())
            .load_or_build()
            .await
            .unwrap();

        let changed = service(dir.path(), "Gemini energy is curious.", provider.clone());
        let (index, origin) = changed.ensure(false).await.unwrap();
        assert_eq!(origin, IndexOrigin::Built);
        assert_eq!(index.passage(0).unwrap().text, "Gemini energy is");
        assert_eq!(provider.batches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_index_file_is_reindexed() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(CountingProvider::new(Duration::ZERO));
        let svc = service(dir.path(), DOCUMENT, provider.clone());
        svc.load_or_build().await.unwrap();
        std::fs::remove_file(dir.path().join("index.hmix")).unwrap();

        let fresh = service(dir.path(), DOCUMENT, provider.clone());
        let (index, origin) = fresh.ensure(false).await.unwrap();
        assert_eq!(origin, IndexOrigin::Reindexed);
        assert_eq!(index.index.len(), 3);
        assert!(dir.path().join("index.hmix").exists());
        assert_eq!(provider.batches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("embeddings.json"), "not json").unwrap();
        let provider = Arc::new(CountingProvider::new(Duration::ZERO));

        let err = service(dir.path(), DOCUMENT, provider.clone())
            .load_or_build()
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SnapshotCorrupt { .. }));
        assert_eq!(provider.batches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_force_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(CountingProvider::new(Duration::ZERO));
        let svc = service(dir.path(), DOCUMENT, provider.clone());
        svc.load_or_build().await.unwrap();
        svc.rebuild().await.unwrap();
        assert_eq!(provider.batches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_document_builds_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(CountingProvider::new(Duration::ZERO));
        let index = service(dir.path(), "   ", provider)
            .load_or_build()
            .await
            .unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_independent_services_build_once() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(CountingProvider::new(Duration::from_millis(100)));
        let first = service(dir.path(), DOCUMENT, provider.clone());
        let second = service(dir.path(), DOCUMENT, provider.clone());

        let (a, b) = tokio::join!(first.ensure(false), second.ensure(false));
        let mut origins = vec![a.unwrap().1, b.unwrap().1];
        origins.sort_by_key(ToString::to_string);

        assert_eq!(provider.batches.load(Ordering::SeqCst), 1);
        assert_eq!(origins, vec![IndexOrigin::Built, IndexOrigin::Loaded]);
        assert!(dir.path().join("embeddings.json.lock").exists());
    }

    /// Document source that records how many loads overlap
    struct OverlapSource {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl DocumentSource for OverlapSource {
        fn describe(&self) -> String {
            "overlap".to_string()
        }

        async fn load_text(&self) -> DomainResult<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(DOCUMENT.to_string())
        }
    }

    #[tokio::test]
    async fn test_document_read_outside_location_lock() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(OverlapSource {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let svc = IndexService::new(
            source.clone(),
            Arc::new(CountingProvider::new(Duration::ZERO)),
            SnapshotStore::new(dir.path().join("embeddings.json"), dir.path().join("index.hmix")),
            Chunker::new(3).unwrap(),
        );
        svc.load_or_build().await.unwrap();

        let (a, b) = tokio::join!(svc.ensure(false), svc.ensure(false));
        assert_eq!(a.unwrap().1, IndexOrigin::Cached);
        assert_eq!(b.unwrap().1, IndexOrigin::Cached);
        assert_eq!(source.peak.load(Ordering::SeqCst), 2);
    }
}
