//! Snapshot persistence
//!
//! Two files make up a persisted index: a JSON snapshot (fingerprint,
//! passages, vectors) and the binary flat index. Both are written to a
//! temporary sibling and renamed into place so a reader never observes a
//! half-written file. Builders serialize on an advisory lock file next to
//! the snapshot so separate processes never build the same location twice.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EmbeddingSnapshot, SnapshotConfig, SNAPSHOT_FORMAT_VERSION};

use super::flat_index::FlatL2Index;

/// Exclusive advisory lock on one storage location, released on drop
#[derive(Debug)]
pub struct LocationLock {
    file: File,
    path: PathBuf,
}

impl LocationLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LocationLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "Failed to release location lock");
        }
    }
}

/// Reads and writes the snapshot and index files of one storage location
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    snapshot_path: PathBuf,
    index_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(snapshot_path: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            index_path: index_path.into(),
        }
    }

    pub fn from_config(config: &SnapshotConfig) -> Self {
        Self::new(&config.embeddings_path, &config.index_path)
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// `<snapshot path>.lock`
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.snapshot_path.clone().into_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Wait until this handle holds the exclusive lock for the location
    ///
    /// The lock is per open file, so two stores on the same paths exclude
    /// each other inside one process as well as across processes.
    #[instrument(skip(self), fields(path = %self.lock_path().display()))]
    pub async fn lock(&self) -> DomainResult<LocationLock> {
        let path = self.lock_path();
        ensure_parent(&path).await?;

        let blocking_path = path.clone();
        let lock = tokio::task::spawn_blocking(move || -> DomainResult<LocationLock> {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&blocking_path)
                .map_err(|e| DomainError::io(&blocking_path, e))?;
            FileExt::lock_exclusive(&file).map_err(|e| DomainError::io(&blocking_path, e))?;
            Ok(LocationLock {
                file,
                path: blocking_path,
            })
        })
        .await
        .map_err(|e| DomainError::io(&path, std::io::Error::other(e)))??;

        debug!("Acquired location lock");
        Ok(lock)
    }

    /// Load the snapshot, `SnapshotMissing` when the file does not exist
    pub async fn require_snapshot(&self) -> DomainResult<EmbeddingSnapshot> {
        self.load_snapshot()
            .await?
            .ok_or_else(|| DomainError::SnapshotMissing(self.snapshot_path.clone()))
    }

    /// Load the snapshot, `None` when the file does not exist
    #[instrument(skip(self), fields(path = %self.snapshot_path.display()))]
    pub async fn load_snapshot(&self) -> DomainResult<Option<EmbeddingSnapshot>> {
        let Some(bytes) = read_optional(&self.snapshot_path).await? else {
            debug!("No snapshot file");
            return Ok(None);
        };

        let corrupt = |reason: String| DomainError::SnapshotCorrupt {
            path: self.snapshot_path.clone(),
            reason,
        };

        let snapshot: EmbeddingSnapshot =
            serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;

        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported format version {}",
                snapshot.format_version
            )));
        }
        if snapshot.passages.len() != snapshot.vectors.len() {
            return Err(corrupt(format!(
                "{} passages but {} vectors",
                snapshot.passages.len(),
                snapshot.vectors.len()
            )));
        }
        let dimension = snapshot.fingerprint.dimension;
        if let Some(bad) = snapshot.vectors.iter().find(|v| v.len() != dimension) {
            return Err(corrupt(format!(
                "vector of length {} in a snapshot of dimension {dimension}",
                bad.len()
            )));
        }
        if let Some((pos, _)) = snapshot
            .passages
            .iter()
            .enumerate()
            .find(|(pos, p)| p.id != *pos)
        {
            return Err(corrupt(format!("passage at position {pos} has a different id")));
        }

        debug!(passages = snapshot.len(), "Loaded snapshot");
        Ok(Some(snapshot))
    }

    /// Persist the snapshot atomically
    #[instrument(skip(self, snapshot), fields(path = %self.snapshot_path.display(), passages = snapshot.len()))]
    pub async fn save_snapshot(&self, snapshot: &EmbeddingSnapshot) -> DomainResult<()> {
        let bytes = serde_json::to_vec(snapshot).map_err(|e| DomainError::SnapshotCorrupt {
            path: self.snapshot_path.clone(),
            reason: e.to_string(),
        })?;
        write_atomic(&self.snapshot_path, &bytes).await
    }

    /// Load the index, `None` when the file does not exist
    #[instrument(skip(self), fields(path = %self.index_path.display()))]
    pub async fn load_index(&self) -> DomainResult<Option<FlatL2Index>> {
        let Some(bytes) = read_optional(&self.index_path).await? else {
            debug!("No index file");
            return Ok(None);
        };

        FlatL2Index::from_bytes(&bytes)
            .map(Some)
            .map_err(|reason| DomainError::IndexCorrupt {
                path: self.index_path.clone(),
                reason,
            })
    }

    /// Persist the index atomically
    #[instrument(skip(self, index), fields(path = %self.index_path.display(), rows = index.len()))]
    pub async fn save_index(&self, index: &FlatL2Index) -> DomainResult<()> {
        write_atomic(&self.index_path, &index.to_bytes()).await
    }
}

async fn read_optional(path: &Path) -> DomainResult<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DomainError::io(path, e)),
    }
}

/// Write to a temporary sibling, then rename over the destination
async fn write_atomic(path: &Path, bytes: &[u8]) -> DomainResult<()> {
    ensure_parent(path).await?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

    let written = async {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await
    }
    .await;
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(DomainError::io(&tmp_path, e));
    }

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(DomainError::io(path, e));
    }

    debug!(path = %path.display(), bytes = bytes.len(), "Wrote file");
    Ok(())
}

async fn ensure_parent(path: &Path) -> DomainResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DomainError::io(parent, e))?;
    }
    Ok(())
}
