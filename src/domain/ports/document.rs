//! Document source port.
//!
//! Text extraction (PDF and friends) happens outside this crate; the
//! pipeline only needs the already-extracted text of the reference document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};

/// Supplies the full text of the reference document.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Human-readable identity for logs.
    fn describe(&self) -> String;

    /// Load the full document text.
    async fn load_text(&self) -> DomainResult<String>;
}

/// Reads a UTF-8 text file.
#[derive(Debug, Clone)]
pub struct TextFileSource {
    path: PathBuf,
}

impl TextFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentSource for TextFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load_text(&self) -> DomainResult<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| DomainError::io(&self.path, e))
    }
}

/// Document held in memory.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    label: String,
    text: String,
}

impl InMemorySource {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl DocumentSource for InMemorySource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn load_text(&self) -> DomainResult<String> {
        Ok(self.text.clone())
    }
}
