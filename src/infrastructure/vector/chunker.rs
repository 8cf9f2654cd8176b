//! Text chunking implementation
//!
//! Splits document text into fixed-size windows of whitespace-delimited
//! tokens. Windows never overlap and ignore sentence boundaries.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Passage;

/// Word-window chunker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    max_len: usize,
}

impl Chunker {
    /// Create a chunker emitting windows of `max_len` tokens
    pub fn new(max_len: usize) -> DomainResult<Self> {
        if max_len == 0 {
            return Err(DomainError::InvalidArgument(
                "chunk max_len must be at least 1".to_string(),
            ));
        }
        Ok(Self { max_len })
    }

    pub const fn max_len(&self) -> usize {
        self.max_len
    }

    /// Chunk text into passage strings
    ///
    /// Every window except possibly the last holds exactly `max_len` tokens.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: Vec<&str> = Vec::with_capacity(self.max_len);

        for word in text.split_whitespace() {
            window.push(word);
            if window.len() >= self.max_len {
                chunks.push(window.join(" "));
                window.clear();
            }
        }

        if !window.is_empty() {
            chunks.push(window.join(" "));
        }

        chunks
    }

    /// Chunk text into passages numbered from 0 in document order
    pub fn chunk_passages(&self, text: &str) -> Vec<Passage> {
        self.chunk(text)
            .into_iter()
            .enumerate()
            .map(|(id, text)| Passage::new(id, text))
            .collect()
    }
}

/// Convenience wrapper for one-off chunking
pub fn chunk(text: &str, max_len: usize) -> DomainResult<Vec<String>> {
    Ok(Chunker::new(max_len)?.chunk(text))
}
