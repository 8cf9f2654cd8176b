//! Passage and retrieval domain models.

use serde::{Deserialize, Serialize};

/// One bounded-size slice of the source document, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Position of this passage's vector in the index (0-based)
    pub id: usize,

    /// Passage text, tokens joined by single spaces
    pub text: String,

    /// Order in which the passage appeared in the source document
    pub source_order: usize,
}

impl Passage {
    pub fn new(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            source_order: id,
        }
    }

    /// Get a preview of the text (first 80 chars)
    pub fn preview(&self) -> String {
        match self.text.char_indices().nth(80) {
            Some((idx, _)) => format!("{}...", &self.text[..idx]),
            None => self.text.clone(),
        }
    }
}

/// A single nearest-neighbour hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub passage: Passage,

    /// Squared Euclidean distance between the query and passage vectors
    pub distance: f32,
}

/// Hits ordered nearest first; never longer than the requested k.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub hits: Vec<RetrievalHit>,
}

impl RetrievalResult {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Passage texts in retrieval order, ready for prompt assembly.
    pub fn texts(&self) -> Vec<String> {
        self.hits.iter().map(|h| h.passage.text.clone()).collect()
    }

    pub fn distances(&self) -> Vec<f32> {
        self.hits.iter().map(|h| h.distance).collect()
    }
}
