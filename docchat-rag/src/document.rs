//! Data types for documents, chunks, and retrieval results.

use serde::{Deserialize, Serialize};

/// Pre-extracted document text handed to ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The extracted text content.
    pub text: String,
    /// Optional URI pointing to the original source (file name, URL).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a document from raw text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), source_uri: None }
    }

    /// Record where the text came from.
    pub fn with_source(mut self, uri: impl Into<String>) -> Self {
        self.source_uri = Some(uri.into());
        self
    }

    /// Whether the document has no extractable text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A contiguous passage of a [`Document`], the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position in document order.
    pub id: usize,
    /// The passage text.
    pub text: String,
}

/// A retrieved [`Chunk`] paired with its distance to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    /// The id of the retrieved chunk.
    pub chunk_id: usize,
    /// The chunk text.
    pub text: String,
    /// Squared L2 distance to the query vector (lower is more relevant).
    pub distance: f32,
}

/// Chunks retrieved for one query, nearest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    /// Retrieved chunks in ascending distance order.
    pub chunks: Vec<RetrievedChunk>,
}

impl RetrievalResult {
    /// Number of retrieved chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether nothing was retrieved.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The chunk texts in ranked order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().map(|c| c.text.as_str())
    }

    /// The chunk texts joined with newlines, ready for prompt interpolation.
    pub fn joined(&self) -> String {
        self.texts().collect::<Vec<_>>().join("\n")
    }
}
