//! Document chunking.
//!
//! Text is split into fixed-size windows of whitespace-delimited words. There
//! is no overlap between windows and no attempt to respect sentence or
//! paragraph boundaries; the window size is a tunable constant.

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// A strategy for splitting document text into passages.
pub trait Chunker: Send + Sync {
    /// Split `text` into passages in document order.
    ///
    /// Returns an empty `Vec` if the text is empty or whitespace-only.
    fn chunk(&self, text: &str) -> Vec<String>;
}

/// Splits text into consecutive, non-overlapping windows of `size` words.
///
/// Every window except possibly the last holds exactly `size` words. Words
/// inside a window are re-joined with single spaces, so the original
/// whitespace (newlines, runs of spaces) is normalised away.
///
/// # Example
///
/// ```rust
/// use docchat_rag::chunking::{Chunker, WordChunker};
///
/// let chunker = WordChunker::new(2).unwrap();
/// assert_eq!(chunker.chunk("a b\n c  d e"), vec!["a b", "c d", "e"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordChunker {
    size: usize,
}

impl WordChunker {
    /// Create a chunker producing windows of `size` words.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ChunkingError`] if `size` is zero.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(RagError::ChunkingError("chunk size must be greater than zero".into()));
        }
        Ok(Self { size })
    }

    /// Words per window.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Chunker for WordChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        chunk_words(text, self.size)
    }
}

/// Split `text` into windows of at most `size` whitespace-delimited words.
///
/// A `size` of zero yields no windows.
pub fn chunk_words(text: &str, size: usize) -> Vec<String> {
    if size == 0 {
        return Vec::new();
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    words.chunks(size).map(|window| window.join(" ")).collect()
}

/// Number the passages in document order.
pub fn into_chunks(passages: Vec<String>) -> Vec<Chunk> {
    passages.into_iter().enumerate().map(|(id, text)| Chunk { id, text }).collect()
}
