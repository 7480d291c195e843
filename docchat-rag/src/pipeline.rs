//! Document ingestion: chunk → embed → index.
//!
//! A [`DocumentIndex`] owns everything derived from one document: the chunk
//! list, the vector index over their embeddings, and the identity of the
//! embedding space the vectors live in. It is built once per document and
//! replaced wholesale when a new document arrives.
//!
//! # Example
//!
//! ```rust,ignore
//! use docchat_rag::{Document, DocumentIndex, HashingEmbedder, WordChunker};
//!
//! let index = DocumentIndex::build(
//!     &Document::new(raw_text),
//!     &WordChunker::new(300)?,
//!     &HashingEmbedder::new(384)?,
//!     64,
//! )
//! .await?;
//! ```

use tracing::{error, info};

use crate::chunking::{Chunker, into_chunks};
use crate::document::{Chunk, Document};
use crate::embedding::{Embedder, embed_in_batches};
use crate::error::{RagError, Result};
use crate::index::{FlatL2Index, VectorIndex};

/// The searchable form of one ingested document.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    chunks: Vec<Chunk>,
    index: FlatL2Index,
    embedder_id: String,
}

impl DocumentIndex {
    /// Chunk, embed and index a document.
    ///
    /// Chunks are embedded in batches of `embed_batch_size` that run
    /// concurrently; chunk order is preserved end to end.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyDocument`] if the document yields no chunks. No
    ///   embedding call is made in that case.
    /// - [`RagError::EmbeddingError`] if the embedder fails.
    /// - [`RagError::IndexError`] if the vectors cannot be indexed.
    pub async fn build(
        document: &Document,
        chunker: &dyn Chunker,
        embedder: &dyn Embedder,
        embed_batch_size: usize,
    ) -> Result<Self> {
        let source = document.source_uri.as_deref().unwrap_or("<inline>");

        // 1. Chunk the document
        let chunks = into_chunks(chunker.chunk(&document.text));
        if chunks.is_empty() {
            info!(source, "document has no extractable text");
            return Err(RagError::EmptyDocument);
        }

        // 2. Embed all chunks
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = embed_in_batches(embedder, &texts, embed_batch_size).await.map_err(|e| {
            error!(source, error = %e, "embedding failed during ingestion");
            e
        })?;

        // 3. Build the index
        let index = FlatL2Index::build(vectors)?;

        info!(
            source,
            chunk_count = chunks.len(),
            dimensions = index.dimensions(),
            embedder = embedder.model_id(),
            "indexed document"
        );

        Ok(Self { chunks, index, embedder_id: embedder.model_id().to_string() })
    }

    /// The chunks in document order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The vector index over the chunk embeddings.
    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    /// The [`Embedder::model_id`] the vectors were produced with.
    pub fn embedder_id(&self) -> &str {
        &self.embedder_id
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Always false: an index is never built from an empty document.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::chunking::WordChunker;
    use crate::embedding::HashingEmbedder;

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Err(RagError::EmbeddingError { provider: "failing".into(), message: "oom".into() })
        }

        fn dimensions(&self) -> usize {
            8
        }

        fn model_id(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn builds_one_entry_per_chunk() {
        let document = Document::new("a b c d e f g");
        let index = DocumentIndex::build(
            &document,
            &WordChunker::new(3).unwrap(),
            &HashingEmbedder::new(16).unwrap(),
            2,
        )
        .await
        .unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.index().len(), 3);
        assert_eq!(index.chunks()[2].text, "g");
        assert_eq!(index.embedder_id(), "hashing-fnv1a-16");
    }

    #[tokio::test]
    async fn blank_document_is_rejected_before_embedding() {
        // FailingEmbedder would error if it were ever called.
        let err = DocumentIndex::build(
            &Document::new("  \n "),
            &WordChunker::new(3).unwrap(),
            &FailingEmbedder,
            8,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RagError::EmptyDocument));
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let err = DocumentIndex::build(
            &Document::new("some text"),
            &WordChunker::new(3).unwrap(),
            &FailingEmbedder,
            8,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RagError::EmbeddingError { .. }));
    }
}
