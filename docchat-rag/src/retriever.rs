//! Query-time retrieval.

use std::sync::Arc;

use tracing::{debug, error};

use crate::document::{RetrievalResult, RetrievedChunk};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;
use crate::pipeline::DocumentIndex;

/// Finds the chunks of a [`DocumentIndex`] nearest to a question.
///
/// The retriever must use the same embedder that built the index; vectors
/// from different embedding spaces are not comparable, so a mismatch is
/// reported as [`RagError::IndexError`] rather than answered with noise.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever returning up to `top_k` chunks per query.
    pub fn new(embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self { embedder, top_k }
    }

    /// Number of chunks requested per query.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Embed `query`, search `index`, and map the hits back to chunk text.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmbeddingError`] if the query cannot be encoded.
    /// - [`RagError::IndexError`] if the embedder differs from the one the
    ///   index was built with.
    pub async fn retrieve(&self, query: &str, index: &DocumentIndex) -> Result<RetrievalResult> {
        self.retrieve_k(query, self.top_k, index).await
    }

    /// Like [`retrieve`](Self::retrieve) with an explicit `k`.
    pub async fn retrieve_k(
        &self,
        query: &str,
        k: usize,
        index: &DocumentIndex,
    ) -> Result<RetrievalResult> {
        if self.embedder.model_id() != index.embedder_id()
            || self.embedder.dimensions() != index.index().dimensions()
        {
            error!(
                retriever = self.embedder.model_id(),
                index = index.embedder_id(),
                "embedding space mismatch"
            );
            return Err(RagError::IndexError(format!(
                "index was built with embedder '{}' but queries use '{}'",
                index.embedder_id(),
                self.embedder.model_id()
            )));
        }

        // 1. Encode the query
        let query_vector = self.embedder.embed_query(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            e
        })?;

        // 2. Search the index
        let neighbors = index.index().search(&query_vector, k)?;

        // 3. Map positions back to chunk text
        let chunks = neighbors
            .into_iter()
            .map(|n| {
                let chunk = &index.chunks()[n.index];
                RetrievedChunk {
                    chunk_id: chunk.id,
                    text: chunk.text.clone(),
                    distance: n.distance,
                }
            })
            .collect::<Vec<_>>();

        debug!(result_count = chunks.len(), "retrieval completed");
        Ok(RetrievalResult { chunks })
    }
}
