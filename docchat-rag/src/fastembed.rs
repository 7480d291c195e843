//! Local sentence-transformer embeddings via `fastembed` (ONNX Runtime).
//!
//! This module is only available when the `fastembed` feature is enabled.
//! The first construction downloads the model weights into the fastembed
//! cache directory.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, error, info};

use crate::embedding::{DEFAULT_MAX_INPUT_TOKENS, Embedder};
use crate::error::{RagError, Result};

const PROVIDER: &str = "fastembed";

/// An [`Embedder`] running `all-MiniLM-L6-v2` in-process.
///
/// Inputs are truncated by the model tokenizer to `max_input_tokens`
/// word-pieces. Inference is CPU-bound and runs on the blocking pool.
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    dimensions: usize,
    model_id: String,
}

impl FastEmbedder {
    /// Load `all-MiniLM-L6-v2` with the default truncation bound.
    pub fn new() -> Result<Self> {
        Self::with_max_input_tokens(DEFAULT_MAX_INPUT_TOKENS)
    }

    /// Load `all-MiniLM-L6-v2`, truncating inputs to `max_tokens`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the model cannot be loaded.
    pub fn with_max_input_tokens(max_tokens: usize) -> Result<Self> {
        let mut model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                .with_max_length(max_tokens)
                .with_show_download_progress(false),
        )
        .map_err(|e| {
            error!(provider = PROVIDER, error = %e, "model initialization failed");
            embedding_error(format!("model initialization failed: {e}"))
        })?;

        // Probe once to learn the output width
        let probe = model
            .embed(vec!["dimension probe"], None)
            .map_err(|e| embedding_error(format!("probe embedding failed: {e}")))?;
        let dimensions = probe
            .first()
            .map(Vec::len)
            .ok_or_else(|| embedding_error("probe returned no embedding".to_string()))?;

        info!(provider = PROVIDER, dimensions, max_tokens, "embedding model loaded");

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            dimensions,
            model_id: format!("fastembed:all-MiniLM-L6-v2:{max_tokens}"),
        })
    }
}

fn embedding_error(message: String) -> RagError {
    RagError::EmbeddingError { provider: PROVIDER.into(), message }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), "embedding batch");

        let model = Arc::clone(&self.model);
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();

        tokio::task::spawn_blocking(move || {
            let mut model =
                model.lock().map_err(|_| embedding_error("model lock poisoned".to_string()))?;
            model.embed(owned, None).map_err(|e| embedding_error(e.to_string()))
        })
        .await
        .map_err(|e| embedding_error(format!("embedding task failed: {e}")))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
