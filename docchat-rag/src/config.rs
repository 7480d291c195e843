//! Configuration for the retrieval pipeline and the generation call.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// The system message every conversation starts with.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// The model used when none is configured.
pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";

/// Configuration parameters for chunking, embedding, retrieval and history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Number of whitespace-delimited words per chunk.
    pub chunk_size: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Inputs longer than this many tokens are truncated before embedding.
    pub max_input_tokens: usize,
    /// Chunks embedded per batch during ingestion; batches run concurrently.
    pub embed_batch_size: usize,
    /// Prior messages sent with each request. `None` sends the whole history.
    pub history_limit: Option<usize>,
    /// The seed system message of every conversation.
    pub system_prompt: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            top_k: 3,
            max_input_tokens: 256,
            embed_batch_size: 64,
            history_limit: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the number of words per chunk.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the embedder truncation bound in tokens.
    pub fn max_input_tokens(mut self, tokens: usize) -> Self {
        self.config.max_input_tokens = tokens;
        self
    }

    /// Set the ingestion batch size.
    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.config.embed_batch_size = size;
        self
    }

    /// Cap the number of prior messages sent with each request.
    pub fn history_limit(mut self, limit: Option<usize>) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Set the seed system message.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_size`, `top_k`,
    /// `max_input_tokens` or `embed_batch_size` is zero.
    pub fn build(self) -> Result<RagConfig> {
        let checks = [
            ("chunk_size", self.config.chunk_size),
            ("top_k", self.config.top_k),
            ("max_input_tokens", self.config.max_input_tokens),
            ("embed_batch_size", self.config.embed_batch_size),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(RagError::ConfigError(format!("{name} must be greater than zero")));
            }
        }
        Ok(self.config)
    }
}

/// Parameters of the generation call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// The backend model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Deadline for a single backend call. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            request_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl GenerationConfig {
    /// Check that the temperature is in the range backends accept.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] for an empty model identifier or a
    /// temperature outside `0.0..=2.0`.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(RagError::ConfigError("model identifier must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RagError::ConfigError(format!(
                "temperature ({}) must be between 0.0 and 2.0",
                self.temperature
            )));
        }
        Ok(())
    }
}
