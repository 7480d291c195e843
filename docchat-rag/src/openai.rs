//! Remote embedder backed by an OpenAI-compatible `/embeddings` endpoint.
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::{DEFAULT_MAX_INPUT_TOKENS, Embedder, truncate_to_tokens};
use crate::error::{RagError, Result};

/// The default OpenAI API base.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const DEFAULT_MODEL: &str = "text-embedding-3-small";
const DEFAULT_DIMENSIONS: usize = 1536;
const PROVIDER: &str = "OpenAI";

/// An [`Embedder`] backed by the OpenAI embeddings API.
///
/// Inputs longer than `max_input_tokens` whitespace tokens are cut to that
/// prefix before they are sent.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::openai::OpenAIEmbedder;
///
/// let embedder = OpenAIEmbedder::new("sk-...")?.with_dimensions(384);
/// let vectors = embedder.embed(&["hello world"]).await?;
/// ```
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    model_id: String,
    dimensions: usize,
    request_dimensions: Option<usize>,
    max_input_tokens: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder with the given API key and the default model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::ConfigError("embedding API key must not be empty".into()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: OPENAI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            model_id: model_id(DEFAULT_MODEL, DEFAULT_DIMENSIONS),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
        })
    }

    /// Point at another OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self.model_id = model_id(&self.model, self.dimensions);
        self
    }

    /// Ask the API for shortened embeddings of `dims` entries.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self.model_id = model_id(&self.model, dims);
        self
    }

    /// Set the truncation bound in tokens.
    pub fn with_max_input_tokens(mut self, max_tokens: usize) -> Self {
        self.max_input_tokens = max_tokens;
        self
    }
}

fn model_id(model: &str, dims: usize) -> String {
    format!("openai:{model}:{dims}")
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn embedding_error(message: String) -> RagError {
    RagError::EmbeddingError { provider: PROVIDER.into(), message }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let request_body = EmbeddingRequest {
            model: &self.model,
            input: texts.iter().map(|t| truncate_to_tokens(t, self.max_input_tokens)).collect(),
            dimensions: self.request_dimensions,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                embedding_error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(embedding_error(format!("API returned {status}: {detail}")));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            embedding_error(format!("failed to parse response: {e}"))
        })?;

        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_a_config_error() {
        assert!(matches!(OpenAIEmbedder::new("  "), Err(RagError::ConfigError(_))));
    }

    #[test]
    fn model_id_tracks_model_and_dimensions() {
        let embedder = OpenAIEmbedder::new("sk-test")
            .unwrap()
            .with_model("text-embedding-3-large")
            .with_dimensions(256)
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(embedder.model_id(), "openai:text-embedding-3-large:256");
        assert_eq!(embedder.dimensions(), 256);
        assert_eq!(embedder.base_url, "http://localhost:8080/v1");
    }

    #[tokio::test]
    async fn empty_batch_makes_no_request() {
        let embedder = OpenAIEmbedder::new("sk-test").unwrap().with_base_url("http://127.0.0.1:9");
        assert!(embedder.embed(&[]).await.unwrap().is_empty());
    }
}
