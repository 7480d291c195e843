//! Wiring settings into concrete backends.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use docchat_model::openai::{OpenAICompatClient, OpenAIConfig};
use docchat_model::{ChatModel, RetryPolicy, RetryingChatModel};
use docchat_rag::openai::OpenAIEmbedder;
use docchat_rag::{ChatSession, Embedder, HashingEmbedder, Provider, Settings};
use tracing::{info, warn};

/// Width of the offline hashing embedder.
const HASHING_DIMENSIONS: usize = 384;

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    /// all-MiniLM-L6-v2 in-process (requires the `local-embeddings` feature)
    Local,
    /// OpenAI `/embeddings` (requires `OPENAI_API_KEY`)
    Openai,
    /// Lexical feature hashing, no model download
    Hashing,
}

impl EmbedderKind {
    /// The best backend this build supports.
    pub fn preferred() -> Self {
        if cfg!(feature = "local-embeddings") { EmbedderKind::Local } else { EmbedderKind::Hashing }
    }
}

/// Build the generation backend: an OpenAI-compatible client wrapped in
/// bounded retries.
pub fn build_model(settings: &Settings) -> Result<Arc<dyn ChatModel>> {
    let mut config = match settings.provider {
        Provider::OpenRouter => OpenAIConfig::openrouter(&settings.api_key),
        Provider::OpenAI => OpenAIConfig::openai(&settings.api_key),
    };
    if let Some(base_url) = &settings.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(timeout) = settings.generation.request_timeout {
        config = config.with_timeout(timeout);
    }

    let client = OpenAICompatClient::new(config).context("failed to create backend client")?;
    let policy = RetryPolicy::default().with_max_retries(settings.max_retries);
    info!(provider = ?settings.provider, model = %settings.generation.model, "backend configured");
    Ok(Arc::new(RetryingChatModel::new(client, policy)))
}

/// Build the embedder for `kind`.
pub fn build_embedder(kind: EmbedderKind, settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let max_tokens = settings.rag.max_input_tokens;
    match kind {
        EmbedderKind::Local => local_embedder(max_tokens),
        EmbedderKind::Openai => {
            let key = std::env::var("OPENAI_API_KEY")
                .context("the openai embedder needs OPENAI_API_KEY")?;
            let embedder = OpenAIEmbedder::new(key)?.with_max_input_tokens(max_tokens);
            Ok(Arc::new(embedder))
        }
        EmbedderKind::Hashing => {
            warn!("using the hashing embedder; retrieval matches on shared words only");
            let embedder =
                HashingEmbedder::new(HASHING_DIMENSIONS)?.with_max_input_tokens(max_tokens);
            Ok(Arc::new(embedder))
        }
    }
}

#[cfg(feature = "local-embeddings")]
fn local_embedder(max_tokens: usize) -> Result<Arc<dyn Embedder>> {
    let embedder = docchat_rag::fastembed::FastEmbedder::with_max_input_tokens(max_tokens)
        .context("failed to load the local embedding model")?;
    Ok(Arc::new(embedder))
}

#[cfg(not(feature = "local-embeddings"))]
fn local_embedder(_max_tokens: usize) -> Result<Arc<dyn Embedder>> {
    anyhow::bail!("this build has no local embeddings; rebuild with --features local-embeddings")
}

/// Assemble a session from settings and injected backends.
pub fn build_session(
    settings: &Settings,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn ChatModel>,
) -> Result<ChatSession> {
    let session = ChatSession::builder()
        .config(settings.rag.clone())
        .generation(settings.generation.clone())
        .embedder(embedder)
        .model(model)
        .build()?;
    Ok(session)
}
