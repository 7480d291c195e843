//! Error types for the `docchat-rag` crate.

use docchat_model::ModelError;
use thiserror::Error;

/// Errors that can occur while ingesting a document or answering a question.
#[derive(Debug, Error)]
pub enum RagError {
    /// A required setting is missing or invalid. Fatal at startup.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The document contained no extractable text, so no index can be built.
    #[error("Document contains no extractable text")]
    EmptyDocument,

    /// The question was empty or whitespace-only.
    #[error("Question must not be empty")]
    EmptyQuestion,

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index could not be built or searched.
    #[error("Index error: {0}")]
    IndexError(String),

    /// An error occurred during document chunking.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// A question was asked before any document was indexed.
    #[error("No document has been indexed for this session")]
    NotReady,

    /// No session exists under the given id.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The generation backend failed; the turn was rolled back.
    #[error("Backend error: {0}")]
    BackendError(#[from] ModelError),
}

impl RagError {
    /// Whether the session can keep serving after this error.
    ///
    /// Only configuration errors are fatal; everything else aborts a single
    /// upload or turn.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ConfigError(_))
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
