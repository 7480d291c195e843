//! # docchat-rag
//!
//! Retrieval-augmented question answering over a single document.
//!
//! ## Overview
//!
//! A [`ChatSession`] turns one document into an in-memory vector index and
//! then answers questions about it:
//!
//! 1. **Ingest** - the [`Chunker`] splits the text into fixed-size word
//!    windows, the [`Embedder`] encodes every chunk, and a [`FlatL2Index`]
//!    is built over the vectors ([`DocumentIndex::build`]).
//! 2. **Retrieve** - the [`Retriever`] encodes the question with the same
//!    embedder and returns the `top_k` nearest chunks by squared L2 distance.
//! 3. **Prompt** - the [`PromptBuilder`] renders the retrieved context and
//!    the question into a template and appends it to the [`Conversation`].
//! 4. **Generate** - the full conversation goes to a
//!    [`ChatModel`](docchat_model::ChatModel); the reply is appended and
//!    returned.
//!
//! A failed turn leaves the conversation exactly as it was before the
//! question. [`SessionManager`] keeps many sessions side by side.
//!
//! ## Features
//!
//! - `openai` - [`OpenAIEmbedder`](openai::OpenAIEmbedder), remote embeddings
//! - `fastembed` - [`FastEmbedder`](fastembed::FastEmbedder), local `all-MiniLM-L6-v2`
//! - `full` - both
//!
//! Without either feature the crate ships [`HashingEmbedder`], a
//! deterministic bag-of-words embedder suitable for tests and offline use.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docchat_model::MockChatModel;
//! use docchat_rag::{ChatSession, Document, HashingEmbedder, RagConfig};
//!
//! let mut session = ChatSession::builder()
//!     .config(RagConfig::builder().chunk_size(300).top_k(3).build()?)
//!     .embedder(Arc::new(HashingEmbedder::new(384)?))
//!     .model(Arc::new(MockChatModel::replying("Blue")))
//!     .build()?;
//!
//! session.upload(&Document::new(text)).await?;
//! let answer = session.ask("What color is the sky?").await?;
//! println!("{}", answer.content);
//! ```

pub mod chunking;
pub mod config;
pub mod conversation;
pub mod document;
pub mod embedding;
pub mod error;
#[cfg(feature = "fastembed")]
pub mod fastembed;
pub mod index;
pub mod manager;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod session;
pub mod settings;

pub use chunking::{Chunker, WordChunker};
pub use config::{GenerationConfig, RagConfig, RagConfigBuilder};
pub use conversation::{Conversation, PendingTurn};
pub use document::{Chunk, Document, RetrievalResult, RetrievedChunk};
pub use embedding::{Embedder, HashingEmbedder};
pub use error::{RagError, Result};
pub use index::{FlatL2Index, Neighbor, VectorIndex};
pub use manager::SessionManager;
pub use pipeline::DocumentIndex;
pub use prompt::{DEFAULT_TEMPLATE, PreparedTurn, PromptBuilder};
pub use retriever::Retriever;
pub use session::{Answer, ChatSession, ChatSessionBuilder, IngestReport, SessionState};
pub use settings::{Provider, Settings};
