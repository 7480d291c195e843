//! The per-session orchestrator.
//!
//! A [`ChatSession`] owns one document index and one conversation and moves
//! through these states:
//!
//! ```text
//! Empty ──upload──▶ Indexed ──▶ Ready ◀──▶ Answering
//!                     ▲            │
//!                     └──upload────┘
//! ```
//!
//! Uploading a document replaces the index wholesale and resets the
//! conversation. Each question runs start to finish (retrieve, prompt,
//! generate, commit) before the next is accepted; `ask` takes `&mut self`.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docchat_rag::{ChatSession, Document, HashingEmbedder, RagConfig};
//! use docchat_model::MockChatModel;
//!
//! let mut session = ChatSession::builder()
//!     .config(RagConfig::default())
//!     .embedder(Arc::new(HashingEmbedder::new(384)?))
//!     .model(Arc::new(MockChatModel::replying("Blue")))
//!     .build()?;
//!
//! session.upload(&Document::new("The sky is blue. Grass is green.")).await?;
//! let answer = session.ask("What color is the sky?").await?;
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use docchat_model::{ChatModel, Message, ModelError};
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use crate::chunking::{Chunker, WordChunker};
use crate::config::{GenerationConfig, RagConfig};
use crate::conversation::Conversation;
use crate::document::{Chunk, Document, RetrievalResult};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::pipeline::DocumentIndex;
use crate::prompt::PromptBuilder;
use crate::retriever::Retriever;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No document has been indexed.
    Empty,
    /// A document was chunked, embedded and indexed.
    Indexed,
    /// Waiting for a question.
    Ready,
    /// Retrieval and generation are in flight.
    Answering,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Empty => "empty",
            SessionState::Indexed => "indexed",
            SessionState::Ready => "ready",
            SessionState::Answering => "answering",
        };
        f.write_str(name)
    }
}

/// Summary of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of chunks the document was split into.
    pub chunk_count: usize,
    /// Dimensionality of the chunk embeddings.
    pub dimensions: usize,
}

/// The reply to one question.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// The assistant reply.
    pub content: String,
    /// The chunks the reply was grounded on, nearest first.
    pub context: RetrievalResult,
}

/// One user's document, index and conversation.
pub struct ChatSession {
    id: String,
    config: RagConfig,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn ChatModel>,
    retriever: Retriever,
    prompt: PromptBuilder,
    index: Option<DocumentIndex>,
    conversation: Conversation,
    state: SessionState,
}

impl ChatSession {
    /// Create a new [`ChatSessionBuilder`].
    pub fn builder() -> ChatSessionBuilder {
        ChatSessionBuilder::default()
    }

    /// The session id used in logs and by [`SessionManager`](crate::SessionManager).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The retrieval configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// The conversation so far, system message first.
    pub fn history(&self) -> &[Message] {
        self.conversation.snapshot()
    }

    /// The chunks of the current document, if one is indexed.
    pub fn chunks(&self) -> Option<&[Chunk]> {
        self.index.as_ref().map(|index| index.chunks())
    }

    fn transition(&mut self, to: SessionState) {
        debug!(session.id = %self.id, from = %self.state, %to, "session state change");
        self.state = to;
    }

    /// Index a new document, replacing any previous one.
    ///
    /// On success the previous index and chunk set are discarded and the
    /// conversation is reset to its system message. On failure the session
    /// is left exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyDocument`] if the document has no extractable text.
    /// - [`RagError::EmbeddingError`] or [`RagError::IndexError`] if indexing fails.
    pub async fn upload(&mut self, document: &Document) -> Result<IngestReport> {
        let span = info_span!("docchat.ingest", session.id = %self.id);
        let index = DocumentIndex::build(
            document,
            self.chunker.as_ref(),
            self.embedder.as_ref(),
            self.config.embed_batch_size,
        )
        .instrument(span)
        .await?;

        let report = IngestReport {
            chunk_count: index.len(),
            dimensions: self.embedder.dimensions(),
        };

        self.index = Some(index);
        self.conversation.reset();
        self.transition(SessionState::Indexed);
        self.transition(SessionState::Ready);

        info!(session.id = %self.id, chunk_count = report.chunk_count, "document ready");
        Ok(report)
    }

    /// Answer a question about the current document.
    ///
    /// Either both the user prompt and the assistant reply are appended to
    /// the conversation, or neither is. Dropping the returned future before
    /// it completes also leaves the conversation untouched and the session
    /// back in [`SessionState::Ready`].
    ///
    /// # Errors
    ///
    /// - [`RagError::NotReady`] if no document is indexed.
    /// - [`RagError::EmptyQuestion`] for a blank question.
    /// - [`RagError::EmbeddingError`] if the question cannot be encoded.
    /// - [`RagError::BackendError`] if generation fails or times out.
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::EmptyQuestion);
        }
        if self.index.is_none() {
            return Err(RagError::NotReady);
        }

        let span = info_span!("docchat.turn", session.id = %self.id);
        let mut turn = AnsweringGuard::enter(self);
        turn.answer(question).instrument(span).await
    }

    async fn answer(&mut self, question: &str) -> Result<Answer> {
        let Some(index) = self.index.as_ref() else {
            return Err(RagError::NotReady);
        };

        // 1. Retrieve context; failures here leave the conversation untouched
        let context = self.retriever.retrieve(question, index).await?;

        // 2. Append the prompt and build the request
        let prepared = self.prompt.build(question, &context, &mut self.conversation);

        // 3. Call the backend; dropping `prepared` on any exit rolls the turn back
        let call = self.model.complete(prepared.request.clone());
        let response = match self.prompt.generation().request_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, call).await {
                Ok(result) => result,
                Err(_) => Err(ModelError::Timeout {
                    provider: self.model.name().to_string(),
                    elapsed: deadline,
                }),
            },
            None => call.await,
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                error!(session.id = %self.id, error = %e, "generation failed, turn rolled back");
                return Err(RagError::BackendError(e));
            }
        };

        // 4. Commit the answer
        prepared.commit(response.content.clone());
        info!(
            session.id = %self.id,
            result_count = context.len(),
            history_len = self.conversation.len(),
            "question answered"
        );

        Ok(Answer { content: response.content, context })
    }

    /// Drop the conversation back to its system message, keeping the index.
    pub fn reset_conversation(&mut self) {
        self.conversation.reset();
        info!(session.id = %self.id, "conversation reset");
    }
}

/// Holds a session in [`SessionState::Answering`] for the length of one turn.
///
/// Dropping the guard returns the session to [`SessionState::Ready`], whether
/// the turn finished, failed, or its future was dropped mid-flight.
struct AnsweringGuard<'a> {
    session: &'a mut ChatSession,
}

impl<'a> AnsweringGuard<'a> {
    fn enter(session: &'a mut ChatSession) -> Self {
        session.transition(SessionState::Answering);
        Self { session }
    }
}

impl Deref for AnsweringGuard<'_> {
    type Target = ChatSession;

    fn deref(&self) -> &ChatSession {
        self.session
    }
}

impl DerefMut for AnsweringGuard<'_> {
    fn deref_mut(&mut self) -> &mut ChatSession {
        self.session
    }
}

impl Drop for AnsweringGuard<'_> {
    fn drop(&mut self) {
        self.session.transition(SessionState::Ready);
    }
}

impl fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("chunks", &self.index.as_ref().map(DocumentIndex::len))
            .field("history_len", &self.conversation.len())
            .field("model", &self.model.name())
            .finish()
    }
}

/// Builder for constructing a [`ChatSession`].
///
/// `embedder` and `model` are required. The chunker defaults to a
/// [`WordChunker`] sized by `config.chunk_size`.
///
/// # Example
///
/// ```rust,ignore
/// let session = ChatSession::builder()
///     .config(RagConfig::default())
///     .generation(GenerationConfig::default())
///     .embedder(Arc::new(embedder))
///     .model(Arc::new(model))
///     .build()?;
/// ```
#[derive(Default)]
pub struct ChatSessionBuilder {
    id: Option<String>,
    config: Option<RagConfig>,
    generation: Option<GenerationConfig>,
    chunker: Option<Arc<dyn Chunker>>,
    embedder: Option<Arc<dyn Embedder>>,
    model: Option<Arc<dyn ChatModel>>,
    template: Option<String>,
}

impl ChatSessionBuilder {
    /// Set the session id. Defaults to a random UUID.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the retrieval configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the generation parameters.
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Override the chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedder used for both chunks and questions.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the generation backend.
    pub fn model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Override the prompt template.
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Build the [`ChatSession`] in the [`SessionState::Empty`] state.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required component is missing
    /// or a setting is invalid.
    pub fn build(self) -> Result<ChatSession> {
        let config = self.config.unwrap_or_default();
        let generation = self.generation.unwrap_or_default();
        generation.validate()?;

        let embedder =
            self.embedder.ok_or_else(|| RagError::ConfigError("embedder is required".to_string()))?;
        let model =
            self.model.ok_or_else(|| RagError::ConfigError("model is required".to_string()))?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(WordChunker::new(config.chunk_size)?),
        };

        let mut prompt = PromptBuilder::new(generation);
        if let Some(template) = self.template {
            prompt = prompt.with_template(template)?;
        }

        let conversation = Conversation::new(config.system_prompt.clone())
            .with_history_limit(config.history_limit);

        Ok(ChatSession {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            retriever: Retriever::new(embedder.clone(), config.top_k),
            config,
            chunker,
            embedder,
            model,
            prompt,
            index: None,
            conversation,
            state: SessionState::Empty,
        })
    }
}
