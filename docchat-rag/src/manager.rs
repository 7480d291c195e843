//! Registry of independent chat sessions.
//!
//! Each session has its own document index and conversation; nothing is
//! shared between them except the components the factory hands out
//! (embedder, model). Operations on one session are serialized by a
//! per-session lock, so two questions to the same session never interleave
//! while different sessions proceed concurrently.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use docchat_model::Message;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::document::Document;
use crate::error::{RagError, Result};
use crate::session::{Answer, ChatSession, IngestReport};

type SessionFactory = dyn Fn(String) -> Result<ChatSession> + Send + Sync;

/// Creates and looks up [`ChatSession`]s by id.
///
/// Cloning the manager is cheap; clones share the same registry.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<ChatSession>>>>>,
    factory: Arc<SessionFactory>,
}

impl SessionManager {
    /// Create a manager that builds new sessions with `factory`.
    ///
    /// The factory receives the id the session must use.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let manager = SessionManager::new(move |id| {
    ///     ChatSession::builder()
    ///         .id(id)
    ///         .embedder(embedder.clone())
    ///         .model(model.clone())
    ///         .build()
    /// });
    /// let id = manager.create_session().await?;
    /// ```
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(String) -> Result<ChatSession> + Send + Sync + 'static,
    {
        Self { sessions: Arc::new(RwLock::new(HashMap::new())), factory: Arc::new(factory) }
    }

    /// Create an empty session and return its id.
    pub async fn create_session(&self) -> Result<String> {
        let session_id = Uuid::new_v4().to_string();
        let session = (self.factory)(session_id.clone())?;
        self.sessions.write().await.insert(session_id.clone(), Arc::new(Mutex::new(session)));
        info!(session.id = %session_id, "session created");
        Ok(session_id)
    }

    /// Look up a session handle.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SessionNotFound`] for an unknown id.
    pub async fn get(&self, session_id: &str) -> Result<Arc<Mutex<ChatSession>>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| RagError::SessionNotFound(session_id.to_string()))
    }

    /// Index a document into the given session.
    pub async fn upload(&self, session_id: &str, document: &Document) -> Result<IngestReport> {
        let session = self.get(session_id).await?;
        let mut session = session.lock().await;
        session.upload(document).await
    }

    /// Ask a question in the given session.
    pub async fn ask(&self, session_id: &str, question: &str) -> Result<Answer> {
        let session = self.get(session_id).await?;
        let mut session = session.lock().await;
        session.ask(question).await
    }

    /// A copy of the session's conversation.
    pub async fn history(&self, session_id: &str) -> Result<Vec<Message>> {
        let session = self.get(session_id).await?;
        let session = session.lock().await;
        Ok(session.history().to_vec())
    }

    /// Remove a session. Returns whether it existed.
    pub async fn remove_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            info!(session.id = %session_id, "session removed");
        }
        removed
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions exist.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}
