//! The generation backend seam.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;

/// A single chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The backend model identifier (e.g. `mistralai/mistral-7b-instruct`).
    pub model: String,
    /// The full ordered conversation to send.
    pub messages: Vec<Message>,
    /// Sampling temperature.
    pub temperature: f32,
}

impl ChatRequest {
    /// Create a new request.
    pub fn new(model: impl Into<String>, messages: Vec<Message>, temperature: f32) -> Self {
        Self { model: model.into(), messages, temperature }
    }
}

/// The text produced by a backend for a [`ChatRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The assistant reply.
    pub content: String,
}

/// A chat-completion backend.
///
/// Implementations must be cancel-safe: dropping the returned future aborts
/// the call without side effects on the caller's state.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// A short provider name used in logs and errors.
    fn name(&self) -> &str;

    /// Send the request and wait for the complete reply.
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse>;
}

#[async_trait]
impl<M: ChatModel + ?Sized> ChatModel for Arc<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse> {
        (**self).complete(request).await
    }
}
