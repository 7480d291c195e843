//! Scripted backend for tests and offline runs.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{ModelError, Result};
use crate::model::{ChatModel, ChatRequest, ChatResponse};

/// A [`ChatModel`] that replays scripted outcomes and records every request.
///
/// Scripted outcomes are consumed in order. Once the script is exhausted the
/// mock answers with its default reply, or fails with
/// [`ModelError::EmptyResponse`] when none is set.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_model::{MockChatModel, ModelError};
///
/// let model = MockChatModel::replying("Blue");
/// let busy = ModelError::Api { provider: "mock".into(), status: 503, message: "busy".into() };
/// model.push_error(busy).await;
/// ```
#[derive(Debug, Default)]
pub struct MockChatModel {
    default_reply: Option<String>,
    latency: Option<Duration>,
    script: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatModel {
    /// Create a mock with an empty script and no default reply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that answers every request with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self { default_reply: Some(reply.into()), ..Self::default() }
    }

    /// Delay every answer by `latency` (observable with a paused tokio clock).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue a successful reply.
    pub async fn push_reply(&self, reply: impl Into<String>) {
        self.script.lock().await.push_back(Ok(reply.into()));
    }

    /// Queue a failure.
    pub async fn push_error(&self, error: ModelError) {
        self.script.lock().await.push_back(Err(error));
    }

    /// All requests received so far, in arrival order.
    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of requests received so far.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().await.push(request);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let scripted = self.script.lock().await.pop_front();
        let content = match scripted {
            Some(outcome) => outcome?,
            None => self
                .default_reply
                .clone()
                .ok_or_else(|| ModelError::EmptyResponse { provider: "mock".into() })?,
        };
        Ok(ChatResponse { content })
    }
}
