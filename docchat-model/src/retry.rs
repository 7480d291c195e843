//! Bounded retry with exponential backoff for transient backend failures.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::model::{ChatModel, ChatRequest, ChatResponse};

/// How many times, and how patiently, to retry a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for every further retry.
    pub initial_backoff: Duration,
    /// Upper bound for a single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    /// Set the number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

/// Wraps a [`ChatModel`] and retries failures for which
/// [`ModelError::is_transient`](crate::ModelError::is_transient) holds.
///
/// Permanent failures (bad credentials, malformed requests) are returned
/// immediately.
#[derive(Debug)]
pub struct RetryingChatModel<M> {
    inner: M,
    policy: RetryPolicy,
}

impl<M: ChatModel> RetryingChatModel<M> {
    /// Wrap `inner` with the given policy.
    pub fn new(inner: M, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &M {
        &self.inner
    }
}

#[async_trait]
impl<M: ChatModel> ChatModel for RetryingChatModel<M> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse> {
        let mut retry = 0;
        loop {
            match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && retry < self.policy.max_retries => {
                    let delay = self.policy.backoff(retry);
                    warn!(
                        provider = self.inner.name(),
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient backend failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::message::Message;
    use crate::mock::MockChatModel;

    fn request() -> ChatRequest {
        ChatRequest::new("test-model", vec![Message::user("hello")], 0.3)
    }

    fn unavailable() -> ModelError {
        ModelError::Api { provider: "mock".into(), status: 503, message: "overloaded".into() }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(350));
        assert_eq!(policy.backoff(40), Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_until_success() {
        let mock = MockChatModel::replying("Blue");
        mock.push_error(unavailable()).await;
        mock.push_error(unavailable()).await;

        let model = RetryingChatModel::new(mock, RetryPolicy::default());
        let response = model.complete(request()).await.unwrap();

        assert_eq!(response.content, "Blue");
        assert_eq!(model.inner().call_count().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let mock = MockChatModel::new();
        for _ in 0..5 {
            mock.push_error(unavailable()).await;
        }

        let model = RetryingChatModel::new(mock, RetryPolicy::default().with_max_retries(1));
        let err = model.complete(request()).await.unwrap_err();

        assert!(matches!(err, ModelError::Api { status: 503, .. }));
        assert_eq!(model.inner().call_count().await, 2);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let mock = MockChatModel::replying("unused");
        mock.push_error(ModelError::Api {
            provider: "mock".into(),
            status: 401,
            message: "invalid key".into(),
        })
        .await;

        let model = RetryingChatModel::new(mock, RetryPolicy::default());
        assert!(model.complete(request()).await.is_err());
        assert_eq!(model.inner().call_count().await, 1);
    }
}
