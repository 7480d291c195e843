//! OpenAI-compatible chat-completions client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::config::OpenAIConfig;
use crate::error::{ModelError, Result};
use crate::message::Message;
use crate::model::{ChatModel, ChatRequest, ChatResponse};

/// A [`ChatModel`] that calls `POST {base_url}/chat/completions` with `reqwest`.
///
/// Streaming is not used: the session needs the whole answer before it can
/// commit the turn.
pub struct OpenAICompatClient {
    client: reqwest::Client,
    config: OpenAIConfig,
    endpoint: String,
}

impl OpenAICompatClient {
    /// Create a client from the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] if the API key is empty or the HTTP
    /// client cannot be constructed.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::Config(format!(
                "{} API key must not be empty",
                config.provider
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ModelError::Config(format!("failed to build HTTP client: {e}")))?;

        let endpoint = config.completions_url();
        Ok(Self { client, config, endpoint })
    }

    /// The settings this client was built with.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── ChatModel implementation ───────────────────────────────────────

#[async_trait]
impl ChatModel for OpenAICompatClient {
    fn name(&self) -> &str {
        &self.config.provider
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse> {
        let provider = self.config.provider.as_str();
        debug!(
            provider,
            model = %request.model,
            message_count = request.messages.len(),
            "sending chat completion"
        );

        let body = CompletionRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
        };

        let mut http =
            self.client.post(&self.endpoint).bearer_auth(&self.config.api_key).json(&body);
        if let Some(referer) = &self.config.referer {
            http = http.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.config.title {
            http = http.header("X-Title", title);
        }

        let response = http.send().await.map_err(|e| {
            error!(provider, error = %e, "request failed");
            if e.is_timeout() {
                ModelError::Timeout {
                    provider: provider.into(),
                    elapsed: self.config.request_timeout.unwrap_or_default(),
                }
            } else {
                ModelError::Transport { provider: provider.into(), message: e.to_string() }
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider, %status, "API error");
            return Err(ModelError::Api {
                provider: provider.into(),
                status: status.as_u16(),
                message: detail,
            });
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            error!(provider, error = %e, "failed to parse response");
            ModelError::Parse { provider: provider.into(), message: e.to_string() }
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ModelError::EmptyResponse { provider: provider.into() })?;

        Ok(ChatResponse { content })
    }
}
