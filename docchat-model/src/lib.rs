//! # docchat-model
//!
//! Chat-completion backends for docchat.
//!
//! ## Overview
//!
//! The RAG core treats generation as a black box: a [`ChatRequest`] (model
//! identifier, ordered messages, temperature) goes in, a [`ChatResponse`]
//! comes out. Any type implementing [`ChatModel`] can serve as the backend.
//!
//! - [`OpenAICompatClient`] - OpenAI and OpenAI-compatible APIs (OpenRouter, vLLM, etc.)
//! - [`RetryingChatModel`] - bounded retry with exponential backoff for transient failures
//! - [`MockChatModel`] - scripted backend for tests and offline runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docchat_model::openai::{OpenAICompatClient, OpenAIConfig};
//! use docchat_model::{ChatModel, ChatRequest, Message};
//!
//! let client = OpenAICompatClient::new(OpenAIConfig::openrouter(
//!     std::env::var("OPENROUTER_API_KEY").unwrap(),
//! ))?;
//! let response = client
//!     .complete(ChatRequest::new(
//!         "mistralai/mistral-7b-instruct",
//!         vec![Message::system("You are a helpful assistant."), Message::user("Hi")],
//!         0.3,
//!     ))
//!     .await?;
//! ```

pub mod error;
pub mod message;
pub mod mock;
pub mod model;
#[cfg(feature = "openai")]
pub mod openai;
pub mod retry;

pub use error::{ModelError, Result};
pub use message::{Message, Role};
pub use mock::MockChatModel;
pub use model::{ChatModel, ChatRequest, ChatResponse};
#[cfg(feature = "openai")]
pub use openai::{OpenAICompatClient, OpenAIConfig};
pub use retry::{RetryPolicy, RetryingChatModel};
