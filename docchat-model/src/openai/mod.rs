//! OpenAI chat-completions backend.
//!
//! Works against the OpenAI API and any service exposing the same
//! `/chat/completions` contract, OpenRouter in particular.
//!
//! # Example
//!
//! ```rust,ignore
//! use docchat_model::openai::{OpenAICompatClient, OpenAIConfig};
//!
//! // OpenRouter
//! let client = OpenAICompatClient::new(OpenAIConfig::openrouter(
//!     std::env::var("OPENROUTER_API_KEY").unwrap(),
//! ))?;
//!
//! // Self-hosted vLLM
//! let local = OpenAICompatClient::new(
//!     OpenAIConfig::compatible("unused", "http://localhost:8000/v1")
//!         .with_timeout(std::time::Duration::from_secs(30)),
//! )?;
//! ```

mod client;
mod config;

pub use client::OpenAICompatClient;
pub use config::{OPENAI_API_BASE, OPENROUTER_API_BASE, OpenAIConfig};
