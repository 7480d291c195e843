//! Environment-sourced application settings.
//!
//! | variable | default |
//! |----------|---------|
//! | `OPENROUTER_API_KEY` / `OPENAI_API_KEY` | required (one of) |
//! | `DOCCHAT_CHUNK_SIZE` | 300 |
//! | `DOCCHAT_TOP_K` | 3 |
//! | `DOCCHAT_MODEL` | `mistralai/mistral-7b-instruct` |
//! | `DOCCHAT_TEMPERATURE` | 0.3 |
//! | `DOCCHAT_MAX_INPUT_TOKENS` | 256 |
//! | `DOCCHAT_HISTORY_LIMIT` | unbounded |
//! | `DOCCHAT_REQUEST_TIMEOUT_SECS` | 60 (`0` disables) |
//! | `DOCCHAT_MAX_RETRIES` | 2 |
//! | `DOCCHAT_BASE_URL` | provider default |

use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::config::{GenerationConfig, RagConfig};
use crate::error::{RagError, Result};

/// Which hosted API the credential belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// `https://openrouter.ai/api/v1`, selected by `OPENROUTER_API_KEY`.
    OpenRouter,
    /// `https://api.openai.com/v1`, selected by `OPENAI_API_KEY`.
    OpenAI,
}

/// Everything the application reads from its environment.
#[derive(Clone)]
pub struct Settings {
    /// Backend credential.
    pub api_key: String,
    /// The backend the credential belongs to.
    pub provider: Provider,
    /// Endpoint override for self-hosted or proxied backends.
    pub base_url: Option<String>,
    /// Retrieval settings.
    pub rag: RagConfig,
    /// Generation settings.
    pub generation: GenerationConfig,
    /// Retries for transient backend failures.
    pub max_retries: u32,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if neither `OPENROUTER_API_KEY` nor
    /// `OPENAI_API_KEY` is set, or if any option fails to parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let (api_key, provider) = if let Some(key) = non_empty("OPENROUTER_API_KEY") {
            (key, Provider::OpenRouter)
        } else if let Some(key) = non_empty("OPENAI_API_KEY") {
            (key, Provider::OpenAI)
        } else {
            return Err(RagError::ConfigError(
                "no API key found: set OPENROUTER_API_KEY (OpenRouter) or OPENAI_API_KEY"
                    .to_string(),
            ));
        };

        let defaults = RagConfig::default();
        let rag = RagConfig::builder()
            .chunk_size(parse(&lookup, "DOCCHAT_CHUNK_SIZE")?.unwrap_or(defaults.chunk_size))
            .top_k(parse(&lookup, "DOCCHAT_TOP_K")?.unwrap_or(defaults.top_k))
            .max_input_tokens(
                parse(&lookup, "DOCCHAT_MAX_INPUT_TOKENS")?.unwrap_or(defaults.max_input_tokens),
            )
            .history_limit(parse(&lookup, "DOCCHAT_HISTORY_LIMIT")?)
            .build()?;

        let mut generation = GenerationConfig::default();
        if let Some(model) = non_empty("DOCCHAT_MODEL") {
            generation.model = model;
        }
        if let Some(temperature) = parse::<f32, _>(&lookup, "DOCCHAT_TEMPERATURE")? {
            generation.temperature = temperature;
        }
        if let Some(secs) = parse::<u64, _>(&lookup, "DOCCHAT_REQUEST_TIMEOUT_SECS")? {
            generation.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        generation.validate()?;

        Ok(Self {
            api_key,
            provider,
            base_url: non_empty("DOCCHAT_BASE_URL"),
            rag,
            generation,
            max_retries: parse(&lookup, "DOCCHAT_MAX_RETRIES")?.unwrap_or(2),
        })
    }
}

fn parse<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| RagError::ConfigError(format!("invalid {name} ({raw:?}): {e}"))),
        _ => Ok(None),
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("rag", &self.rag)
            .field("generation", &self.generation)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
