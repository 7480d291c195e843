//! Error types for the `docchat-model` crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to a generation backend.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The client could not be configured (missing key, bad base URL, ...).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request never produced an HTTP response (DNS, TLS, connection reset).
    #[error("Request to {provider} failed: {message}")]
    Transport {
        /// The backend that was being called.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The backend answered with a non-success status.
    #[error("{provider} returned {status}: {message}")]
    Api {
        /// The backend that produced the error.
        provider: String,
        /// The HTTP status code.
        status: u16,
        /// The error detail reported by the backend.
        message: String,
    },

    /// The call did not complete before its deadline.
    #[error("{provider} did not respond within {elapsed:?}")]
    Timeout {
        /// The backend that was being called.
        provider: String,
        /// The deadline that expired.
        elapsed: Duration,
    },

    /// The response body could not be decoded.
    #[error("Failed to parse {provider} response: {message}")]
    Parse {
        /// The backend that produced the response.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The response contained no completion choices.
    #[error("{provider} returned no completion")]
    EmptyResponse {
        /// The backend that produced the response.
        provider: String,
    },
}

impl ModelError {
    /// Whether retrying the same request might succeed.
    ///
    /// Transport failures, timeouts, rate limiting (429) and server-side
    /// errors (5xx) are transient. Authentication and validation failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Config(_) | Self::Parse { .. } | Self::EmptyResponse { .. } => false,
        }
    }
}

/// A convenience result type for backend operations.
pub type Result<T> = std::result::Result<T, ModelError>;
