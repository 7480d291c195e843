//! # docchat-telemetry
//!
//! Logging setup for docchat binaries.
//!
//! [`init_telemetry`] installs a global `tracing` subscriber writing to
//! stderr, as human-readable text or as one JSON object per line. The
//! filter comes from `RUST_LOG` and defaults to `info`.
//!
//! [`init_with_storage`] additionally installs a [`TraceCaptureLayer`] that
//! keeps every closed span carrying a `session.id` in a
//! [`SharedTraceStorage`], so a front end can show what happened during a
//! given session.
//!
//! ```rust,ignore
//! use docchat_telemetry::{LogFormat, init_telemetry};
//!
//! init_telemetry(LogFormat::Json)?;
//! tracing::info!(session.id = "abc", "ready");
//! ```

pub mod memory;

#[cfg(test)]
mod test_capture;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

pub use memory::{SESSION_ID_FIELD, SharedTraceStorage, SpanRecord, TraceCaptureLayer};

const DEFAULT_FILTER: &str = "info";

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line records.
    #[default]
    Text,
    /// One JSON object per record, including the current span's fields.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}' (expected 'text' or 'json')")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => f.write_str("text"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn fmt_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Text => {
            tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr).boxed()
        }
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .boxed(),
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already set.
pub fn init_telemetry(format: LogFormat) -> Result<(), TryInitError> {
    tracing_subscriber::registry().with(env_filter()).with(fmt_layer(format)).try_init()
}

/// Install the global subscriber plus span capture into `storage`.
///
/// # Errors
///
/// Fails if a global subscriber is already set.
pub fn init_with_storage(
    format: LogFormat,
    storage: Arc<SharedTraceStorage>,
) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer(format))
        .with(TraceCaptureLayer::new(storage))
        .try_init()
}
