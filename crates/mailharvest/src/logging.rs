//! Process-wide log setup for embedding applications.
//!
//! The pipeline emits `tracing` events and the IMAP client uses `log`
//! macros; both end up in the same subscriber.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Installs the global subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Only the first call succeeds; later calls return
/// [`LoggingError::AlreadyInitialized`] and leave the existing setup alone.
pub fn init(default_filter: &str, format: LogFormat) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|source| {
            LoggingError::InvalidFilter {
                filter: default_filter.to_string(),
                source,
            }
        })?,
    };

    let (pretty, json) = match format {
        LogFormat::Pretty => (Some(fmt::layer().with_target(true)), None),
        LogFormat::Json => (None, Some(fmt::layer().json().with_current_span(true))),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
    tracing_log::LogTracer::init().map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(())
}
