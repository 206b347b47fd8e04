//! # Logging Bootstrap
//!
//! Installs the process-wide `tracing` subscriber for binaries. Library code
//! only emits events; it never installs a subscriber itself.

use thiserror::Error;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid log filter {filter:?}: {message}")]
    Filter { filter: String, message: String },

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInstalled(String),
}

/// Builds the filter: `RUST_LOG` when set and valid, else `level`.
pub fn env_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(level).map_err(|e| LoggerError::Filter {
            filter: level.to_string(),
            message: e.to_string(),
        })
    })
}

/// Console subscriber; `json = true` switches to one JSON object per line.
pub fn init_tracing(level: &str, json: bool) -> Result<(), LoggerError> {
    let filter = env_filter(level)?;

    let console_layer = if json {
        fmt::layer().with_target(true).json().boxed()
    } else {
        fmt::layer().with_target(false).compact().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init()
        .map_err(|e| LoggerError::AlreadyInstalled(e.to_string()))?;

    info!(level, json, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_levels() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(env_filter("lib_storebot=loud"), Err(LoggerError::Filter { .. })));
        }
        assert!(env_filter("debug").is_ok());
    }
}
