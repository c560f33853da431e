//! Logging system
//!
//! Structured logging via the `tracing` crate. The filter is taken from
//! the `BRAINSYNC_LOG` environment variable when set, otherwise from the
//! configured level.

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::SyncError;

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text
    #[serde(default = "default_format")]
    pub format: String,

    /// Enable colored output (text format only)
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            color: default_true(),
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Must be called once, before the engine emits any diagnostics.
pub fn init_logging(config: &LoggingConfig) -> Result<(), SyncError> {
    let filter = build_env_filter(config)?;
    let format = validated_format(config)?;

    let base_subscriber = Registry::default().with(filter);

    if format == "json" {
        base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.color)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, SyncError> {
    if let Ok(filter) = EnvFilter::try_from_env("BRAINSYNC_LOG") {
        return Ok(filter);
    }

    match config.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" | "off" => {
            Ok(EnvFilter::new(config.level.as_str()))
        }
        other => Err(SyncError::Config(format!(
            "Invalid log level: {other} (must be trace, debug, info, warn, error, or off)"
        ))),
    }
}

fn validated_format(config: &LoggingConfig) -> Result<&str, SyncError> {
    match config.format.as_str() {
        "json" | "text" => Ok(config.format.as_str()),
        other => Err(SyncError::Config(format!(
            "Invalid log format: {other} (must be 'json' or 'text')"
        ))),
    }
}
