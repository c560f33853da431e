//! Error types for the dual-brain synchronization engine.

use thiserror::Error;

/// Errors surfaced by the synchronization engine.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sync state validation failed: {0}")]
    Validation(String),

    #[error("Activation failed after {attempts} retries: {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<SyncError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// The underlying error for a terminal retry failure; `self` otherwise.
    pub fn root(&self) -> &SyncError {
        match self {
            SyncError::RetryExhausted { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        SyncError::Config(err.to_string())
    }
}
