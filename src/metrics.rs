//! Persisted operation metrics
//!
//! Every engine operation appends one record to a JSON-array artifact on
//! disk. Appends are best-effort: a failure to persist must never abort
//! the operation being measured, so write errors are routed to an
//! optional diagnostic callback and a warning log instead of the caller.
//!
//! The read-modify-write cycle assumes a single writer. Concurrent
//! activations must be serialized by the caller or records may be lost.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::SyncError;

/// One persisted operation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRecord {
    pub ts: String,
    pub key: String,
    pub data: Value,
}

/// Callback invoked when a metrics write fails.
pub type DiagnosticFn = Arc<dyn Fn(&SyncError) + Send + Sync>;

/// Append-only sink over a single JSON-array artifact.
#[derive(Clone)]
pub struct MetricsSink {
    path: PathBuf,
    diagnostics: Option<DiagnosticFn>,
}

impl MetricsSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            diagnostics: None,
        }
    }

    /// Route persistence failures to `callback` in addition to the log.
    pub fn with_diagnostics(mut self, callback: DiagnosticFn) -> Self {
        self.diagnostics = Some(callback);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, swallowing persistence failures.
    pub async fn append(&self, key: &str, data: Value) {
        if let Err(err) = self.try_append(key, data).await {
            warn!(key = %key, error = %err, "Failed to persist metric record");
            if let Some(diagnostics) = &self.diagnostics {
                diagnostics(&err);
            }
        }
    }

    async fn try_append(&self, key: &str, data: Value) -> Result<(), SyncError> {
        let mut records = self.read_history().await;
        records.push(MetricRecord {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            key: key.to_string(),
            data,
        });
        let serialized = serde_json::to_vec_pretty(&records)
            .map_err(|e| SyncError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        tokio::fs::write(&self.path, serialized).await?;
        Ok(())
    }

    /// Read the persisted history. Missing or corrupt artifacts are an
    /// empty history, never an error.
    pub async fn read_history(&self) -> Vec<MetricRecord> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }
}
