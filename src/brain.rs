//! Brain sources and the load-then-compare path
//!
//! A brain source pairs a rule file with the fingerprint recorded at its
//! last successful load. Loading re-reads the file, fingerprints it, and
//! applies the content only when the fingerprint changed, which keeps the
//! steady-state path (byte-identical content) free of downstream
//! context-rebuild work.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::json;
use tracing::{debug, info};

use crate::error::SyncError;
use crate::events::{BrainSide, SyncEvent, SyncNotifier};
use crate::fingerprint::Fingerprint;
use crate::metrics::MetricsSink;

/// One of the two synchronized rule files.
#[derive(Debug, Clone)]
pub struct BrainSource {
    side: BrainSide,
    path: PathBuf,
    last_fingerprint: Option<Fingerprint>,
}

/// Result of one load invocation.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// Whether the content changed and was applied.
    pub applied: bool,
    pub fingerprint: Fingerprint,
    /// Raw content, so the reconciler works on freshly loaded text
    /// without a second read.
    pub content: String,
}

impl BrainSource {
    pub fn new(side: BrainSide, path: impl Into<PathBuf>) -> Self {
        Self {
            side,
            path: path.into(),
            last_fingerprint: None,
        }
    }

    pub fn side(&self) -> BrainSide {
        self.side
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fingerprint recorded at the last successful load, if any.
    pub fn last_fingerprint(&self) -> Option<Fingerprint> {
        self.last_fingerprint
    }

    /// Read the file, fingerprint it, and apply the content if changed.
    ///
    /// Unreadable files fail with [`SyncError::Io`] and record nothing.
    /// Every successful invocation emits exactly one metric record; the
    /// context-applied notification fires only when content changed.
    pub async fn load(
        &mut self,
        notifier: &SyncNotifier,
        metrics: &MetricsSink,
    ) -> Result<LoadOutcome, SyncError> {
        let start = Instant::now();
        let content = tokio::fs::read_to_string(&self.path).await?;
        let fingerprint = Fingerprint::of(&content);

        let applied = self.last_fingerprint != Some(fingerprint);
        if applied {
            self.last_fingerprint = Some(fingerprint);
            notifier.emit(SyncEvent::ContextApplied {
                side: self.side,
                content: content.clone(),
            });
            info!(side = %self.side, fingerprint = %fingerprint, "Brain content applied");
        } else {
            debug!(side = %self.side, "Brain unchanged, load skipped");
        }

        metrics
            .append(
                self.metric_key(),
                json!({
                    "duration_ms": start.elapsed().as_millis() as u64,
                    "fingerprint": fingerprint.to_hex(),
                    "applied": applied,
                }),
            )
            .await;

        Ok(LoadOutcome {
            applied,
            fingerprint,
            content,
        })
    }

    fn metric_key(&self) -> &'static str {
        match self.side {
            BrainSide::Execution => "load_execution_brain",
            BrainSide::Quality => "load_quality_brain",
        }
    }
}
