//! Bidirectional reconciliation between the two brains
//!
//! One pass computes both directional change sets. What happens next is a
//! policy decision owned by the caller: diagnostic mode records the
//! differences and leaves both files untouched (operator-authored content
//! stays ground truth), merge mode appends each side's unique lines to
//! the counterpart file.
//!
//! Diagnostic is the safe default. Merging feeds each side's novelty into
//! the other, so the next pass re-detects the appended lines as new
//! novelty; without extra guard logic that loop grows content without
//! bound.

use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::brain::BrainSource;
use crate::diff::{diff, ChangeSet, Direction};
use crate::error::SyncError;
use crate::events::{SyncEvent, SyncNotifier};
use crate::metrics::MetricsSink;

/// Reconciliation policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileMode {
    /// Record differences; never write to either brain file.
    #[default]
    Diagnostic,
    /// Append each side's unique lines to the counterpart file.
    Merge,
}

impl FromStr for ReconcileMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diagnostic" => Ok(ReconcileMode::Diagnostic),
            "merge" => Ok(ReconcileMode::Merge),
            other => Err(format!(
                "unknown reconcile mode '{other}' (expected 'diagnostic' or 'merge')"
            )),
        }
    }
}

/// Sizes of the two directional change sets from one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub execution_unique: usize,
    pub quality_unique: usize,
}

/// Diff both brains against each other and apply the selected policy.
///
/// Emits exactly one `bidirectional_sync` metric per pass. In merge mode
/// each mutated side additionally gets a `BrainUpdated` notification with
/// the count of appended lines.
pub async fn reconcile(
    execution: &BrainSource,
    quality: &BrainSource,
    execution_content: &str,
    quality_content: &str,
    mode: ReconcileMode,
    notifier: &SyncNotifier,
    metrics: &MetricsSink,
) -> Result<ReconcileReport, SyncError> {
    let start = Instant::now();

    let execution_changes = diff(
        execution_content,
        quality_content,
        Direction::ExecutionToQuality,
    );
    let quality_changes = diff(
        quality_content,
        execution_content,
        Direction::QualityToExecution,
    );

    let report = ReconcileReport {
        execution_unique: execution_changes.len(),
        quality_unique: quality_changes.len(),
    };

    match mode {
        ReconcileMode::Diagnostic => {
            debug!(
                execution_unique = report.execution_unique,
                quality_unique = report.quality_unique,
                "Reconciliation pass (diagnostic)"
            );
        }
        ReconcileMode::Merge => {
            if !execution_changes.is_empty() {
                append_lines(quality.path(), quality_content, &execution_changes).await?;
                notifier.emit(SyncEvent::BrainUpdated {
                    side: quality.side(),
                    appended: execution_changes.len(),
                });
            }
            if !quality_changes.is_empty() {
                append_lines(execution.path(), execution_content, &quality_changes).await?;
                notifier.emit(SyncEvent::BrainUpdated {
                    side: execution.side(),
                    appended: quality_changes.len(),
                });
            }
            info!(
                execution_unique = report.execution_unique,
                quality_unique = report.quality_unique,
                "Reconciliation pass (merge)"
            );
        }
    }

    metrics
        .append(
            "bidirectional_sync",
            json!({
                "duration_ms": start.elapsed().as_millis() as u64,
                "execution_changes": report.execution_unique,
                "quality_changes": report.quality_unique,
            }),
        )
        .await;

    Ok(report)
}

/// Append the change set's lines to `target`.
///
/// Writes the full merged content to a staging file and atomically
/// renames it over the target.
async fn append_lines(
    target: &Path,
    target_content: &str,
    changes: &ChangeSet,
) -> Result<(), SyncError> {
    let mut merged = target_content.to_string();
    if !merged.is_empty() && !merged.ends_with('\n') {
        merged.push('\n');
    }
    for line in &changes.lines {
        merged.push_str(line);
        merged.push('\n');
    }

    let staging = staging_path(target);
    tokio::fs::write(&staging, merged.as_bytes()).await?;
    tokio::fs::rename(&staging, target).await?;

    debug!(
        target = %target.display(),
        direction = %changes.direction,
        appended = changes.len(),
        "Appended unique lines"
    );
    Ok(())
}

fn staging_path(target: &Path) -> std::path::PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".sync.tmp");
    target.with_file_name(name)
}
