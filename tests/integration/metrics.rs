//! Integration tests for metrics persistence

use brainsync::config::SyncConfig;
use brainsync::engine::SyncEngine;
use brainsync::error::SyncError;
use brainsync::metrics::MetricsSink;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn records_survive_a_corrupt_prior_artifact() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memory-sync-metrics.json");
    std::fs::write(&path, "]]]garbage").unwrap();

    let sink = MetricsSink::new(&path);
    for i in 0..5 {
        sink.append("activate", json!({ "attempt": i })).await;
    }

    let history = sink.read_history().await;
    assert_eq!(history.len(), 5);
    for (i, record) in history.iter().enumerate() {
        assert_eq!(record.data["attempt"], i);
    }
}

#[tokio::test]
async fn artifact_is_a_json_array_of_ts_key_data_elements() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memory-sync-metrics.json");

    let sink = MetricsSink::new(&path);
    sink.append("activate", json!({ "ok": true })).await;

    let raw = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let array = parsed.as_array().unwrap();
    assert_eq!(array.len(), 1);
    assert!(array[0]["ts"].is_string());
    assert_eq!(array[0]["key"], "activate");
    assert_eq!(array[0]["data"]["ok"], true);
}

#[tokio::test]
async fn timestamps_are_monotonic_across_operations() {
    let dir = TempDir::new().unwrap();
    let sink = MetricsSink::new(dir.path().join("metrics.json"));

    for _ in 0..10 {
        sink.append("activate", json!({})).await;
    }

    let history = sink.read_history().await;
    assert_eq!(history.len(), 10);
    for pair in history.windows(2) {
        assert!(pair[0].ts <= pair[1].ts);
    }
}

#[tokio::test]
async fn unwritable_metrics_never_abort_an_activation() {
    let dir = TempDir::new().unwrap();
    let config = SyncConfig {
        execution_brain: dir.path().join("memory-rules.mdc"),
        quality_brain: dir.path().join("memory-rating.mdc"),
        // A directory at the artifact path makes every metrics write fail.
        metrics_path: dir.path().join("metrics-dir"),
        ..Default::default()
    };
    std::fs::write(&config.execution_brain, "A\n").unwrap();
    std::fs::write(&config.quality_brain, "A\n").unwrap();
    std::fs::create_dir(&config.metrics_path).unwrap();

    let failures = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&failures);
    let mut engine = SyncEngine::new(config).with_metrics_diagnostics(Arc::new(
        move |_err: &SyncError| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    ));

    // Activation succeeds even though every metric write failed.
    engine.activate().await.unwrap();

    // One failed write per stage plus the activation aggregate.
    assert_eq!(failures.load(Ordering::SeqCst), 5);
}
