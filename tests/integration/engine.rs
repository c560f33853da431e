//! Integration tests for the activation sequence

use brainsync::config::SyncConfig;
use brainsync::engine::SyncEngine;
use brainsync::events::{BrainSide, SyncEvent};
use brainsync::metrics::MetricsSink;
use brainsync::reconcile::ReconcileMode;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn config_in(dir: &TempDir) -> SyncConfig {
    SyncConfig {
        execution_brain: dir.path().join("memory-rules.mdc"),
        quality_brain: dir.path().join("memory-rating.mdc"),
        metrics_path: dir.path().join("memory-sync-metrics.json"),
        ..Default::default()
    }
}

fn write_brains(config: &SyncConfig, exec: &str, qual: &str) {
    std::fs::write(&config.execution_brain, exec).unwrap();
    std::fs::write(&config.quality_brain, qual).unwrap();
}

#[tokio::test]
async fn activation_records_the_full_metric_sequence() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_brains(&config, "A\nB\n", "B\nC\n");
    let metrics = MetricsSink::new(&config.metrics_path);

    let mut engine = SyncEngine::new(config);
    engine.activate().await.unwrap();

    let history = metrics.read_history().await;
    let keys: Vec<&str> = history.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "load_execution_brain",
            "load_quality_brain",
            "bidirectional_sync",
            "validate_sync_state",
            "activate",
        ]
    );

    let sync_record = &history[2];
    assert_eq!(sync_record.data["execution_changes"], 1);
    assert_eq!(sync_record.data["quality_changes"], 1);

    let activate_record = &history[4];
    assert_eq!(activate_record.data["ok"], true);
}

#[tokio::test]
async fn activation_emits_context_events_then_activated() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_brains(&config, "A\n", "B\n");

    let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen = Arc::clone(&events);
    let mut engine = SyncEngine::new(config);
    engine.subscribe(move |event: &SyncEvent| {
        let tag = match event {
            SyncEvent::ContextApplied { side, .. } => format!("applied:{side}"),
            SyncEvent::Activated => "activated".to_string(),
            SyncEvent::BrainUpdated { side, .. } => format!("updated:{side}"),
        };
        seen.lock().push(tag);
    });

    engine.activate().await.unwrap();
    assert_eq!(
        *events.lock(),
        vec!["applied:execution", "applied:quality", "activated"]
    );
}

#[tokio::test]
async fn second_activation_with_unchanged_files_skips_both_loads() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_brains(&config, "X\n", "X\n");
    let metrics = MetricsSink::new(&config.metrics_path);

    let mut engine = SyncEngine::new(config);
    engine.activate().await.unwrap();
    engine.activate().await.unwrap();

    let history = metrics.read_history().await;
    assert_eq!(history.len(), 10);

    // First pass applies both brains; identical content means both
    // directional diffs are empty.
    assert_eq!(history[0].data["applied"], true);
    assert_eq!(history[1].data["applied"], true);
    assert_eq!(history[2].data["execution_changes"], 0);
    assert_eq!(history[2].data["quality_changes"], 0);

    // Second pass is the cheap no-op path.
    assert_eq!(history[5].data["applied"], false);
    assert_eq!(history[6].data["applied"], false);
}

#[tokio::test]
async fn diagnostic_mode_does_not_oscillate() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_brains(&config, "A\nB\n", "B\nC\n");
    let metrics = MetricsSink::new(&config.metrics_path);

    let mut engine = SyncEngine::new(config);
    engine.activate().await.unwrap();
    engine.activate().await.unwrap();

    let history = metrics.read_history().await;
    let sync_records: Vec<_> = history
        .iter()
        .filter(|r| r.key == "bidirectional_sync")
        .collect();
    assert_eq!(sync_records.len(), 2);
    assert_eq!(
        sync_records[0].data["execution_changes"],
        sync_records[1].data["execution_changes"]
    );
    assert_eq!(
        sync_records[0].data["quality_changes"],
        sync_records[1].data["quality_changes"]
    );

    // Diagnostic mode never touches the files.
    assert_eq!(
        std::fs::read_to_string(engine.config().execution_brain.clone()).unwrap(),
        "A\nB\n"
    );
    assert_eq!(
        std::fs::read_to_string(engine.config().quality_brain.clone()).unwrap(),
        "B\nC\n"
    );
}

#[tokio::test]
async fn merge_mode_converges_to_the_union() {
    let dir = TempDir::new().unwrap();
    let config = SyncConfig {
        reconcile_mode: ReconcileMode::Merge,
        ..config_in(&dir)
    };
    write_brains(&config, "A\nB\n", "B\nC\n");
    let metrics = MetricsSink::new(&config.metrics_path);

    let updates = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen = Arc::clone(&updates);
    let mut engine = SyncEngine::new(config);
    engine.subscribe(move |event: &SyncEvent| {
        if let SyncEvent::BrainUpdated { side, appended } = event {
            seen.lock().push((*side, *appended));
        }
    });

    engine.activate().await.unwrap();
    assert_eq!(
        *updates.lock(),
        vec![(BrainSide::Quality, 1), (BrainSide::Execution, 1)]
    );

    // Both files now hold the same line set, so a second pass finds no
    // differences and appends nothing.
    engine.activate().await.unwrap();

    let history = metrics.read_history().await;
    let sync_records: Vec<_> = history
        .iter()
        .filter(|r| r.key == "bidirectional_sync")
        .collect();
    assert_eq!(sync_records[1].data["execution_changes"], 0);
    assert_eq!(sync_records[1].data["quality_changes"], 0);
    assert_eq!(updates.lock().len(), 2);
}

#[tokio::test]
async fn missing_quality_brain_fails_after_loading_execution() {
    let dir = TempDir::new().unwrap();
    let config = SyncConfig {
        max_retries: 0,
        ..config_in(&dir)
    };
    std::fs::write(&config.execution_brain, "A\n").unwrap();
    let metrics = MetricsSink::new(&config.metrics_path);

    let mut engine = SyncEngine::new(config);
    assert!(engine.activate().await.is_err());

    // Execution loaded and recorded its metric before the quality load
    // failed; the failure itself is attributed in the activate record.
    let history = metrics.read_history().await;
    let keys: Vec<&str> = history.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["load_execution_brain", "activate"]);
    assert_eq!(history[1].data["ok"], false);
    assert!(history[1].data["error"]
        .as_str()
        .unwrap()
        .contains("I/O error"));
}

#[tokio::test]
async fn changed_file_between_activations_reapplies_only_that_side() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_brains(&config, "A\n", "A\n");
    let metrics = MetricsSink::new(&config.metrics_path);
    let exec_path: PathBuf = config.execution_brain.clone();

    let mut engine = SyncEngine::new(config);
    engine.activate().await.unwrap();

    std::fs::write(&exec_path, "A\nB\n").unwrap();
    engine.activate().await.unwrap();

    let history = metrics.read_history().await;
    // Second activation: execution re-applied, quality skipped.
    assert_eq!(history[5].key, "load_execution_brain");
    assert_eq!(history[5].data["applied"], true);
    assert_eq!(history[6].key, "load_quality_brain");
    assert_eq!(history[6].data["applied"], false);
}
