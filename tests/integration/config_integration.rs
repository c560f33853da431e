//! Integration tests for configuration loading

use brainsync::config::{ConfigLoader, SyncConfig};
use brainsync::reconcile::ReconcileMode;
use std::sync::Mutex;
use tempfile::TempDir;

// Serialize access to process environment variables across tests.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn file_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    let config_file = dir.path().join("brainsync.toml");
    std::fs::write(
        &config_file,
        r#"
execution_brain = "./exec.mdc"
quality_brain = "./qual.mdc"
metrics_path = "./metrics.json"
sync_enabled = false
max_retries = 9

[logging]
level = "warn"
format = "json"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(!config.sync_enabled);
    assert_eq!(config.max_retries, 9);
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.format, "json");
}

#[test]
fn environment_overrides_apply() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    std::env::set_var("BRAINSYNC_MAX_RETRIES", "7");
    std::env::set_var("BRAINSYNC_RETRY_BASE_MS", "25");
    std::env::set_var("BRAINSYNC_RECONCILE_MODE", "merge");

    let result = ConfigLoader::load(None);

    std::env::remove_var("BRAINSYNC_MAX_RETRIES");
    std::env::remove_var("BRAINSYNC_RETRY_BASE_MS");
    std::env::remove_var("BRAINSYNC_RECONCILE_MODE");

    let config = result.unwrap();
    assert_eq!(config.max_retries, 7);
    assert_eq!(config.retry_base_ms, 25);
    assert_eq!(config.reconcile_mode, ReconcileMode::Merge);
}

#[test]
fn environment_can_disable_sync() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    std::env::set_var("BRAINSYNC_SYNC_ENABLED", "false");
    let result = ConfigLoader::load(None);
    std::env::remove_var("BRAINSYNC_SYNC_ENABLED");

    let config = result.unwrap();
    assert!(!config.sync_enabled);
    assert!(config.auto_activation);
}

#[test]
fn loaded_paths_are_absolute() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    let config = ConfigLoader::load(None).unwrap();
    assert!(config.execution_brain.is_absolute());
    assert!(config.quality_brain.is_absolute());
    assert!(config.metrics_path.is_absolute());
    assert!(config.execution_brain.ends_with("memory-rules.mdc"));
    assert!(config.quality_brain.ends_with("memory-rating.mdc"));
}

#[test]
fn default_config_round_trips_through_resolve() {
    let config = SyncConfig::default().resolve().unwrap();
    let again = config.clone().resolve().unwrap();
    assert_eq!(config.execution_brain, again.execution_brain);
    assert_eq!(config.metrics_path, again.metrics_path);
}
