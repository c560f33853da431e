//! Configuration system
//!
//! Configuration is resolved once, before the engine is constructed.
//! Precedence, lowest to highest: built-in defaults, an optional
//! `brainsync.toml` file, `BRAINSYNC_*` environment variables, CLI flags
//! (applied by the binary). All path fields are resolved to absolute
//! locations before first use.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::logging::LoggingConfig;
use crate::reconcile::ReconcileMode;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Execution brain rule file.
    #[serde(default = "default_execution_brain")]
    pub execution_brain: PathBuf,

    /// Quality brain rule file.
    #[serde(default = "default_quality_brain")]
    pub quality_brain: PathBuf,

    /// Master kill switch; when false, activation is a silent no-op.
    #[serde(default = "default_true")]
    pub sync_enabled: bool,

    /// Auto-activation gate; when false, activation is a silent no-op.
    #[serde(default = "default_true")]
    pub auto_activation: bool,

    /// Maximum retry attempts for a failed activation.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Linear backoff unit in milliseconds.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// Metrics artifact location.
    #[serde(default = "default_metrics_path")]
    pub metrics_path: PathBuf,

    /// Reconciliation policy.
    #[serde(default)]
    pub reconcile_mode: ReconcileMode,

    /// Verbose console output.
    #[serde(default)]
    pub verbose: bool,

    /// Debounce window for the file watcher, in milliseconds.
    #[serde(default = "default_watch_debounce_ms")]
    pub watch_debounce_ms: u64,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_execution_brain() -> PathBuf {
    PathBuf::from("./memory-rules.mdc")
}

fn default_quality_brain() -> PathBuf {
    PathBuf::from("./memory-rating.mdc")
}

fn default_metrics_path() -> PathBuf {
    PathBuf::from("./memory-sync-metrics.json")
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_ms() -> u64 {
    150
}

fn default_watch_debounce_ms() -> u64 {
    1000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            execution_brain: default_execution_brain(),
            quality_brain: default_quality_brain(),
            sync_enabled: true,
            auto_activation: true,
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            metrics_path: default_metrics_path(),
            reconcile_mode: ReconcileMode::default(),
            verbose: false,
            watch_debounce_ms: default_watch_debounce_ms(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Absolutize all path fields against the process working directory.
    ///
    /// Relative locators resolve against the invoking process's CWD;
    /// already-absolute paths pass through unchanged.
    pub fn resolve(mut self) -> Result<Self, SyncError> {
        let cwd = std::env::current_dir()?;
        self.execution_brain = absolutize(&cwd, self.execution_brain);
        self.quality_brain = absolutize(&cwd, self.quality_brain);
        self.metrics_path = absolutize(&cwd, self.metrics_path);
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), SyncError> {
        if self.execution_brain.as_os_str().is_empty() {
            return Err(SyncError::Config(
                "execution brain path cannot be empty".to_string(),
            ));
        }
        if self.quality_brain.as_os_str().is_empty() {
            return Err(SyncError::Config(
                "quality brain path cannot be empty".to_string(),
            ));
        }
        if self.execution_brain == self.quality_brain {
            return Err(SyncError::Config(
                "execution and quality brains must be distinct files".to_string(),
            ));
        }
        if self.metrics_path.as_os_str().is_empty() {
            return Err(SyncError::Config(
                "metrics path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn absolutize(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

/// Loads configuration from files and environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load with the full precedence chain. `config_file` forces a
    /// specific file (which must exist); otherwise `brainsync.toml` in
    /// the working directory is used when present.
    pub fn load(config_file: Option<&Path>) -> Result<SyncConfig, SyncError> {
        let mut builder = Config::builder();

        match config_file {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()).required(true));
            }
            None => {
                builder = builder.add_source(File::with_name("brainsync").required(false));
            }
        }

        builder = builder.add_source(Environment::with_prefix("BRAINSYNC").try_parsing(true));

        let config: SyncConfig = builder.build()?.try_deserialize()?;
        config.resolve()
    }

    /// Load from a specific file only, without environment overrides.
    pub fn load_from_file(path: &Path) -> Result<SyncConfig, SyncError> {
        let config: SyncConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(true))
            .build()?
            .try_deserialize()?;
        config.resolve()
    }
}
