//! CLI parse: clap types for brainsync. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::reconcile::ReconcileMode;

/// brainsync - dual rule-file synchronization
#[derive(Parser)]
#[command(name = "brainsync")]
#[command(about = "Keeps execution and quality rule files synchronized for an assistant runtime")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Execution brain rule file
    #[arg(long)]
    pub execution_brain: Option<PathBuf>,

    /// Quality brain rule file
    #[arg(long)]
    pub quality_brain: Option<PathBuf>,

    /// Metrics artifact location
    #[arg(long)]
    pub metrics_path: Option<PathBuf>,

    /// Reconciliation policy (diagnostic or merge)
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<ReconcileMode>,

    /// Maximum retry attempts for a failed activation
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Linear backoff unit in milliseconds
    #[arg(long)]
    pub retry_base_ms: Option<u64>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one activation and exit
    Activate,
    /// Run an activation, then stay resident re-activating on rule-file changes
    Watch {
        /// Debounce window for change events, in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
}

fn parse_mode(s: &str) -> Result<ReconcileMode, String> {
    s.parse()
}
