//! brainsync CLI binary
//!
//! Resolves configuration, wires logging observers onto the engine, and
//! runs either a one-shot activation or the resident watch loop.

use brainsync::cli::{Cli, Commands};
use brainsync::config::{ConfigLoader, SyncConfig};
use brainsync::engine::SyncEngine;
use brainsync::events::SyncEvent;
use brainsync::logging::init_logging;
use brainsync::watch::BrainWatcher;
use clap::Parser;
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(1);
    }

    info!(
        execution_brain = %config.execution_brain.display(),
        quality_brain = %config.quality_brain.display(),
        mode = ?config.reconcile_mode,
        "brainsync starting"
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {e}");
            process::exit(1);
        }
    };

    let mut engine = SyncEngine::new(config.clone());
    bind_event_logging(&mut engine);

    // Initial activation is fatal on terminal failure for both commands.
    if let Err(e) = runtime.block_on(engine.activate()) {
        error!(error = %e, "Activation failed");
        eprintln!("Activation failed: {e}");
        process::exit(1);
    }

    match cli.command {
        Commands::Activate => {
            info!("Activation complete");
        }
        Commands::Watch { debounce_ms } => {
            let mut watch_config = config;
            if let Some(ms) = debounce_ms {
                watch_config.watch_debounce_ms = ms;
            }

            let watcher = BrainWatcher::new(&watch_config);
            let result = watcher.run(|_changed| {
                let outcome = runtime.block_on(engine.activate());
                if outcome.is_err() {
                    // A fresh attempt sequence on the next change.
                    engine.reset_retries();
                }
                outcome
            });

            if let Err(e) = result {
                error!(error = %e, "Watch loop failed");
                eprintln!("Watch loop failed: {e}");
                process::exit(1);
            }
        }
    }
}

/// Resolve configuration: file + environment, then CLI flag overrides.
fn build_config(cli: &Cli) -> Result<SyncConfig, brainsync::error::SyncError> {
    let mut config = ConfigLoader::load(cli.config.as_deref())?;

    if let Some(path) = &cli.execution_brain {
        config.execution_brain = path.clone();
    }
    if let Some(path) = &cli.quality_brain {
        config.quality_brain = path.clone();
    }
    if let Some(path) = &cli.metrics_path {
        config.metrics_path = path.clone();
    }
    if let Some(mode) = cli.mode {
        config.reconcile_mode = mode;
    }
    if let Some(max_retries) = cli.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(retry_base_ms) = cli.retry_base_ms {
        config.retry_base_ms = retry_base_ms;
    }
    if cli.verbose {
        config.verbose = true;
    }
    if config.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }

    // CLI paths may be relative; resolve again after overrides.
    config.resolve()
}

/// Mirror engine notifications into the log, the binary's only consumer.
fn bind_event_logging(engine: &mut SyncEngine) {
    engine.subscribe(|event: &SyncEvent| match event {
        SyncEvent::ContextApplied { side, content } => {
            info!(side = %side, chars = content.len(), "Context applied");
        }
        SyncEvent::Activated => {
            info!("Activated");
        }
        SyncEvent::BrainUpdated { side, appended } => {
            info!(side = %side, appended = appended, "Brain updated");
        }
    });
}
