//! Sync orchestrator
//!
//! The externally invoked entry point. One activation sequences
//! load -> reconcile -> validate over both brains, records metrics after
//! each stage and around the whole activation, and retries with linear
//! backoff on failure. A retried activation restarts from the top; there
//! is no step-resume.
//!
//! Concurrent activations are not mutually excluded here. Callers must
//! serialize them per engine instance (`activate` taking `&mut self`
//! makes interleaving unrepresentable within safe code).

use std::time::Instant;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::backoff::{backoff_delay, Delay, TokioDelay};
use crate::brain::BrainSource;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::events::{BrainSide, SyncEvent, SyncNotifier, SyncSubscriber};
use crate::metrics::{DiagnosticFn, MetricsSink};
use crate::reconcile::{reconcile, ReconcileReport};

/// Context markers that warrant an activation.
const ACTIVATION_TRIGGERS: &[&str] = &[
    "conversation_start",
    "user_request",
    "code_change",
    "topic_change",
    "memory_operation",
    "mcp_interaction",
    "quality_gate",
    "performance_check",
];

/// Post-condition checks asserted after reconciliation.
#[derive(Debug, Clone, Copy, Serialize)]
struct ValidationChecks {
    execution_loaded: bool,
    quality_loaded: bool,
    sync_completed: bool,
    performance_ok: bool,
}

impl ValidationChecks {
    fn all_valid(&self) -> bool {
        self.execution_loaded && self.quality_loaded && self.sync_completed && self.performance_ok
    }

    fn failing(&self) -> Vec<&'static str> {
        let mut failing = Vec::new();
        if !self.execution_loaded {
            failing.push("execution_loaded");
        }
        if !self.quality_loaded {
            failing.push("quality_loaded");
        }
        if !self.sync_completed {
            failing.push("sync_completed");
        }
        if !self.performance_ok {
            failing.push("performance_ok");
        }
        failing
    }
}

/// Dual-brain synchronization engine.
pub struct SyncEngine {
    config: SyncConfig,
    execution: BrainSource,
    quality: BrainSource,
    retry_count: u32,
    metrics: MetricsSink,
    notifier: SyncNotifier,
    delay: Box<dyn Delay>,
}

impl SyncEngine {
    pub fn new(config: SyncConfig) -> Self {
        Self::with_delay(config, Box::new(TokioDelay))
    }

    /// Construct with an injected delay primitive, so backoff behavior is
    /// testable without wall-clock waits.
    pub fn with_delay(config: SyncConfig, delay: Box<dyn Delay>) -> Self {
        let execution = BrainSource::new(BrainSide::Execution, &config.execution_brain);
        let quality = BrainSource::new(BrainSide::Quality, &config.quality_brain);
        let metrics = MetricsSink::new(&config.metrics_path);
        Self {
            config,
            execution,
            quality,
            retry_count: 0,
            metrics,
            notifier: SyncNotifier::new(),
            delay,
        }
    }

    /// Route metrics-persistence failures to `callback`.
    pub fn with_metrics_diagnostics(mut self, callback: DiagnosticFn) -> Self {
        self.metrics = self.metrics.with_diagnostics(callback);
        self
    }

    /// Register an observer for engine notifications.
    pub fn subscribe<S: SyncSubscriber + 'static>(&mut self, subscriber: S) {
        self.notifier.subscribe(subscriber);
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Clear the retry counter after a terminal failure. The counter is
    /// deliberately not reset when `activate` propagates an error.
    pub fn reset_retries(&mut self) {
        self.retry_count = 0;
    }

    /// Whether a free-form context string warrants an activation.
    pub fn should_activate(&self, context: &str) -> bool {
        if !self.config.sync_enabled {
            return false;
        }
        let context = context.to_lowercase();
        ACTIVATION_TRIGGERS
            .iter()
            .any(|trigger| context.contains(trigger))
    }

    /// Run one activation: load both brains, reconcile, validate.
    ///
    /// Gated by `sync_enabled` and `auto_activation`; if either is off the
    /// call is a silent no-op. Failures retry with linear backoff
    /// (`retry_base_ms * retry_count`) up to `max_retries`, restarting the
    /// whole sequence each time. With retries exhausted the terminal error
    /// propagates: untouched when no retry ran, otherwise wrapped in
    /// [`SyncError::RetryExhausted`] carrying the last underlying error.
    pub async fn activate(&mut self) -> Result<(), SyncError> {
        if !self.config.sync_enabled || !self.config.auto_activation {
            debug!(
                sync_enabled = self.config.sync_enabled,
                auto_activation = self.config.auto_activation,
                "Activation gated off"
            );
            return Ok(());
        }

        loop {
            let start = Instant::now();
            match self.run_attempt().await {
                Ok(()) => {
                    self.retry_count = 0;
                    self.metrics
                        .append(
                            "activate",
                            json!({
                                "duration_ms": start.elapsed().as_millis() as u64,
                                "ok": true,
                            }),
                        )
                        .await;
                    info!("Dual-brain system activated and synced");
                    self.notifier.emit(SyncEvent::Activated);
                    return Ok(());
                }
                Err(err) => {
                    self.metrics
                        .append("activate", json!({ "ok": false, "error": err.to_string() }))
                        .await;

                    if self.retry_count < self.config.max_retries {
                        self.retry_count += 1;
                        let wait = backoff_delay(self.config.retry_base_ms, self.retry_count);
                        warn!(
                            retry = self.retry_count,
                            wait_ms = wait.as_millis() as u64,
                            error = %err,
                            "Activation failed, retrying"
                        );
                        self.delay.sleep(wait).await;
                        continue;
                    }

                    error!(error = %err, "Activation failed terminally");
                    return Err(if self.retry_count == 0 {
                        err
                    } else {
                        SyncError::RetryExhausted {
                            attempts: self.retry_count,
                            source: Box::new(err),
                        }
                    });
                }
            }
        }
    }

    async fn run_attempt(&mut self) -> Result<(), SyncError> {
        // Deterministic order: execution before quality, so metrics
        // ordering and failure attribution stay unambiguous.
        let execution_outcome = self.execution.load(&self.notifier, &self.metrics).await?;
        let quality_outcome = self.quality.load(&self.notifier, &self.metrics).await?;

        let report = reconcile(
            &self.execution,
            &self.quality,
            &execution_outcome.content,
            &quality_outcome.content,
            self.config.reconcile_mode,
            &self.notifier,
            &self.metrics,
        )
        .await?;

        self.validate_sync_state(&report).await
    }

    async fn validate_sync_state(&self, report: &ReconcileReport) -> Result<(), SyncError> {
        let start = Instant::now();
        debug!(
            execution_unique = report.execution_unique,
            quality_unique = report.quality_unique,
            "Validating sync state"
        );

        let checks = ValidationChecks {
            execution_loaded: self.execution.last_fingerprint().is_some(),
            quality_loaded: self.quality.last_fingerprint().is_some(),
            sync_completed: true,
            performance_ok: true,
        };
        let all_valid = checks.all_valid();

        self.metrics
            .append(
                "validate_sync_state",
                json!({
                    "duration_ms": start.elapsed().as_millis() as u64,
                    "checks": checks,
                }),
            )
            .await;

        if all_valid {
            Ok(())
        } else {
            Err(SyncError::Validation(checks.failing().join(", ")))
        }
    }
}
