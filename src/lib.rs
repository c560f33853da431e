//! Brainsync: Dual Rule-File Synchronization
//!
//! Keeps two operator-authored rule files (an execution brain and a
//! quality brain) coherent for a downstream assistant runtime: detects
//! content changes via fingerprinting, computes line-level directional
//! diffs, reconciles per a configurable policy, and records every
//! operation in a persisted metrics log.

pub mod backoff;
pub mod brain;
pub mod cli;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod logging;
pub mod metrics;
pub mod reconcile;
pub mod watch;
