//! Retry backoff policy and the delay seam
//!
//! The backoff formula is a pure function so the policy is testable
//! without wall-clock waits; actually suspending is behind the [`Delay`]
//! trait so tests can inject a recording fake.

use std::time::Duration;

use async_trait::async_trait;

/// Linear backoff: `base_ms * attempt`.
///
/// `attempt` is 1-based; attempt 0 yields no delay.
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(attempt as u64))
}

/// Cooperative delay primitive.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production delay backed by the tokio timer.
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
