//! Bounded retry with linear back-off
//!
//! The first attempt runs immediately; attempt `n` (1-based, `n > 1`) waits
//! `(n - 1) * base_delay` first. Three attempts therefore wait 1x then 2x
//! the base delay.

use std::future::Future;
use std::time::Duration;

use huddle_common::TimingConfig;

/// Retry schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Discovery policy from configured timings
    pub fn discovery(timing: &TimingConfig) -> Self {
        Self::new(timing.discovery_attempts, timing.discovery_base_delay())
    }

    /// Wait before the 1-based `attempt`
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.saturating_sub(1)
    }

    /// Run `op` until it yields `Some`, or attempts run out
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Option<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        for attempt in 1..=self.max_attempts {
            let delay = self.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Some(value) = op(attempt).await {
                return Some(value);
            }
            tracing::debug!(attempt, max_attempts = self.max_attempts, "Attempt unresolved");
        }
        None
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::discovery(&TimingConfig::default())
    }
}
