//! Bounded retry with exponential backoff.
//!
//! Only errors reporting [`Error::is_retryable`](jadoo_core::Error::is_retryable) are retried: timeouts,
//! rate limiting (429), and upstream 5xx responses. Everything else is
//! returned on the first failure.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use jadoo_core::defaults::{RETRY_BASE_DELAY_MS, RETRY_MAX_DELAY_MS, SERVICE_MAX_RETRIES};
use jadoo_core::Result;

/// Retry policy for outbound service calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each subsequent retry.
    pub base_delay: Duration,
    /// Upper bound on a single delay, jitter included.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: SERVICE_MAX_RETRIES,
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(RETRY_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Backoff before retry number `attempt` (0-based), with up to 50% jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let exp_ms = base_ms.saturating_mul(1u64 << attempt.min(16));
        let jitter_ms = rand::thread_rng().gen_range(0..=exp_ms / 2);
        let max_ms = self.max_delay.as_millis() as u64;
        Duration::from_millis(exp_ms.saturating_add(jitter_ms).min(max_ms))
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries && e.is_retryable() => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        subsystem = "inference",
                        operation,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient service error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
