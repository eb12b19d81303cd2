//! Bounded exponential-backoff retry.
//!
//! [`RetryPolicy::run`] re-invokes an operation while it fails with a
//! retryable [`A2aError`] (rate limiting, 5xx, network). Any other error is
//! returned on first occurrence. When attempts run out the last retryable
//! error is returned unchanged.

use parley_a2a::{A2aError, A2aResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retrying calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of tries per logical call, including the first
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub base_delay: Duration,

    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    /// Backoff after failed attempt `attempt` (zero-based): `min(base * 2^attempt, max)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        1u32.checked_shl(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Delay before the next attempt, honouring a peer's `Retry-After`
    fn wait_after(&self, attempt: u32, error: &A2aError) -> Duration {
        let backoff = self.delay_for(attempt);
        match error.retry_after() {
            Some(requested) => backoff.max(requested).min(self.max_delay),
            None => backoff,
        }
    }
}

/// Retry wrapper around a single logical call
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a policy from a configuration
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out
    ///
    /// `op` receives the zero-based attempt number.
    pub async fn run<T, F, Fut>(&self, endpoint: &str, mut op: F) -> A2aResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = A2aResult<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(endpoint = %endpoint, attempt, "Call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = self.config.wait_after(attempt, &err);
                    warn!(
                        endpoint = %endpoint,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retryable failure, backing off"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        warn!(endpoint = %endpoint, attempts = max_attempts, error = %err, "Retries exhausted");
                    }
                    return Err(err);
                }
            }
        }
    }
}
