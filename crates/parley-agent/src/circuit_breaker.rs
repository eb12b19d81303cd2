//! Per-peer circuit breaker.
//!
//! The breaker tracks the final outcome of every logical call to one peer
//! and fails fast once the peer looks unhealthy.
//!
//! | State | Admits calls | Leaves when |
//! |-------|--------------|-------------|
//! | `Closed` | yes | `failure_threshold` consecutive failures → `Open` |
//! | `Open` | no | first call after `recovery_timeout` → `HalfOpen` |
//! | `HalfOpen` | one probe at a time | `success_threshold` successes → `Closed`, any failure → `Open` |
//!
//! Calls are admitted through [`CircuitBreaker::try_acquire`], which hands out
//! a [`CallPermit`]. The permit is consumed by reporting exactly one outcome.
//! A permit dropped without an outcome (the call was cancelled) reports
//! nothing and frees the probe slot it held.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Thresholds and timing for a circuit breaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures in `Closed` that open the circuit
    pub failure_threshold: u32,

    /// Consecutive probe successes in `HalfOpen` that close the circuit
    pub success_threshold: u32,

    /// Time spent `Open` before a probe is admitted
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            recovery_timeout: Duration::from_secs(30),
        }
    }
}

/// Breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation
    Closed,
    /// Failing fast
    Open,
    /// Probing recovery
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Rejection returned while the circuit does not admit calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitOpen {
    /// Peer the breaker guards
    pub endpoint: String,
    /// Time until a probe may be admitted (zero while a probe is in flight)
    pub retry_in: Duration,
}

/// Point-in-time view of a breaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    /// Remaining open time, only while `Open`
    pub retry_in: Option<Duration>,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
    /// Bumped on every transition so permits from an earlier state are ignored
    generation: u64,
}

impl BreakerInner {
    fn transition(&mut self, to: CircuitState, endpoint: &str) {
        let from = self.state;
        self.state = to;
        self.failure_count = 0;
        self.success_count = 0;
        self.probe_in_flight = false;
        self.generation += 1;
        self.opened_at = match to {
            CircuitState::Open => Some(Instant::now()),
            _ => None,
        };

        match to {
            CircuitState::Open => warn!(endpoint = %endpoint, %from, to = %to, "Circuit opened"),
            _ => info!(endpoint = %endpoint, %from, to = %to, "Circuit state changed"),
        }
    }

    fn remaining_open(&self, recovery_timeout: Duration) -> Duration {
        self.opened_at
            .map_or(Duration::ZERO, |at| recovery_timeout.saturating_sub(at.elapsed()))
    }
}

/// Failure-tracking guard for calls to a single peer
#[derive(Debug)]
pub struct CircuitBreaker {
    endpoint: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a closed breaker for one peer
    pub fn new(endpoint: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
                probe_in_flight: false,
                generation: 0,
            }),
        }
    }

    /// Peer this breaker guards
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the configuration
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask to make one call
    ///
    /// In `Open`, the first request after `recovery_timeout` moves the breaker
    /// to `HalfOpen` and is admitted as the probe.
    pub fn try_acquire(&self) -> Result<CallPermit<'_>, CircuitOpen> {
        let mut inner = self.lock();

        if inner.state == CircuitState::Open {
            let remaining = inner.remaining_open(self.config.recovery_timeout);
            if !remaining.is_zero() {
                debug!(endpoint = %self.endpoint, retry_in_ms = remaining.as_millis() as u64, "Circuit open, rejecting call");
                return Err(CircuitOpen {
                    endpoint: self.endpoint.clone(),
                    retry_in: remaining,
                });
            }
            inner.transition(CircuitState::HalfOpen, &self.endpoint);
        }

        let probe = inner.state == CircuitState::HalfOpen;
        if probe {
            if inner.probe_in_flight {
                return Err(CircuitOpen {
                    endpoint: self.endpoint.clone(),
                    retry_in: Duration::ZERO,
                });
            }
            inner.probe_in_flight = true;
        }

        Ok(CallPermit {
            breaker: self,
            generation: inner.generation,
            probe,
            reported: false,
        })
    }

    /// Whether a call made now would be admitted, without changing state
    pub fn is_call_permitted(&self) -> bool {
        let inner = self.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => inner.remaining_open(self.config.recovery_timeout).is_zero(),
            CircuitState::HalfOpen => !inner.probe_in_flight,
        }
    }

    /// Current state
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Current state and counters
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            retry_in: (inner.state == CircuitState::Open)
                .then(|| inner.remaining_open(self.config.recovery_timeout)),
        }
    }

    fn on_success(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(endpoint = %self.endpoint, "Ignoring outcome from an earlier circuit state");
            return;
        }

        match inner.state {
            CircuitState::Closed => inner.failure_count = 0,
            CircuitState::HalfOpen => {
                inner.probe_in_flight = false;
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    inner.transition(CircuitState::Closed, &self.endpoint);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(endpoint = %self.endpoint, "Ignoring outcome from an earlier circuit state");
            return;
        }

        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    inner.transition(CircuitState::Open, &self.endpoint);
                }
            }
            CircuitState::HalfOpen => inner.transition(CircuitState::Open, &self.endpoint),
            CircuitState::Open => {}
        }
    }

    fn on_abandoned(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation && inner.state == CircuitState::HalfOpen {
            inner.probe_in_flight = false;
        }
    }
}

/// Admission for one call; report its outcome exactly once
#[must_use = "a permit must be consumed by reporting the call outcome"]
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    probe: bool,
    reported: bool,
}

impl CallPermit<'_> {
    /// Whether this call is a half-open probe
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    /// Report that the call succeeded
    pub fn record_success(mut self) {
        self.reported = true;
        self.breaker.on_success(self.generation);
    }

    /// Report that the call failed
    pub fn record_failure(mut self) {
        self.reported = true;
        self.breaker.on_failure(self.generation);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.reported && self.probe {
            self.breaker.on_abandoned(self.generation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(failures: u32, successes: u32) -> CircuitBreaker {
        CircuitBreaker::new(
            "https://peer.example.com/",
            CircuitBreakerConfig {
                failure_threshold: failures,
                success_threshold: successes,
                recovery_timeout: Duration::from_secs(10),
            },
        )
    }

    fn fail(breaker: &CircuitBreaker) {
        breaker.try_acquire().unwrap().record_failure();
    }

    fn succeed(breaker: &CircuitBreaker) {
        breaker.try_acquire().unwrap().record_success();
    }

    #[test]
    fn test_opens_on_threshold() {
        let cb = breaker(3, 1);
        fail(&cb);
        fail(&cb);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.snapshot().failure_count, 2);

        fail(&cb);
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.snapshot().failure_count, 0);
        assert!(cb.try_acquire().is_err());
    }

    #[test]
    fn test_success_resets_failures() {
        let cb = breaker(3, 1);
        fail(&cb);
        fail(&cb);
        succeed(&cb);
        fail(&cb);
        fail(&cb);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_closes_after_successes() {
        let cb = breaker(1, 2);
        fail(&cb);

        tokio::time::advance(Duration::from_secs(10)).await;
        let probe = cb.try_acquire().unwrap();
        assert!(probe.is_probe());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        probe.record_success();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert_eq!(cb.snapshot().success_count, 1);

        succeed(&cb);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.snapshot().success_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_admits_one_probe_at_a_time() {
        let cb = breaker(1, 2);
        fail(&cb);
        tokio::time::advance(Duration::from_secs(10)).await;

        let probe = cb.try_acquire().unwrap();
        let rejected = cb.try_acquire().unwrap_err();
        assert_eq!(rejected.retry_in, Duration::ZERO);
        assert!(!cb.is_call_permitted());

        // Abandoning the probe frees the slot without counting an outcome.
        drop(probe);
        assert!(cb.is_call_permitted());
        assert_eq!(cb.snapshot().success_count, 0);
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_outcome_ignored() {
        let cb = breaker(1, 1);
        let slow = cb.try_acquire().unwrap();
        fail(&cb);
        assert_eq!(cb.state(), CircuitState::Open);

        // A call admitted while closed finishes after the circuit opened.
        slow.record_success();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_reports_remaining_open_time() {
        let cb = breaker(1, 1);
        fail(&cb);
        tokio::time::advance(Duration::from_secs(4)).await;

        let snapshot = cb.snapshot();
        assert_eq!(snapshot.state, CircuitState::Open);
        assert_eq!(snapshot.retry_in, Some(Duration::from_secs(6)));
    }
}
