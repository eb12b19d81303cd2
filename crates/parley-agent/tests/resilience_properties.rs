//! Property tests for the resilience layer
//!
//! Breaker, backoff and retry bounds are checked over generated
//! configurations. Time-dependent cases run on a paused tokio clock.

use parley_a2a::testing::MockTransport;
use parley_a2a::{A2aError, AgentCard, AgentSkill};
use parley_agent::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, ResilienceConfigBuilder, ResilientClient,
    RetryConfig, RetryPolicy,
};
use proptest::prelude::*;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn paused<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
        .block_on(future)
}

fn breaker(failure_threshold: u32, success_threshold: u32, recovery_ms: u64) -> CircuitBreaker {
    CircuitBreaker::new(
        "mock://peer",
        CircuitBreakerConfig {
            failure_threshold,
            success_threshold,
            recovery_timeout: Duration::from_millis(recovery_ms),
        },
    )
}

fn fail(breaker: &CircuitBreaker) {
    breaker.try_acquire().unwrap().record_failure();
}

fn succeed(breaker: &CircuitBreaker) {
    breaker.try_acquire().unwrap().record_success();
}

proptest! {
    #[test]
    fn breaker_opens_exactly_at_threshold(threshold in 1u32..20) {
        let breaker = breaker(threshold, 1, 1_000);

        for _ in 1..threshold {
            fail(&breaker);
            prop_assert_eq!(breaker.state(), CircuitState::Closed);
        }
        fail(&breaker);

        prop_assert_eq!(breaker.state(), CircuitState::Open);
        prop_assert!(breaker.try_acquire().is_err());
    }

    #[test]
    fn breaker_tracks_consecutive_failures_only(
        threshold in 1u32..6,
        outcomes in prop::collection::vec(any::<bool>(), 0..40),
    ) {
        let breaker = breaker(threshold, 1, 60_000);
        let mut run = 0;
        let mut open = false;

        for success in outcomes {
            let Ok(permit) = breaker.try_acquire() else {
                prop_assert!(open);
                continue;
            };
            prop_assert!(!open);
            if success {
                permit.record_success();
                run = 0;
            } else {
                permit.record_failure();
                run += 1;
                open = run >= threshold;
            }
        }

        let expected = if open { CircuitState::Open } else { CircuitState::Closed };
        prop_assert_eq!(breaker.state(), expected);
    }

    #[test]
    fn open_rejects_until_recovery_then_admits_one_probe(
        threshold in 1u32..5,
        recovery_ms in 10u64..10_000,
    ) {
        paused(async {
            let breaker = breaker(threshold, 1, recovery_ms);
            for _ in 0..threshold {
                fail(&breaker);
            }

            tokio::time::advance(Duration::from_millis(recovery_ms - 1)).await;
            let rejected = breaker.try_acquire().unwrap_err();
            assert_eq!(rejected.retry_in, Duration::from_millis(1));

            tokio::time::advance(Duration::from_millis(1)).await;
            let probe = breaker.try_acquire().unwrap();
            assert!(probe.is_probe());
            assert_eq!(breaker.state(), CircuitState::HalfOpen);
            assert!(breaker.try_acquire().is_err());

            probe.record_success();
            assert_eq!(breaker.state(), CircuitState::Closed);
        });
    }

    #[test]
    fn half_open_failure_reopens(
        success_threshold in 1u32..5,
        successes_first in 0u32..5,
    ) {
        let successes_first = successes_first.min(success_threshold - 1);
        paused(async {
            let breaker = breaker(1, success_threshold, 100);
            fail(&breaker);
            tokio::time::advance(Duration::from_millis(100)).await;

            for _ in 0..successes_first {
                succeed(&breaker);
                assert_eq!(breaker.state(), CircuitState::HalfOpen);
            }
            fail(&breaker);

            assert_eq!(breaker.state(), CircuitState::Open);
            assert_eq!(breaker.snapshot().retry_in, Some(Duration::from_millis(100)));
        });
    }

    #[test]
    fn backoff_is_capped_exponential(
        base_ms in 1u64..1_000,
        cap_ms in 1u64..60_000,
        attempt in 0u32..40,
    ) {
        let config = RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(base_ms),
            max_delay: Duration::from_millis(cap_ms),
        };

        let uncapped = 2u128.checked_pow(attempt).map(|f| u128::from(base_ms) * f);
        let expected = match uncapped {
            Some(ms) if ms < u128::from(cap_ms) => Duration::from_millis(ms as u64),
            _ => Duration::from_millis(cap_ms),
        };
        prop_assert_eq!(config.delay_for(attempt), expected);
    }

    #[test]
    fn retry_never_exceeds_max_attempts(max_attempts in 1u32..8, retryable in any::<bool>()) {
        let tries = AtomicU32::new(0);
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
        });

        let result: Result<(), A2aError> = paused(policy.run("mock://peer", |_| {
            tries.fetch_add(1, Ordering::SeqCst);
            async move {
                Err(if retryable {
                    A2aError::network("mock://peer", "refused")
                } else {
                    A2aError::Auth { endpoint: "mock://peer".into(), status: 401 }
                })
            }
        }));

        prop_assert!(result.is_err());
        let expected = if retryable { max_attempts } else { 1 };
        prop_assert_eq!(tries.load(Ordering::SeqCst), expected);
    }

    #[test]
    fn cached_card_is_served_without_refetch(id in "[a-z][a-z0-9-]{0,15}", reads in 1usize..10) {
        let card = AgentCard::new(id.clone(), "Agent", "https://agent.example.com")
            .with_skill(AgentSkill::new("echo", "Echo"));
        let peer = Arc::new(MockTransport::echo("mock://agent", card, "agent"));
        let client = ResilientClient::with_transport(
            peer.clone(),
            ResilienceConfigBuilder::new().build().unwrap(),
        );

        paused(async {
            for _ in 0..reads {
                assert_eq!(client.get_card(false).await.unwrap().id, id);
            }
            client.get_card(true).await.unwrap();
        });

        prop_assert_eq!(peer.card_fetches(), 2);
    }
}
