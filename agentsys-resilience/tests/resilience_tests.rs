//! End-to-end tests for the breaker lifecycle, classified retries and
//! fallback chains.

#![allow(clippy::unwrap_used, clippy::panic)] // Tests are allowed to use unwrap for simplicity

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use agentsys_resilience::{
    BreakerConfig, BreakerState, ErrorClass, FallbackChain, FallbackStrategy, Resilience,
    ResilienceError, RetryPolicy,
};

#[derive(Debug, Clone, thiserror::Error)]
enum CallError {
    #[error("connection reset")]
    Network,
    #[error("deadline exceeded")]
    Timeout,
    #[error("malformed request")]
    Validation,
}

impl ErrorClass for CallError {
    fn error_tag(&self) -> &str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Validation => "validation",
        }
    }
}

/// Circuit breaker lifecycle: open at threshold, fail fast, probe after the
/// reset timeout, close on probe success.
#[tokio::test]
async fn breaker_lifecycle_open_reject_probe_close() {
    let resilience = Resilience::new();
    let config = BreakerConfig::new("lifecycle")
        .with_failure_threshold(2)
        .with_reset_timeout(Duration::from_millis(100))
        .with_half_open_max_attempts(1);

    // Two failures open the breaker.
    for _ in 0..2 {
        let result: Result<u32, _> = resilience
            .with_circuit_breaker("lifecycle-op", &config, || async {
                Err::<u32, _>(CallError::Network)
            })
            .await;
        assert!(matches!(result.unwrap_err(), ResilienceError::Inner(_)));
    }
    let metrics = resilience.circuit_breaker_metrics("lifecycle").unwrap();
    assert_eq!(metrics.state, BreakerState::Open);
    assert_eq!(metrics.failure_count, 2);
    assert!(metrics.opened_at.is_some());

    // A request inside the reset window fails fast without running the op.
    let ran = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&ran);
    let rejected: Result<u32, _> = resilience
        .with_circuit_breaker("lifecycle-op", &config, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, CallError>(1)
        })
        .await;
    assert!(matches!(
        rejected.unwrap_err(),
        ResilienceError::CircuitOpen { .. }
    ));
    assert_eq!(ran.load(Ordering::SeqCst), 0);

    // After the reset timeout the next request is admitted as a probe and
    // its success closes the breaker.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let value: u32 = resilience
        .with_circuit_breaker("lifecycle-op", &config, || async { Ok::<_, CallError>(7) })
        .await
        .unwrap();
    assert_eq!(value, 7);

    let metrics = resilience.circuit_breaker_metrics("lifecycle").unwrap();
    assert_eq!(metrics.state, BreakerState::Closed);
    assert_eq!(metrics.failure_count, 0);
    assert_eq!(metrics.total_requests, 4);
    assert_eq!(metrics.total_failures, 2);
    assert_eq!(metrics.success_count, 1);
    assert_eq!(metrics.rejected_while_open, 1);
    assert_eq!(
        metrics.total_requests,
        metrics.success_count + metrics.total_failures + metrics.rejected_while_open
    );
}

/// Classified retries: retryable errors back off and retry, the first
/// non-retryable error stops the loop and surfaces unchanged.
#[tokio::test]
async fn retry_with_classified_errors() {
    let policy = RetryPolicy::builder()
        .with_max_attempts(4)
        .with_base_delay(Duration::from_millis(10))
        .with_backoff_multiplier(2.0)
        .with_jitter(false)
        .with_retryable_error("network")
        .with_retryable_error("timeout")
        .with_non_retryable_error("validation")
        .build()
        .unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let started = Instant::now();

    let result: Result<u32, _> = policy
        .execute(|| {
            let counter = Arc::clone(&counter);
            async move {
                match counter.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(CallError::Network),
                    1 => Err(CallError::Timeout),
                    _ => Err(CallError::Validation),
                }
            }
        })
        .await;
    let elapsed = started.elapsed();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let err = result.unwrap_err();
    assert!(matches!(
        err,
        ResilienceError::Inner(CallError::Validation)
    ));
    assert_eq!(err.to_string(), "malformed request");

    // Two backoff sleeps happened: 10ms then 20ms.
    assert!(elapsed >= Duration::from_millis(30));
    assert!(elapsed < Duration::from_millis(500));
}

/// Fallback chain: a timed-out strategy hands its timeout error to the next
/// condition in priority order.
#[tokio::test]
async fn fallback_chain_timeout_then_backup() {
    let resilience = Resilience::new();
    let invocations: Arc<parking_lot::Mutex<Vec<&'static str>>> =
        Arc::new(parking_lot::Mutex::new(Vec::new()));

    let log_slow = Arc::clone(&invocations);
    let log_backup = Arc::clone(&invocations);
    let chain: FallbackChain<String, CallError> = FallbackChain::new()
        .with_strategy(
            FallbackStrategy::new(
                "s1-slow-replica",
                1,
                |err: &ResilienceError<CallError>| err.error_tag() == "network",
                move || {
                    log_slow.lock().push("s1");
                    async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok("replica".to_string())
                    }
                },
            )
            .with_timeout(Duration::from_millis(50)),
        )
        .with_strategy(FallbackStrategy::new(
            "s2-static-backup",
            2,
            |err: &ResilienceError<CallError>| err.error_tag() == "timeout",
            move || {
                log_backup.lock().push("s2");
                async { Ok("backup".to_string()) }
            },
        ));

    let value = resilience
        .with_fallback("fetch-profile", &chain, || async {
            Err::<String, _>(CallError::Network)
        })
        .await
        .unwrap();

    assert_eq!(value, "backup");
    assert_eq!(*invocations.lock(), vec!["s1", "s2"]);

    let metrics = resilience.metrics("fetch-profile").unwrap();
    assert!(metrics.fallback_used);
    assert_eq!(metrics.successes, 1);
    assert!(metrics.failures >= 1);
}

/// Boundary: a single-attempt policy never delays and passes the error
/// through unchanged.
#[tokio::test]
async fn single_attempt_policy_is_transparent() {
    let policy = RetryPolicy::builder()
        .with_max_attempts(1)
        .with_base_delay(Duration::from_secs(60))
        .build()
        .unwrap();

    let started = Instant::now();
    let result: Result<u32, _> = policy
        .execute(|| async { Err::<u32, _>(CallError::Timeout) })
        .await;

    assert!(started.elapsed() < Duration::from_secs(1));
    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "deadline exceeded");
    assert!(matches!(err, ResilienceError::Inner(CallError::Timeout)));
}

/// Boundary: the breaker opens exactly at the failure threshold, not before.
#[tokio::test]
async fn breaker_opens_exactly_at_threshold() {
    let resilience = Resilience::new();
    let config = BreakerConfig::new("edge")
        .with_failure_threshold(3)
        .with_reset_timeout(Duration::from_secs(60));

    for expected_state in [BreakerState::Closed, BreakerState::Closed, BreakerState::Open] {
        let _: Result<u32, _> = resilience
            .with_circuit_breaker("edge-op", &config, || async {
                Err::<u32, _>(CallError::Network)
            })
            .await;
        assert_eq!(
            resilience.circuit_breaker_metrics("edge").unwrap().state,
            expected_state
        );
    }
}

/// Retry delays observe the backoff formula bounds when jitter is enabled.
#[tokio::test]
async fn jittered_delays_respect_bounds() {
    let policy = RetryPolicy::builder()
        .with_max_attempts(3)
        .with_base_delay(Duration::from_millis(20))
        .with_backoff_multiplier(2.0)
        .with_jitter(true)
        .with_jitter_factor(0.5)
        .build()
        .unwrap();

    let started = Instant::now();
    let result: Result<u32, _> = policy
        .execute(|| async { Err::<u32, _>(CallError::Network) })
        .await;
    let elapsed = started.elapsed();

    assert!(matches!(
        result.unwrap_err(),
        ResilienceError::RetryExhausted { attempts: 3, .. }
    ));
    // Minimum: 20ms + 40ms. Maximum with 0.5 jitter: 30ms + 60ms.
    assert!(elapsed >= Duration::from_millis(60));
    assert!(elapsed < Duration::from_millis(1000));
}

/// Facade clones share breaker state, so the whole process observes one
/// breaker per name.
#[tokio::test]
async fn shared_breaker_state_across_clones() {
    let resilience = Resilience::new();
    let alias = resilience.clone();
    let config = BreakerConfig::new("shared").with_failure_threshold(1);

    let _: Result<u32, _> = resilience
        .with_circuit_breaker("shared-op", &config, || async {
            Err::<u32, _>(CallError::Network)
        })
        .await;

    let rejected: Result<u32, _> = alias
        .with_circuit_breaker("shared-op", &config, || async { Ok::<_, CallError>(1) })
        .await;
    assert!(matches!(
        rejected.unwrap_err(),
        ResilienceError::CircuitOpen { .. }
    ));
}
