//! Named circuit breakers with CLOSED/OPEN/HALF_OPEN transitions.

// Layer 1: Standard library imports
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

// Layer 3: Internal module imports
use crate::error::ResilienceError;

/// Default consecutive failures before the breaker opens
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default time an open breaker waits before probing
pub const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of concurrent half-open probes
pub const DEFAULT_HALF_OPEN_MAX_ATTEMPTS: u32 = 1;

/// Configuration for a named circuit breaker.
///
/// # Example
///
/// ```rust
/// use agentsys_resilience::BreakerConfig;
/// use std::time::Duration;
///
/// let config = BreakerConfig::new("upstream")
///     .with_failure_threshold(3)
///     .with_reset_timeout(Duration::from_millis(200));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Breaker identity; also the registry key
    pub name: String,

    /// Consecutive failures in CLOSED before opening
    pub failure_threshold: u32,

    /// Time an OPEN breaker rejects before admitting probes
    pub reset_timeout: Duration,

    /// Concurrent probe budget in HALF_OPEN; all must succeed to close
    pub half_open_max_attempts: u32,
}

impl BreakerConfig {
    /// Configuration with defaults for the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_timeout: DEFAULT_RESET_TIMEOUT,
            half_open_max_attempts: DEFAULT_HALF_OPEN_MAX_ATTEMPTS,
        }
    }

    /// Builder method: set the failure threshold.
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Builder method: set the reset timeout.
    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }

    /// Builder method: set the half-open probe budget.
    pub fn with_half_open_max_attempts(mut self, attempts: u32) -> Self {
        self.half_open_max_attempts = attempts;
        self
    }

    /// Validate configuration values.
    ///
    /// Returns `Err` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.failure_threshold == 0 {
            return Err("failure_threshold must be >= 1".to_string());
        }
        if self.reset_timeout.is_zero() {
            return Err("reset_timeout must be > 0".to_string());
        }
        if self.half_open_max_attempts == 0 {
            return Err("half_open_max_attempts must be >= 1".to_string());
        }
        Ok(())
    }
}

/// Breaker state as observed through metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    /// Requests flow; consecutive failures are counted
    Closed,
    /// Requests fail fast until the reset timeout elapses
    Open,
    /// A bounded number of probes decides between Closed and Open
    HalfOpen,
}

/// Metrics snapshot of one breaker.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerMetrics {
    pub name: String,
    pub state: BreakerState,
    pub failure_count: u32,
    pub success_count: u64,
    pub total_requests: u64,
    pub total_failures: u64,
    pub rejected_while_open: u64,
    pub opened_at: Option<DateTime<Utc>>,
}

struct BreakerInner {
    state: BreakerState,
    failure_count: u32,
    success_count: u64,
    total_requests: u64,
    total_failures: u64,
    rejected_while_open: u64,
    opened_at: Option<Instant>,
    opened_at_utc: Option<DateTime<Utc>>,
    half_open_in_flight: u32,
    half_open_successes: u32,
}

/// How a request was admitted; decides the bookkeeping on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Closed,
    HalfOpenProbe,
}

/// A named circuit breaker.
///
/// The internal lock is held only across state transitions, never across
/// the wrapped operation, so breaker decisions are non-blocking: a request
/// is either admitted or fails fast with `CircuitOpen`.
///
/// # Counting
///
/// `total_requests` counts every arrival, including rejections, so
/// `total_requests == success_count + total_failures + rejected_while_open`
/// holds whenever no admitted operation is still in flight.
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a breaker from its configuration.
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                failure_count: 0,
                success_count: 0,
                total_requests: 0,
                total_failures: 0,
                rejected_while_open: 0,
                opened_at: None,
                opened_at_utc: None,
                half_open_in_flight: 0,
                half_open_successes: 0,
            }),
        }
    }

    /// Breaker configuration.
    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    /// Run `op` behind the breaker.
    ///
    /// # Errors
    ///
    /// `ResilienceError::CircuitOpen` when the breaker rejects the request
    /// without running `op`; `ResilienceError::Inner` with the operation's
    /// own error otherwise.
    pub async fn call<T, E, F, Fut>(&self, op: F) -> Result<T, ResilienceError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        let admission = match self.try_admit() {
            Ok(admission) => admission,
            Err(()) => {
                return Err(ResilienceError::CircuitOpen {
                    name: self.config.name.clone(),
                })
            }
        };

        match op().await {
            Ok(value) => {
                self.record_success(admission);
                Ok(value)
            }
            Err(err) => {
                self.record_failure(admission);
                Err(ResilienceError::Inner(err))
            }
        }
    }

    /// Admission decision; counts the arrival either way.
    fn try_admit(&self) -> Result<Admission, ()> {
        let mut inner = self.inner.lock();
        inner.total_requests += 1;

        match inner.state {
            BreakerState::Closed => Ok(Admission::Closed),
            BreakerState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| at.elapsed())
                    .unwrap_or(Duration::MAX);
                if elapsed < self.config.reset_timeout {
                    inner.rejected_while_open += 1;
                    return Err(());
                }
                // Reset timeout elapsed: this request becomes the first probe.
                inner.state = BreakerState::HalfOpen;
                inner.half_open_in_flight = 1;
                inner.half_open_successes = 0;
                tracing::info!(breaker = %self.config.name, "circuit breaker half-open");
                Ok(Admission::HalfOpenProbe)
            }
            BreakerState::HalfOpen => {
                if inner.half_open_in_flight < self.config.half_open_max_attempts {
                    inner.half_open_in_flight += 1;
                    Ok(Admission::HalfOpenProbe)
                } else {
                    inner.rejected_while_open += 1;
                    Err(())
                }
            }
        }
    }

    fn record_success(&self, admission: Admission) {
        let mut inner = self.inner.lock();
        inner.success_count += 1;

        match (admission, inner.state) {
            (Admission::Closed, BreakerState::Closed) => {
                inner.failure_count = 0;
            }
            (Admission::HalfOpenProbe, BreakerState::HalfOpen) => {
                inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.half_open_max_attempts {
                    inner.state = BreakerState::Closed;
                    inner.failure_count = 0;
                    inner.opened_at = None;
                    inner.opened_at_utc = None;
                    inner.half_open_in_flight = 0;
                    inner.half_open_successes = 0;
                    tracing::info!(breaker = %self.config.name, "circuit breaker closed");
                }
            }
            // A probe finishing after another probe already reopened the
            // breaker only counts; the Open state stands.
            _ => {}
        }
    }

    fn record_failure(&self, admission: Admission) {
        let mut inner = self.inner.lock();
        inner.total_failures += 1;

        match (admission, inner.state) {
            (Admission::Closed, BreakerState::Closed) => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    Self::open(&self.config, &mut inner);
                }
            }
            (Admission::HalfOpenProbe, BreakerState::HalfOpen) => {
                // Any probe failure reopens and drops remaining probe slots.
                Self::open(&self.config, &mut inner);
            }
            _ => {}
        }
    }

    fn open(config: &BreakerConfig, inner: &mut BreakerInner) {
        inner.state = BreakerState::Open;
        inner.opened_at = Some(Instant::now());
        inner.opened_at_utc = Some(Utc::now());
        inner.half_open_in_flight = 0;
        inner.half_open_successes = 0;
        tracing::warn!(
            breaker = %config.name,
            failure_count = inner.failure_count,
            "circuit breaker opened"
        );
    }

    /// Metrics snapshot.
    pub fn metrics(&self) -> BreakerMetrics {
        let inner = self.inner.lock();
        BreakerMetrics {
            name: self.config.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            total_requests: inner.total_requests,
            total_failures: inner.total_failures,
            rejected_while_open: inner.rejected_while_open,
            opened_at: inner.opened_at_utc,
        }
    }

    /// Reset to CLOSED and zero every counter.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        *inner = BreakerInner {
            state: BreakerState::Closed,
            failure_count: 0,
            success_count: 0,
            total_requests: 0,
            total_failures: 0,
            rejected_while_open: 0,
            opened_at: None,
            opened_at_utc: None,
            half_open_in_flight: 0,
            half_open_successes: 0,
        };
    }
}

/// Process-wide registry of breakers keyed by name.
///
/// Clones share the same breakers; construct separate registries for test
/// isolation.
#[derive(Clone, Default)]
pub struct BreakerRegistry {
    breakers: Arc<DashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the breaker named by `config`, creating it on first use.
    ///
    /// An existing breaker keeps its original configuration; differing
    /// settings on later calls are ignored.
    pub fn get_or_create(&self, config: &BreakerConfig) -> Arc<CircuitBreaker> {
        Arc::clone(
            self.breakers
                .entry(config.name.clone())
                .or_insert_with(|| Arc::new(CircuitBreaker::new(config.clone())))
                .value(),
        )
    }

    /// Fetch an existing breaker by name.
    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Metrics snapshot of an existing breaker.
    pub fn metrics(&self, name: &str) -> Option<BreakerMetrics> {
        self.get(name).map(|breaker| breaker.metrics())
    }

    /// Reset an existing breaker.
    pub fn reset(&self, name: &str) -> bool {
        match self.get(name) {
            Some(breaker) => {
                breaker.reset();
                true
            }
            None => false,
        }
    }

    /// Number of registered breakers.
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    /// Whether no breakers are registered.
    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Drop every breaker. Teardown hook for embedders and tests.
    pub fn clear(&self) {
        self.breakers.clear();
    }
}
