//! The `Resilience` facade: named operations wired to shared registries.

// Layer 1: Standard library imports
use std::future::Future;
use std::time::Instant;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::breaker::{BreakerConfig, BreakerMetrics, BreakerRegistry};
use crate::error::{ErrorClass, ResilienceError};
use crate::fallback::FallbackChain;
use crate::metrics::{MetricsRegistry, OperationMetrics};
use crate::retry::RetryPolicy;

/// Entry point tying retry, circuit breaking and fallbacks to shared
/// breaker and metrics registries.
///
/// Clones share both registries, so a single `Resilience` value can be
/// handed to every service in a process while tests construct isolated
/// instances. Metrics are recorded at the boundary of each call.
///
/// # Example
///
/// ```rust
/// use agentsys_resilience::{Resilience, RetryPolicy, ErrorClass};
/// use std::time::Duration;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("transient glitch")]
/// struct Glitch;
///
/// impl ErrorClass for Glitch {
///     fn error_tag(&self) -> &str {
///         "network"
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let resilience = Resilience::new();
/// let policy = RetryPolicy::builder()
///     .with_max_attempts(2)
///     .with_base_delay(Duration::from_millis(1))
///     .build()
///     .unwrap();
///
/// let value = resilience
///     .with_retry("greet", &policy, || async { Ok::<_, Glitch>("hello") })
///     .await
///     .unwrap();
/// assert_eq!(value, "hello");
/// assert_eq!(resilience.metrics("greet").unwrap().successes, 1);
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Resilience {
    breakers: BreakerRegistry,
    metrics: MetricsRegistry,
}

impl Resilience {
    /// Create a facade with fresh registries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a facade over existing registries.
    pub fn with_registries(breakers: BreakerRegistry, metrics: MetricsRegistry) -> Self {
        Self { breakers, metrics }
    }

    /// The shared breaker registry.
    pub fn breaker_registry(&self) -> &BreakerRegistry {
        &self.breakers
    }

    /// The shared metrics registry.
    pub fn metrics_registry(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Run `op` under a retry policy, recording one attempt per invocation
    /// and the final outcome under `operation`.
    ///
    /// # Errors
    ///
    /// See [`RetryPolicy::execute`].
    pub async fn with_retry<T, E, F, Fut>(
        &self,
        operation: &str,
        policy: &RetryPolicy,
        mut op: F,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + ErrorClass + 'static,
    {
        let started = Instant::now();
        let result = policy
            .execute(|| {
                self.metrics.record_attempt(operation);
                op()
            })
            .await;

        let latency = started.elapsed();
        match &result {
            Ok(_) => self.metrics.record_success(operation, latency),
            Err(_) => self.metrics.record_failure(operation, latency),
        }
        result
    }

    /// Run `op` behind the named circuit breaker, creating the breaker on
    /// first use.
    ///
    /// # Errors
    ///
    /// See [`CircuitBreaker::call`](crate::CircuitBreaker::call); rejections
    /// count as failures under `operation`.
    pub async fn with_circuit_breaker<T, E, F, Fut>(
        &self,
        operation: &str,
        config: &BreakerConfig,
        op: F,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        let breaker = self.breakers.get_or_create(config);
        self.metrics.record_attempt(operation);

        let started = Instant::now();
        let result = breaker.call(op).await;
        let latency = started.elapsed();

        match &result {
            Ok(_) => self.metrics.record_success(operation, latency),
            Err(_) => self.metrics.record_failure(operation, latency),
        }
        result
    }

    /// Run `op` with the given fallback chain.
    ///
    /// A call served by a fallback strategy records both the primary
    /// failure and the overall success, plus the fallback flag.
    ///
    /// # Errors
    ///
    /// See [`FallbackChain::execute`].
    pub async fn with_fallback<T, E, F, Fut>(
        &self,
        operation: &str,
        chain: &FallbackChain<T, E>,
        op: F,
    ) -> Result<T, ResilienceError<E>>
    where
        T: Send + 'static,
        E: std::error::Error + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.metrics.record_attempt(operation);
        let started = Instant::now();

        match chain.execute(op).await {
            Ok(outcome) => {
                let latency = started.elapsed();
                if outcome.fallback_used {
                    self.metrics.record_failure(operation, latency);
                    self.metrics.record_fallback(operation);
                }
                self.metrics.record_success(operation, latency);
                Ok(outcome.value)
            }
            Err(err) => {
                self.metrics.record_failure(operation, started.elapsed());
                Err(err)
            }
        }
    }

    /// Metrics snapshot of a named breaker.
    pub fn circuit_breaker_metrics(&self, name: &str) -> Option<BreakerMetrics> {
        self.breakers.metrics(name)
    }

    /// Metrics snapshot of a named operation.
    pub fn metrics(&self, operation: &str) -> Option<OperationMetrics> {
        self.metrics.get(operation)
    }

    /// Clear one operation's metrics.
    pub fn reset_metrics(&self, operation: &str) {
        self.metrics.reset(operation);
    }
}
