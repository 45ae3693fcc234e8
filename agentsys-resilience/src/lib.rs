//! # agentsys-resilience - Resilience Core
//!
//! Retry with capped exponential backoff, named circuit breakers with
//! CLOSED/OPEN/HALF_OPEN transitions, and prioritized fallback chains,
//! plus per-operation metrics. The sibling crate `agentsys-rt` hosts the
//! agent runtimes these primitives wrap; nothing here depends on it, so the
//! primitives compose around any effectful async operation.
//!
//! # Quick Start
//!
//! ```rust
//! use agentsys_resilience::{ErrorClass, Resilience, RetryPolicy};
//! use std::time::Duration;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("upstream unreachable")]
//! struct Unreachable;
//!
//! impl ErrorClass for Unreachable {
//!     fn error_tag(&self) -> &str {
//!         "network"
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let resilience = Resilience::new();
//!     let policy = RetryPolicy::builder()
//!         .with_max_attempts(3)
//!         .with_base_delay(Duration::from_millis(10))
//!         .with_retryable_error("network")
//!         .build()
//!         .unwrap();
//!
//!     let result = resilience
//!         .with_retry("ping", &policy, || async { Ok::<_, Unreachable>("pong") })
//!         .await;
//!     assert_eq!(result.unwrap(), "pong");
//! }
//! ```
//!
//! # Composition
//!
//! The primitives are independent and compose in any order: a retry around
//! a breaker-guarded call, a fallback chain whose primary is a retried
//! operation, and so on. Errors funnel through [`ResilienceError`], which
//! keeps the wrapped operation's error transparent and classifiable via
//! [`ErrorClass`] tags.
//!
//! # Module Organization
//!
//! - [`retry`] - Retry policies with backoff, jitter and classification
//! - [`breaker`] - Circuit breakers and the named breaker registry
//! - [`fallback`] - Condition-gated fallback chains with per-strategy timeouts
//! - [`metrics`] - Per-operation counters
//! - [`facade`] - The [`Resilience`] entry point wiring it together
//! - [`error`] - [`ResilienceError`] and the [`ErrorClass`] tag trait

pub mod breaker;
pub mod error;
pub mod facade;
pub mod fallback;
pub mod metrics;
pub mod retry;

// Re-export commonly used types
pub use breaker::{
    BreakerConfig, BreakerMetrics, BreakerRegistry, BreakerState, CircuitBreaker,
    DEFAULT_FAILURE_THRESHOLD, DEFAULT_HALF_OPEN_MAX_ATTEMPTS, DEFAULT_RESET_TIMEOUT,
};
pub use error::{ErrorClass, ResilienceError};
pub use facade::Resilience;
pub use fallback::{FallbackChain, FallbackOutcome, FallbackStrategy};
pub use metrics::{MetricsRegistry, OperationMetrics};
pub use retry::{
    RetryPolicy, RetryPolicyBuilder, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_BASE_DELAY,
    DEFAULT_JITTER_FACTOR, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
};
