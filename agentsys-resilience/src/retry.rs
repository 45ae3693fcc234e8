//! Retry engine with capped exponential backoff and error classification.

// Layer 1: Standard library imports
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

// Layer 2: Third-party crate imports
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

// Layer 3: Internal module imports
use crate::error::{ErrorClass, ResilienceError};

/// Default maximum attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Default cap applied to computed delays
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Default backoff multiplier per attempt
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Default jitter factor when jitter is enabled
pub const DEFAULT_JITTER_FACTOR: f64 = 0.25;

/// Retry policy: capped attempts, exponential backoff, optional jitter and
/// tag-based error classification.
///
/// # Backoff formula
///
/// ```text
/// delay(k) = min(max_delay, base_delay * backoff_multiplier^(k-1))
/// ```
///
/// With jitter enabled the slept delay is sampled uniformly from
/// `[delay, delay * (1 + jitter_factor)]`.
///
/// # Classification
///
/// After a failed attempt the error's tag decides what happens next:
/// a tag in `non_retryable` propagates immediately; with a non-empty
/// `retryable` set, only listed tags are retried; an empty `retryable` set
/// retries everything not explicitly non-retryable.
///
/// # Example
///
/// ```rust
/// use agentsys_resilience::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .with_max_attempts(4)
///     .with_base_delay(Duration::from_millis(10))
///     .with_retryable_error("network")
///     .with_non_retryable_error("validation")
///     .build()
///     .unwrap();
///
/// assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(10));
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(20));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum operation invocations, including the first
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Cap applied to computed delays
    pub max_delay: Duration,

    /// Multiplier applied per attempt
    pub backoff_multiplier: f64,

    /// Whether sampled jitter is added to delays
    pub jitter: bool,

    /// Upper bound of the jitter fraction, in `[0, 1]`
    pub jitter_factor: f64,

    /// Tags that are retried; empty means retry everything not
    /// explicitly non-retryable
    pub retryable: HashSet<String>,

    /// Tags that stop retrying immediately
    pub non_retryable: HashSet<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            jitter: false,
            jitter_factor: DEFAULT_JITTER_FACTOR,
            retryable: HashSet::new(),
            non_retryable: HashSet::new(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy builder.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Validate configuration values.
    ///
    /// Returns `Err` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be >= 1".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err("backoff_multiplier must be >= 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err("jitter_factor must be within [0, 1]".to_string());
        }
        Ok(())
    }

    /// Backoff delay for a 1-indexed attempt, before jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63);
        let scaled = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent as i32);
        Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
    }

    /// Delay actually slept before the retry following `attempt`.
    fn sample_delay(&self, attempt: u32) -> Duration {
        let delay = self.delay_for_attempt(attempt);
        if !self.jitter || self.jitter_factor == 0.0 {
            return delay;
        }
        let factor = rand::thread_rng().gen_range(0.0..=self.jitter_factor);
        Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + factor))
    }

    /// Whether an error tag is eligible for another attempt.
    fn should_retry(&self, tag: &str) -> bool {
        if self.non_retryable.contains(tag) {
            return false;
        }
        self.retryable.is_empty() || self.retryable.contains(tag)
    }

    /// Run `op` under this policy.
    ///
    /// # Errors
    ///
    /// `ResilienceError::Inner` when a non-retryable error stops the loop
    /// (or when `max_attempts` is 1, so the error passes through unchanged),
    /// `ResilienceError::RetryExhausted` when every attempt failed with a
    /// retryable error.
    pub async fn execute<T, E, F, Fut>(&self, op: F) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + ErrorClass + 'static,
    {
        self.execute_inner(None, op).await
    }

    /// Run `op` under this policy, honouring `token` between and during
    /// waits.
    ///
    /// # Errors
    ///
    /// As [`execute`](Self::execute), plus `ResilienceError::Cancelled` when
    /// the token fires before the next attempt starts.
    pub async fn execute_cancellable<T, E, F, Fut>(
        &self,
        token: &CancellationToken,
        op: F,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + ErrorClass + 'static,
    {
        self.execute_inner(Some(token), op).await
    }

    async fn execute_inner<T, E, F, Fut>(
        &self,
        token: Option<&CancellationToken>,
        mut op: F,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + ErrorClass + 'static,
    {
        let mut attempt = 1u32;
        loop {
            if let Some(token) = token {
                if token.is_cancelled() {
                    return Err(ResilienceError::Cancelled);
                }
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !self.should_retry(err.error_tag()) {
                        return Err(ResilienceError::Inner(err));
                    }
                    if attempt >= self.max_attempts {
                        if self.max_attempts == 1 {
                            // Single-attempt policies pass the error through
                            // untouched.
                            return Err(ResilienceError::Inner(err));
                        }
                        return Err(ResilienceError::RetryExhausted {
                            attempts: attempt,
                            source: err,
                        });
                    }

                    let delay = self.sample_delay(attempt);
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        tag = err.error_tag(),
                        "retrying after failure"
                    );
                    match token {
                        Some(token) => {
                            tokio::select! {
                                _ = token.cancelled() => return Err(ResilienceError::Cancelled),
                                _ = sleep(delay) => {}
                            }
                        }
                        None => sleep(delay).await,
                    }
                    attempt += 1;
                }
            }
        }
    }
}

/// Builder for [`RetryPolicy`] with fluent API.
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Set the maximum number of invocations, including the first.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.policy.max_attempts = attempts;
        self
    }

    /// Set the delay before the first retry.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.policy.base_delay = delay;
        self
    }

    /// Set the cap applied to computed delays.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    /// Set the multiplier applied per attempt.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.policy.backoff_multiplier = multiplier;
        self
    }

    /// Enable or disable jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.policy.jitter = jitter;
        self
    }

    /// Set the jitter factor in `[0, 1]`.
    pub fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.policy.jitter_factor = factor;
        self
    }

    /// Add a tag to the retryable set.
    pub fn with_retryable_error(mut self, tag: impl Into<String>) -> Self {
        self.policy.retryable.insert(tag.into());
        self
    }

    /// Add a tag to the non-retryable set.
    pub fn with_non_retryable_error(mut self, tag: impl Into<String>) -> Self {
        self.policy.non_retryable.insert(tag.into());
        self
    }

    /// Build and validate the policy.
    ///
    /// Returns `Err` if the policy is invalid.
    pub fn build(self) -> Result<RetryPolicy, String> {
        self.policy.validate()?;
        Ok(self.policy)
    }
}
