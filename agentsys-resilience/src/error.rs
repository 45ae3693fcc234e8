//! Resilience error taxonomy and classification.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
// (none)

/// Classification hook for retry and fallback gating.
///
/// Policies match on string tags rather than concrete error types, so the
/// same policy can wrap operations with different error enums. Tags are
/// short lower-case words: "network", "timeout", "validation".
///
/// # Example
///
/// ```rust
/// use agentsys_resilience::ErrorClass;
///
/// #[derive(Debug, thiserror::Error)]
/// enum FetchError {
///     #[error("connection refused")]
///     Network,
///     #[error("bad request")]
///     Validation,
/// }
///
/// impl ErrorClass for FetchError {
///     fn error_tag(&self) -> &str {
///         match self {
///             Self::Network => "network",
///             Self::Validation => "validation",
///         }
///     }
/// }
/// ```
pub trait ErrorClass {
    /// Stable tag naming the failure class.
    fn error_tag(&self) -> &str;
}

/// Failure reported by a resilience primitive wrapping an operation with
/// error type `E`.
///
/// `Inner` is transparent: an operation error that was not transformed by
/// any primitive keeps its message and source chain.
#[derive(Debug, Error)]
pub enum ResilienceError<E>
where
    E: std::error::Error + 'static,
{
    /// Every admitted attempt failed with a retryable error
    #[error("operation failed after {attempts} attempts")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: E,
    },

    /// A circuit breaker rejected the request without running the operation
    #[error("circuit breaker '{name}' is open")]
    CircuitOpen { name: String },

    /// A fallback strategy handler exceeded its per-strategy timeout
    #[error("fallback strategy '{strategy}' timed out after {timeout:?}")]
    StrategyTimeout { strategy: String, timeout: Duration },

    /// An external cancellation signal interrupted the waits
    #[error("operation cancelled")]
    Cancelled,

    /// The operation's own error, unchanged
    #[error(transparent)]
    Inner(E),
}

impl<E> ResilienceError<E>
where
    E: std::error::Error + 'static,
{
    /// Whether this is a breaker rejection.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }

    /// The operation error, when one was observed.
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            Self::RetryExhausted { source, .. } => Some(source),
            Self::Inner(inner) => Some(inner),
            _ => None,
        }
    }
}

impl<E> ErrorClass for ResilienceError<E>
where
    E: std::error::Error + ErrorClass + 'static,
{
    fn error_tag(&self) -> &str {
        match self {
            Self::RetryExhausted { source, .. } => source.error_tag(),
            Self::CircuitOpen { .. } => "circuit_open",
            Self::StrategyTimeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::Inner(inner) => inner.error_tag(),
        }
    }
}
