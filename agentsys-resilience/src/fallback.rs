//! Ordered, condition-gated fallback chains.

// Layer 1: Standard library imports
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::time::timeout;

// Layer 3: Internal module imports
use crate::error::ResilienceError;

/// One alternate strategy in a fallback chain.
///
/// A strategy runs only when its `condition` holds on the error currently in
/// hand, which may be the primary operation's error or the error (or
/// timeout) of an earlier strategy.
#[derive(Clone)]
pub struct FallbackStrategy<T, E>
where
    E: std::error::Error + 'static,
{
    name: String,
    priority: u32,
    condition: Arc<dyn Fn(&ResilienceError<E>) -> bool + Send + Sync>,
    handler: Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>,
    timeout: Option<Duration>,
}

impl<T, E> FallbackStrategy<T, E>
where
    T: Send + 'static,
    E: std::error::Error + 'static,
{
    /// Create a strategy from its condition and handler.
    ///
    /// Lower `priority` values are tried first; ties keep insertion order.
    pub fn new<C, H, Fut>(name: impl Into<String>, priority: u32, condition: C, handler: H) -> Self
    where
        C: Fn(&ResilienceError<E>) -> bool + Send + Sync + 'static,
        H: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            name: name.into(),
            priority,
            condition: Arc::new(condition),
            handler: Arc::new(move || handler().boxed()),
            timeout: None,
        }
    }

    /// Builder method: bound the handler's execution time.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Strategy name, used in timeout errors and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Strategy priority.
    pub fn priority(&self) -> u32 {
        self.priority
    }
}

/// Successful result of a fallback chain execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackOutcome<T> {
    /// The produced value
    pub value: T,
    /// Whether an alternate strategy (not the primary op) produced it
    pub fallback_used: bool,
    /// Name of the producing strategy, when one was used
    pub strategy: Option<String>,
}

/// Ordered set of fallback strategies wrapped around a primary operation.
///
/// # Example
///
/// ```rust,ignore
/// let chain = FallbackChain::new()
///     .with_strategy(FallbackStrategy::new("cache", 1, is_network, read_cache))
///     .with_strategy(FallbackStrategy::new("static", 2, any_error, serve_static));
/// let outcome = chain.execute(|| fetch_live()).await?;
/// ```
pub struct FallbackChain<T, E>
where
    E: std::error::Error + 'static,
{
    strategies: Vec<FallbackStrategy<T, E>>,
}

impl<T, E> Default for FallbackChain<T, E>
where
    T: Send + 'static,
    E: std::error::Error + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> FallbackChain<T, E>
where
    T: Send + 'static,
    E: std::error::Error + 'static,
{
    /// An empty chain: the primary operation stands alone.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Builder method: append a strategy.
    pub fn with_strategy(mut self, strategy: FallbackStrategy<T, E>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Number of registered strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether the chain has no strategies.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run the primary operation, then strategies in ascending priority.
    ///
    /// Scanning is single-pass: after strategy `i` fails, only strategies
    /// after `i` whose condition holds on the new error are considered. A
    /// strategy timeout surfaces as `StrategyTimeout` to later conditions.
    ///
    /// # Errors
    ///
    /// The last error in hand when no further strategy matches.
    pub async fn execute<F, Fut>(&self, op: F) -> Result<FallbackOutcome<T>, ResilienceError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut current = match op().await {
            Ok(value) => {
                return Ok(FallbackOutcome {
                    value,
                    fallback_used: false,
                    strategy: None,
                })
            }
            Err(err) => ResilienceError::Inner(err),
        };

        let mut ordered: Vec<&FallbackStrategy<T, E>> = self.strategies.iter().collect();
        ordered.sort_by_key(|strategy| strategy.priority);

        for strategy in ordered {
            if !(strategy.condition)(&current) {
                continue;
            }

            tracing::debug!(strategy = strategy.name(), "trying fallback strategy");
            let attempt = (strategy.handler)();
            let result = match strategy.timeout {
                Some(limit) => match timeout(limit, attempt).await {
                    Ok(result) => result,
                    Err(_elapsed) => {
                        current = ResilienceError::StrategyTimeout {
                            strategy: strategy.name.clone(),
                            timeout: limit,
                        };
                        continue;
                    }
                },
                None => attempt.await,
            };

            match result {
                Ok(value) => {
                    return Ok(FallbackOutcome {
                        value,
                        fallback_used: true,
                        strategy: Some(strategy.name.clone()),
                    })
                }
                Err(err) => current = ResilienceError::Inner(err),
            }
        }

        Err(current)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests are allowed to use unwrap for simplicity
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use std::sync::atomic::{AtomicU32, Ordering};
    use thiserror::Error;

    #[derive(Debug, Clone, Error)]
    enum TestError {
        #[error("network down")]
        Network,
        #[error("slow upstream")]
        Timeout,
    }

    impl ErrorClass for TestError {
        fn error_tag(&self) -> &str {
            match self {
                Self::Network => "network",
                Self::Timeout => "timeout",
            }
        }
    }

    fn tag_is(tag: &'static str) -> impl Fn(&ResilienceError<TestError>) -> bool {
        move |err| err.error_tag() == tag
    }

    fn any(_: &ResilienceError<TestError>) -> bool {
        true
    }

    #[tokio::test]
    async fn test_primary_success_skips_strategies() {
        let invoked = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&invoked);
        let chain = FallbackChain::new().with_strategy(FallbackStrategy::new(
            "unused",
            1,
            any,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok("fallback".to_string()) }
            },
        ));

        let outcome = chain
            .execute(|| async { Ok::<_, TestError>("primary".to_string()) })
            .await
            .unwrap();

        assert_eq!(outcome.value, "primary");
        assert!(!outcome.fallback_used);
        assert!(outcome.strategy.is_none());
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_matching_strategy_wins() {
        let chain = FallbackChain::new()
            .with_strategy(FallbackStrategy::new("net", 1, tag_is("network"), || {
                async { Ok("from net fallback".to_string()) }
            }))
            .with_strategy(FallbackStrategy::new("any", 2, any, || async {
                Ok("from catch-all".to_string())
            }));

        let outcome = chain
            .execute(|| async { Err::<String, _>(TestError::Network) })
            .await
            .unwrap();

        assert!(outcome.fallback_used);
        assert_eq!(outcome.strategy.as_deref(), Some("net"));
        assert_eq!(outcome.value, "from net fallback");
    }

    #[tokio::test]
    async fn test_condition_gates_strategy() {
        let invoked = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&invoked);
        let chain = FallbackChain::new()
            .with_strategy(FallbackStrategy::new(
                "timeout-only",
                1,
                tag_is("timeout"),
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok("never".to_string()) }
                },
            ))
            .with_strategy(FallbackStrategy::new("net", 2, tag_is("network"), || {
                async { Ok("matched".to_string()) }
            }));

        let outcome = chain
            .execute(|| async { Err::<String, _>(TestError::Network) })
            .await
            .unwrap();

        assert_eq!(outcome.value, "matched");
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_priority_order_beats_insertion_order() {
        let chain = FallbackChain::new()
            .with_strategy(FallbackStrategy::new("second", 2, any, || async {
                Ok("second".to_string())
            }))
            .with_strategy(FallbackStrategy::new("first", 1, any, || async {
                Ok("first".to_string())
            }));

        let outcome = chain
            .execute(|| async { Err::<String, _>(TestError::Network) })
            .await
            .unwrap();
        assert_eq!(outcome.value, "first");
    }

    #[tokio::test]
    async fn test_timeout_flows_to_next_condition() {
        let chain = FallbackChain::new()
            .with_strategy(
                FallbackStrategy::new("slow", 1, tag_is("network"), || async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok("too late".to_string())
                })
                .with_timeout(Duration::from_millis(20)),
            )
            .with_strategy(FallbackStrategy::new(
                "after-timeout",
                2,
                tag_is("timeout"),
                || async { Ok("backup".to_string()) },
            ));

        let outcome = chain
            .execute(|| async { Err::<String, _>(TestError::Network) })
            .await
            .unwrap();

        assert!(outcome.fallback_used);
        assert_eq!(outcome.strategy.as_deref(), Some("after-timeout"));
        assert_eq!(outcome.value, "backup");
    }

    #[tokio::test]
    async fn test_all_strategies_fail_propagates_last_error() {
        let chain = FallbackChain::new()
            .with_strategy(FallbackStrategy::new("a", 1, any, || async {
                Err::<String, _>(TestError::Timeout)
            }))
            .with_strategy(FallbackStrategy::new("b", 2, any, || async {
                Err::<String, _>(TestError::Network)
            }));

        let err = chain
            .execute(|| async { Err::<String, _>(TestError::Network) })
            .await
            .unwrap_err();

        assert!(matches!(err, ResilienceError::Inner(TestError::Network)));
    }

    #[tokio::test]
    async fn test_no_matching_strategy_propagates_primary_error() {
        let chain = FallbackChain::new().with_strategy(FallbackStrategy::new(
            "timeout-only",
            1,
            tag_is("timeout"),
            || async { Ok("never".to_string()) },
        ));

        let err = chain
            .execute(|| async { Err::<String, _>(TestError::Network) })
            .await
            .unwrap_err();
        assert!(matches!(err, ResilienceError::Inner(TestError::Network)));
    }

    #[tokio::test]
    async fn test_empty_chain_is_pass_through() {
        let chain: FallbackChain<String, TestError> = FallbackChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);

        let ok = chain
            .execute(|| async { Ok::<_, TestError>("v".to_string()) })
            .await
            .unwrap();
        assert_eq!(ok.value, "v");
    }
}
