//! Per-operation resilience metrics.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use serde::Serialize;

// Layer 3: Internal module imports
// (none)

/// Counters for one named operation.
///
/// Updated at the boundaries of retry, breaker and fallback calls made
/// through the [`Resilience`](crate::Resilience) facade.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationMetrics {
    /// Operation invocations, counting each retry attempt
    pub attempts: u64,
    /// Calls that produced a value
    pub successes: u64,
    /// Calls (or primary attempts) that failed
    pub failures: u64,
    /// Whether any call was served by a fallback strategy
    pub fallback_used: bool,
    /// Wall-clock duration of the most recent call
    pub last_latency: Option<Duration>,
}

/// Registry of operation metrics keyed by operation name.
///
/// Clones share the same counters; construct separate registries for test
/// isolation. Counters are cleared only by explicit reset.
#[derive(Debug, Clone, Default)]
pub struct MetricsRegistry {
    operations: Arc<DashMap<String, OperationMetrics>>,
}

impl MetricsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one operation attempt.
    pub fn record_attempt(&self, operation: &str) {
        self.operations
            .entry(operation.to_string())
            .or_default()
            .attempts += 1;
    }

    /// Count a successful call and its latency.
    pub fn record_success(&self, operation: &str, latency: Duration) {
        let mut entry = self.operations.entry(operation.to_string()).or_default();
        entry.successes += 1;
        entry.last_latency = Some(latency);
    }

    /// Count a failed call and its latency.
    pub fn record_failure(&self, operation: &str, latency: Duration) {
        let mut entry = self.operations.entry(operation.to_string()).or_default();
        entry.failures += 1;
        entry.last_latency = Some(latency);
    }

    /// Mark that a fallback strategy served this operation.
    pub fn record_fallback(&self, operation: &str) {
        self.operations
            .entry(operation.to_string())
            .or_default()
            .fallback_used = true;
    }

    /// Snapshot of one operation's counters.
    pub fn get(&self, operation: &str) -> Option<OperationMetrics> {
        self.operations.get(operation).map(|entry| entry.value().clone())
    }

    /// Names of every tracked operation.
    pub fn operation_names(&self) -> Vec<String> {
        self.operations
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Clear one operation's counters.
    pub fn reset(&self, operation: &str) {
        self.operations.remove(operation);
    }

    /// Clear every counter.
    pub fn reset_all(&self) {
        self.operations.clear();
    }
}
