//! Observable runtime state and processing statistics.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::Serialize;

// Layer 3: Internal module imports
use crate::util::AgentRuntimeId;

/// Lifecycle status of an agent runtime.
///
/// # State transitions
///
/// ```text
/// Idle --take--> Processing --success--> Idle
///                           --failure--> Error --next take--> Processing
/// any --terminate--> Terminated (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    /// Waiting for the next activity
    Idle,
    /// A workflow invocation is in flight
    Processing,
    /// The last workflow invocation failed; the loop keeps running
    Error,
    /// The runtime was terminated; no further transitions
    Terminated,
}

impl AgentStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

/// Counters maintained by the processing loop.
///
/// `processed + failures` equals the number of activities the loop has
/// consumed since creation. The average covers successful invocations only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingStats {
    /// Successfully processed activities
    pub processed: u64,

    /// Failed workflow invocations
    pub failures: u64,

    /// Running mean duration of successful invocations
    pub avg_processing_time: Duration,

    /// Description of the most recent failure
    pub last_error: Option<String>,
}

impl ProcessingStats {
    /// Fold a successful invocation into the running mean.
    pub fn record_success(&mut self, elapsed: Duration) {
        self.processed += 1;
        let previous = self.avg_processing_time.as_secs_f64();
        let mean = previous + (elapsed.as_secs_f64() - previous) / self.processed as f64;
        self.avg_processing_time = Duration::from_secs_f64(mean.max(0.0));
    }

    /// Record a failed invocation.
    pub fn record_failure(&mut self, description: String) {
        self.failures += 1;
        self.last_error = Some(description);
    }

    /// Total activities consumed by the loop.
    pub fn consumed(&self) -> u64 {
        self.processed + self.failures
    }
}

/// Observable snapshot of an agent runtime.
///
/// `last_updated` is monotonically non-decreasing for a given runtime; the
/// state cell enforces this on every update.
#[derive(Debug, Clone, Serialize)]
pub struct AgentState<S> {
    /// Runtime identity
    pub id: AgentRuntimeId,

    /// User state advanced by the workflow
    pub state: S,

    /// Lifecycle status
    pub status: AgentStatus,

    /// Timestamp of the most recent update
    pub last_updated: DateTime<Utc>,

    /// Description of the current error, cleared on the next success
    pub error: Option<String>,

    /// Processing counters
    pub processing: ProcessingStats,
}

impl<S> AgentState<S> {
    /// Initial state for a freshly created runtime.
    pub fn new(id: AgentRuntimeId, state: S) -> Self {
        Self {
            id,
            state,
            status: AgentStatus::Idle,
            last_updated: Utc::now(),
            error: None,
            processing: ProcessingStats::default(),
        }
    }
}
