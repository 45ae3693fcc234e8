//! Runtime lifecycle event types.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::Serialize;

// Layer 3: Internal module imports
use crate::util::AgentRuntimeId;

/// Event severity levels for filtering and categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EventSeverity {
    /// Debug-level events for development
    Debug,
    /// Informational events for normal operations
    Info,
    /// Warning events for potential issues
    Warning,
    /// Error events for failures
    Error,
}

/// What happened to a runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RuntimeEventKind {
    /// A runtime was created and its loop spawned
    RuntimeCreated,
    /// The loop finished one activity successfully
    ActivityProcessed {
        /// Wall-clock duration of the workflow invocation
        elapsed: Duration,
    },
    /// A workflow invocation failed; the loop continues
    WorkflowFailed { description: String },
    /// The runtime reached its terminal status
    RuntimeTerminated,
}

/// One observed runtime lifecycle event.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeEvent {
    /// Runtime the event belongs to
    pub agent_runtime_id: AgentRuntimeId,
    /// Event classification
    pub kind: RuntimeEventKind,
    /// When the event was recorded
    pub timestamp: DateTime<Utc>,
}

impl RuntimeEvent {
    fn new(agent_runtime_id: &AgentRuntimeId, kind: RuntimeEventKind) -> Self {
        Self {
            agent_runtime_id: agent_runtime_id.clone(),
            kind,
            timestamp: Utc::now(),
        }
    }

    /// A runtime was created.
    pub fn created(id: &AgentRuntimeId) -> Self {
        Self::new(id, RuntimeEventKind::RuntimeCreated)
    }

    /// An activity was processed successfully.
    pub fn activity_processed(id: &AgentRuntimeId, elapsed: Duration) -> Self {
        Self::new(id, RuntimeEventKind::ActivityProcessed { elapsed })
    }

    /// A workflow invocation failed.
    pub fn workflow_failed(id: &AgentRuntimeId, description: String) -> Self {
        Self::new(id, RuntimeEventKind::WorkflowFailed { description })
    }

    /// A runtime terminated.
    pub fn terminated(id: &AgentRuntimeId) -> Self {
        Self::new(id, RuntimeEventKind::RuntimeTerminated)
    }

    /// Severity derived from the event kind.
    pub fn severity(&self) -> EventSeverity {
        match &self.kind {
            RuntimeEventKind::RuntimeCreated => EventSeverity::Info,
            RuntimeEventKind::ActivityProcessed { .. } => EventSeverity::Debug,
            RuntimeEventKind::WorkflowFailed { .. } => EventSeverity::Error,
            RuntimeEventKind::RuntimeTerminated => EventSeverity::Info,
        }
    }
}
