//! Per-invocation context handed to workflows.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use tokio_util::sync::CancellationToken;

// Layer 3: Internal module imports
use crate::util::AgentRuntimeId;

/// Context for a single workflow invocation.
///
/// Carries the identity of the invoking runtime and a cancellation token
/// derived from the runtime's lifetime. Cancellable workflows should check
/// the token at their own suspension points; non-cancellable workflows may
/// ignore it and are allowed to run to completion even across a terminate.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    agent_runtime_id: AgentRuntimeId,
    cancellation: CancellationToken,
}

impl WorkflowContext {
    pub(crate) fn new(agent_runtime_id: AgentRuntimeId, cancellation: CancellationToken) -> Self {
        Self {
            agent_runtime_id,
            cancellation,
        }
    }

    /// Identity of the runtime this invocation belongs to.
    pub fn agent_runtime_id(&self) -> &AgentRuntimeId {
        &self.agent_runtime_id
    }

    /// Cancellation token tied to the runtime's lifetime.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether the runtime was asked to terminate.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
