//! Workflow error types.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use thiserror::Error;

// Layer 3: Internal
use crate::activity::ActivityType;

/// Errors raised by workflow invocations.
///
/// A workflow error never terminates the processing loop; it is recorded on
/// the runtime state (status `Error`, failure counter incremented) and the
/// loop continues with the next activity.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The workflow does not handle this activity type
    #[error("unsupported activity type: {activity_type}")]
    UnsupportedActivity { activity_type: ActivityType },

    /// The payload did not have the shape the workflow requires
    #[error("invalid payload: {description}")]
    InvalidPayload { description: String },

    /// A side effect emitted by a machine could not be executed
    #[error("effect execution failed: {description}")]
    Effect { description: String },

    /// State could not be serialized or deserialized during a merge
    #[error("state codec failure")]
    StateCodec(#[from] serde_json::Error),

    /// Domain failure reported by user workflow code
    #[error("{description}")]
    Failed { description: String },
}

impl WorkflowError {
    /// Convenience constructor for domain failures.
    pub fn failed(description: impl Into<String>) -> Self {
        Self::Failed {
            description: description.into(),
        }
    }

    /// Convenience constructor for payload shape violations.
    pub fn invalid_payload(description: impl Into<String>) -> Self {
        Self::InvalidPayload {
            description: description.into(),
        }
    }
}
