//! Registry error types.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use thiserror::Error;

// Layer 3: Internal
use crate::mailbox::MailboxError;
use crate::util::AgentRuntimeId;

/// Errors returned by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// `create` was called with an id that is already registered
    #[error("agent runtime already exists: {0}")]
    AlreadyExists(AgentRuntimeId),

    /// The id is not registered, or the runtime was terminated
    #[error("agent runtime not found: {0}")]
    NotFound(AgentRuntimeId),

    /// The destination mailbox refused the activity
    #[error("mailbox error: {0}")]
    Mailbox(#[from] MailboxError),
}

impl RegistryError {
    /// Whether the caller may reasonably retry the operation.
    ///
    /// Only mailbox backpressure is transient; a missing or duplicate id
    /// will not fix itself.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Mailbox(err) if err.is_transient())
    }
}
