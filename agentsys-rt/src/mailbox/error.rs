//! Mailbox error types.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use thiserror::Error;

// Layer 3: Internal
// (none)

/// Errors returned by mailbox offer operations.
///
/// The take side does not use this type: a drained, shut-down mailbox simply
/// ends the take stream with `None`.
///
/// # Examples
///
/// ```rust
/// use agentsys_rt::mailbox::MailboxError;
///
/// let err = MailboxError::Full { capacity: 100 };
/// assert!(err.is_transient());
/// assert!(err.to_string().contains("100"));
///
/// let err = MailboxError::Shutdown;
/// assert!(!err.is_transient());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailboxError {
    /// The destination bucket stayed full past the backpressure timeout
    #[error("mailbox is full (capacity: {capacity})")]
    Full { capacity: usize },

    /// The mailbox was shut down and accepts no further activities
    #[error("mailbox is shut down")]
    Shutdown,
}

impl MailboxError {
    /// Whether the caller may reasonably retry the offer later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Full { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_display() {
        let err = MailboxError::Full { capacity: 64 };
        let msg = err.to_string();
        assert!(msg.contains("full"));
        assert!(msg.contains("64"));
    }

    #[test]
    fn test_shutdown_display() {
        assert_eq!(MailboxError::Shutdown.to_string(), "mailbox is shut down");
    }

    #[test]
    fn test_transient_classification() {
        assert!(MailboxError::Full { capacity: 1 }.is_transient());
        assert!(!MailboxError::Shutdown.is_transient());
    }
}
