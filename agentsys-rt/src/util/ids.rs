// Layer 1: Standard library imports
use std::fmt::{self, Display};
use std::str::FromStr;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// Layer 3: Internal module imports
// (none)

/// Errors raised while constructing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// Agent runtime identifiers must contain at least one non-whitespace character
    #[error("agent runtime id must not be empty")]
    Empty,
}

/// Addressable identifier for an agent runtime.
///
/// Runtime ids are caller-chosen strings (service names, session keys) rather
/// than generated UUIDs, so two processes coordinating over the same
/// configuration agree on addresses. Construction rejects empty or
/// whitespace-only values.
///
/// # Example
/// ```rust
/// use agentsys_rt::util::AgentRuntimeId;
///
/// let id = AgentRuntimeId::new("planner-1").unwrap();
/// assert_eq!(id.as_str(), "planner-1");
/// assert!(AgentRuntimeId::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentRuntimeId(String);

impl AgentRuntimeId {
    /// Create a runtime id, rejecting empty values.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Empty`] when the input is empty or whitespace-only.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(id))
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AgentRuntimeId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for AgentRuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AgentRuntimeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for activities within a process run.
///
/// Uses UUID v4 for collision resistance and cheap `Copy` cloning.
///
/// # Example
/// ```rust
/// use agentsys_rt::util::ActivityId;
///
/// let id1 = ActivityId::new();
/// let id2 = ActivityId::new();
/// assert_ne!(id1, id2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityId(Uuid);

impl ActivityId {
    /// Generate a new random ActivityId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an ActivityId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
