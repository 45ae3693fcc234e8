// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
// (none)

/// Classification of an activity as observed by the runtime core.
///
/// The core treats the payload as opaque; the type is the only part of an
/// activity it ever branches on (state-change fan-out, default workflow
/// handling). Serialized in SCREAMING_SNAKE_CASE so envelopes interoperate
/// with external collaborators byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    /// Imperative request directed at a runtime
    Command,
    /// Fact about something that happened elsewhere
    Event,
    /// Read-only request expecting a later Response
    Query,
    /// Answer correlated to an earlier Query or Command
    Response,
    /// Failure notification
    Error,
    /// State replacement or merge instruction; also emitted by the loop
    /// after every successful workflow invocation
    StateChange,
    /// Runtime housekeeping (shutdown notices, health probes)
    System,
}

impl Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Command => "COMMAND",
            Self::Event => "EVENT",
            Self::Query => "QUERY",
            Self::Response => "RESPONSE",
            Self::Error => "ERROR",
            Self::StateChange => "STATE_CHANGE",
            Self::System => "SYSTEM",
        };
        write!(f, "{name}")
    }
}

/// Mailbox scheduling priority for an activity.
///
/// Lower numeric value means earlier service. The mailbox drains the
/// highest-priority non-empty bucket first, with a bounded anti-starvation
/// escape hatch (see the mailbox module).
///
/// # Example
/// ```rust
/// use agentsys_rt::activity::Priority;
///
/// assert!(Priority::High.bucket() < Priority::Background.bucket());
/// assert_eq!(Priority::default(), Priority::Normal);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Priority {
    /// Time-sensitive activities serviced before all others
    High = 0,
    /// Default priority for routine activities
    Normal = 1,
    /// Deferrable activities
    Low = 2,
    /// Maintenance work serviced only when everything else is drained
    Background = 3,
}

impl Priority {
    /// All priorities in service order (highest first).
    pub const ALL: [Priority; 4] = [
        Priority::High,
        Priority::Normal,
        Priority::Low,
        Priority::Background,
    ];

    /// Mailbox bucket index for this priority.
    pub fn bucket(self) -> usize {
        self as usize
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::High),
            1 => Ok(Self::Normal),
            2 => Ok(Self::Low),
            3 => Ok(Self::Background),
            other => Err(format!("invalid priority value: {other}")),
        }
    }
}
