// Layer 1: Standard library imports
use std::collections::HashMap;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// Layer 3: Internal module imports
use super::types::{ActivityType, Priority};
use crate::util::ids::{ActivityId, AgentRuntimeId};

/// Routing and scheduling metadata attached to an activity.
///
/// Unknown keys supplied by external collaborators are preserved verbatim in
/// `extra` and round-trip through serialization untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMetadata {
    /// Mailbox scheduling priority
    #[serde(default)]
    pub priority: Priority,

    /// Correlation id for request/response tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,

    /// Runtime that produced this activity, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_agent_runtime_id: Option<AgentRuntimeId>,

    /// Earliest time the activity should be acted upon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,

    /// Advisory processing deadline in milliseconds; workflows may honour it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Free-form keys preserved verbatim
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Immutable message envelope consumed by agent runtimes.
///
/// The payload is opaque JSON interpreted only by the workflow. Envelopes are
/// built once, then shared freely; the only field written after construction
/// is `sequence`, which the destination mailbox stamps at offer time so that
/// ordering is monotonic per runtime.
///
/// # Example
/// ```rust
/// use agentsys_rt::activity::{Activity, ActivityType, Priority};
/// use agentsys_rt::util::AgentRuntimeId;
/// use serde_json::json;
///
/// let target = AgentRuntimeId::new("planner").unwrap();
/// let activity = Activity::new(target, ActivityType::Command, json!({"step": 1}))
///     .with_priority(Priority::High);
///
/// assert_eq!(activity.activity_type, ActivityType::Command);
/// assert_eq!(activity.metadata.priority, Priority::High);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Unique id within this process run
    pub id: ActivityId,

    /// Destination runtime
    pub agent_runtime_id: AgentRuntimeId,

    /// Creation timestamp
    pub timestamp: DateTime<Utc>,

    /// Per-runtime monotonic sequence, assigned by the mailbox at offer time
    pub sequence: u64,

    /// Activity classification
    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    /// Opaque payload, interpreted by the workflow
    pub payload: Value,

    /// Routing and scheduling metadata
    #[serde(default)]
    pub metadata: ActivityMetadata,
}

impl Activity {
    /// Create an activity with a fresh id, the current timestamp and default
    /// metadata. The sequence is zero until a mailbox accepts the activity.
    pub fn new(agent_runtime_id: AgentRuntimeId, activity_type: ActivityType, payload: Value) -> Self {
        Self {
            id: ActivityId::new(),
            agent_runtime_id,
            timestamp: Utc::now(),
            sequence: 0,
            activity_type,
            payload,
            metadata: ActivityMetadata::default(),
        }
    }

    /// Builder method: replace the payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Builder method: set the scheduling priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.metadata.priority = priority;
        self
    }

    /// Builder method: set the correlation id.
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.metadata.correlation_id = Some(id);
        self
    }

    /// Builder method: record the producing runtime.
    pub fn with_source(mut self, source: AgentRuntimeId) -> Self {
        self.metadata.source_agent_runtime_id = Some(source);
        self
    }

    /// Builder method: defer the activity until the given instant.
    pub fn with_scheduled_for(mut self, when: DateTime<Utc>) -> Self {
        self.metadata.scheduled_for = Some(when);
        self
    }

    /// Builder method: set the advisory processing deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.metadata.timeout = Some(timeout.as_millis() as u64);
        self
    }

    /// Builder method: attach a free-form metadata key.
    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.extra.insert(key.into(), value);
        self
    }

    /// Whether the activity is deferred to a future instant.
    pub fn is_scheduled(&self) -> bool {
        self.metadata
            .scheduled_for
            .map(|when| when > Utc::now())
            .unwrap_or(false)
    }

    /// Stamp the per-runtime sequence. Called by the mailbox when the
    /// activity is accepted, and by the loop for emitted state changes.
    pub(crate) fn stamped(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}
