//! # agentsys-rt - Supervised Agent Runtime Core
//!
//! Message-driven execution substrate for stateful agents. Each agent
//! runtime is an addressable, isolated unit that owns private state,
//! consumes a prioritized mailbox of activities, advances through a
//! user-supplied workflow function and exposes observable lifecycle state
//! and processing metrics.
//!
//! # Quick Start
//!
//! ```rust
//! use agentsys_rt::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. A registry owns every runtime it creates
//!     let registry: AgentRegistry<u64> = AgentRegistry::new();
//!     let id = AgentRuntimeId::new("counter")?;
//!
//!     // 2. Create a runtime from an initial state and a workflow
//!     let workflow = FnWorkflow::new(|_activity: &Activity, state: u64| {
//!         Ok::<_, WorkflowError>(state + 1)
//!     });
//!     let handle = registry.create(id.clone(), 0, workflow)?;
//!
//!     // 3. Observe state changes while sending activities
//!     let mut changes = handle.subscribe()?;
//!     handle
//!         .send(Activity::new(id.clone(), ActivityType::Command, json!(null)))
//!         .await?;
//!
//!     // First the dequeued command, then the emitted state change
//!     changes.recv().await;
//!     let change = changes.recv().await.ok_or("stream ended")?;
//!     assert_eq!(change.payload, json!(1));
//!
//!     registry.terminate(&id).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Core Guarantees
//!
//! - **Serialized workflows**: at most one workflow invocation runs per
//!   runtime at any time; the processing loop is the only writer of the
//!   state cell.
//! - **Crash isolation**: a failing workflow is recorded on the state
//!   (status `Error`, failure counter) and never terminates the loop.
//! - **Bounded everything**: mailbox buckets, backpressure timeouts and
//!   subscriber channels are all bounded; a slow subscriber is dropped, the
//!   processing loop is never wedged by one.
//! - **Ownership without cycles**: the registry exclusively owns runtime
//!   entries; handles and effect routers refer back by id or weak
//!   reference, so terminate releases everything.
//!
//! # Module Organization
//!
//! ## Core Runtime
//! - [`activity`] - Activity envelope, type and priority classification
//! - [`mailbox`] - Prioritized bounded queue with subscriber broadcast
//! - [`runtime`] - State cell, runtime status and processing loop
//! - [`registry`] - Runtime registry, handles and effect routing
//!
//! ## Extension Points
//! - [`workflow`] - Function-shaped and machine-shaped workflow adapters
//! - [`monitoring`] - Pluggable lifecycle event hooks
//!
//! ## Infrastructure
//! - [`util`] - Identifier types
//!
//! # Scope
//!
//! Single-host and in-memory by design: no clustering, no durable message
//! persistence, at-most-once delivery within the process. Resilience
//! primitives (retry, circuit breaking, fallbacks) live in the sibling
//! `agentsys-resilience` crate and compose with any effectful operation,
//! including workflow internals.

pub mod activity;
pub mod mailbox;
pub mod monitoring;
pub mod registry;
pub mod runtime;
pub mod util;
pub mod workflow;

// Re-export commonly used types
pub use activity::{Activity, ActivityMetadata, ActivityType, Priority};
pub use mailbox::{MailboxConfig, MailboxError, PriorityMailbox, Subscription};
pub use monitoring::{
    EventSeverity, InMemoryMonitor, Monitor, NoopMonitor, RuntimeEvent, RuntimeEventKind,
};
pub use registry::{AgentHandle, AgentRegistry, RegistryError};
pub use runtime::{AgentState, AgentStatus, ProcessingStats, StateCell};
pub use util::{ActivityId, AgentRuntimeId, IdError};
pub use workflow::{
    ActivityRouter, Effect, FnWorkflow, Machine, MachineWorkflow, MergeWorkflow, Transition,
    Workflow, WorkflowContext, WorkflowError,
};

/// Convenience prelude for embedders.
pub mod prelude {
    pub use crate::activity::{Activity, ActivityType, Priority};
    pub use crate::mailbox::{MailboxConfig, PriorityMailbox};
    pub use crate::registry::{AgentHandle, AgentRegistry, RegistryError};
    pub use crate::runtime::{AgentState, AgentStatus};
    pub use crate::util::AgentRuntimeId;
    pub use crate::workflow::{FnWorkflow, MergeWorkflow, Workflow, WorkflowError};
}
