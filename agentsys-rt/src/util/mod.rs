//! Shared utilities for the agent runtime.
//!
//! Identifier types live here so that every subsystem (activity envelope,
//! mailbox, registry, workflow) can refer to runtimes and activities without
//! pulling in the heavier modules.

pub mod ids;

pub use ids::{ActivityId, AgentRuntimeId, IdError};
