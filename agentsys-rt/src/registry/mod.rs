//! Agent runtime registry: the owning map of live runtimes.
//!
//! The registry is the only owner of runtime entries (state cell, mailbox,
//! loop handle). Handles and routers refer back to it by id, never the other
//! way around, so terminating a runtime drops everything it owned.

pub mod agent_registry;
pub mod error;
pub mod handle;

pub use agent_registry::{AgentRegistry, RegistryRouter};
pub use error::RegistryError;
pub use handle::AgentHandle;
