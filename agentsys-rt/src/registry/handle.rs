//! Per-runtime handle returned by `create`.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::Serialize;

// Layer 3: Internal module imports
use super::agent_registry::AgentRegistry;
use super::error::RegistryError;
use crate::activity::Activity;
use crate::mailbox::Subscription;
use crate::runtime::state::AgentState;
use crate::util::AgentRuntimeId;

/// Handle to one agent runtime.
///
/// Holds the runtime id and a registry clone; every operation dispatches
/// through the registry, so a handle never keeps a terminated runtime's
/// resources alive. After terminate, handle operations return `NotFound`.
pub struct AgentHandle<S> {
    id: AgentRuntimeId,
    registry: AgentRegistry<S>,
}

impl<S> Clone for AgentHandle<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<S> AgentHandle<S>
where
    S: Clone + Serialize + Send + Sync + 'static,
{
    pub(crate) fn new(id: AgentRuntimeId, registry: AgentRegistry<S>) -> Self {
        Self { id, registry }
    }

    /// Identity of the runtime this handle refers to.
    pub fn id(&self) -> &AgentRuntimeId {
        &self.id
    }

    /// Enqueue an activity for this runtime.
    ///
    /// # Errors
    ///
    /// See [`AgentRegistry::send`].
    pub async fn send(&self, activity: Activity) -> Result<(), RegistryError> {
        self.registry.send(&self.id, activity).await
    }

    /// Snapshot the observable state of this runtime.
    ///
    /// # Errors
    ///
    /// See [`AgentRegistry::get_state`].
    pub fn get_state(&self) -> Result<AgentState<S>, RegistryError> {
        self.registry.get_state(&self.id)
    }

    /// Subscribe to this runtime's activity stream.
    ///
    /// # Errors
    ///
    /// See [`AgentRegistry::subscribe`].
    pub fn subscribe(&self) -> Result<Subscription, RegistryError> {
        self.registry.subscribe(&self.id)
    }
}
