//! The agent runtime registry and its activity router.

// Layer 1: Standard library imports
use std::sync::{Arc, Weak};
use std::time::Duration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

// Layer 3: Internal module imports
use super::error::RegistryError;
use super::handle::AgentHandle;
use crate::activity::Activity;
use crate::mailbox::{MailboxConfig, PriorityMailbox, Subscription};
use crate::monitoring::{Monitor, NoopMonitor, RuntimeEvent};
use crate::runtime::cell::StateCell;
use crate::runtime::processor::spawn_processing_loop;
use crate::runtime::state::{AgentState, AgentStatus};
use crate::util::AgentRuntimeId;
use crate::workflow::{ActivityRouter, Workflow, WorkflowError};

/// How long `terminate` waits for a loop to observe cancellation before
/// aborting its task.
const TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything the registry owns for one live runtime.
///
/// The workflow itself is owned by the loop task behind `loop_handle`;
/// dropping the entry after cancellation releases all of it.
struct RuntimeEntry<S> {
    cell: StateCell<S>,
    mailbox: PriorityMailbox,
    token: CancellationToken,
    loop_handle: JoinHandle<()>,
}

struct RegistryShared<S> {
    entries: DashMap<AgentRuntimeId, RuntimeEntry<S>>,
    mailbox_config: MailboxConfig,
    monitor: Arc<dyn Monitor>,
}

/// Registry of agent runtimes keyed by [`AgentRuntimeId`].
///
/// `create` and `terminate` are linearizable with respect to `send`,
/// `get_state` and `subscribe`: an operation observed after a successful
/// terminate fails with `NotFound`. Clones share the same entries.
///
/// # Example
/// ```rust
/// use agentsys_rt::activity::{Activity, ActivityType};
/// use agentsys_rt::registry::AgentRegistry;
/// use agentsys_rt::util::AgentRuntimeId;
/// use agentsys_rt::workflow::{FnWorkflow, WorkflowError};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let registry: AgentRegistry<u64> = AgentRegistry::new();
/// let id = AgentRuntimeId::new("counter").unwrap();
///
/// let workflow = FnWorkflow::new(|_activity: &Activity, state: u64| {
///     Ok::<_, WorkflowError>(state + 1)
/// });
/// let handle = registry.create(id.clone(), 0, workflow).unwrap();
///
/// handle
///     .send(Activity::new(id.clone(), ActivityType::Command, json!(null)))
///     .await
///     .unwrap();
///
/// registry.terminate(&id).await.unwrap();
/// # }
/// ```
pub struct AgentRegistry<S> {
    shared: Arc<RegistryShared<S>>,
}

impl<S> Clone for AgentRegistry<S> {
    /// Cheap clone via `Arc`; all clones share the same entries.
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> Default for AgentRegistry<S>
where
    S: Clone + Serialize + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> AgentRegistry<S>
where
    S: Clone + Serialize + Send + Sync + 'static,
{
    /// Create a registry with default mailbox configuration and no monitor.
    pub fn new() -> Self {
        Self::with_config(MailboxConfig::default())
    }

    /// Create a registry whose runtimes use the given mailbox configuration.
    pub fn with_config(mailbox_config: MailboxConfig) -> Self {
        Self::with_parts(mailbox_config, Arc::new(NoopMonitor))
    }

    /// Create a registry with explicit mailbox configuration and monitor.
    pub fn with_parts(mailbox_config: MailboxConfig, monitor: Arc<dyn Monitor>) -> Self {
        Self {
            shared: Arc::new(RegistryShared {
                entries: DashMap::new(),
                mailbox_config,
                monitor,
            }),
        }
    }

    /// Create a runtime: allocate its mailbox and state cell, spawn its
    /// processing loop, and return a handle.
    ///
    /// # Errors
    ///
    /// [`RegistryError::AlreadyExists`] when the id is registered. No
    /// partial state is retained on failure.
    pub fn create<W>(
        &self,
        id: AgentRuntimeId,
        initial_state: S,
        workflow: W,
    ) -> Result<AgentHandle<S>, RegistryError>
    where
        W: Workflow<S>,
    {
        let config = self.shared.mailbox_config.clone();
        self.create_with_config(id, initial_state, workflow, config)
    }

    /// As [`create`](Self::create), with a per-runtime mailbox
    /// configuration overriding the registry default.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    pub fn create_with_config<W>(
        &self,
        id: AgentRuntimeId,
        initial_state: S,
        workflow: W,
        mailbox_config: MailboxConfig,
    ) -> Result<AgentHandle<S>, RegistryError>
    where
        W: Workflow<S>,
    {
        match self.shared.entries.entry(id.clone()) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                let mailbox = PriorityMailbox::new(mailbox_config);
                let cell = StateCell::new(AgentState::new(id.clone(), initial_state));
                let token = CancellationToken::new();
                let loop_handle = spawn_processing_loop(
                    id.clone(),
                    cell.clone(),
                    mailbox.clone(),
                    workflow,
                    token.clone(),
                    Arc::clone(&self.shared.monitor),
                );
                slot.insert(RuntimeEntry {
                    cell,
                    mailbox,
                    token,
                    loop_handle,
                });

                self.shared.monitor.record(RuntimeEvent::created(&id));
                tracing::debug!(agent_runtime_id = %id, "agent runtime created");
                Ok(AgentHandle::new(id, self.clone()))
            }
        }
    }

    /// Enqueue an activity for the runtime named by `id`.
    ///
    /// Returning `Ok` means the mailbox accepted the activity, not that it
    /// was processed; callers needing a happens-after must subscribe and
    /// await the corresponding state change.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] for unknown or terminated runtimes,
    /// [`RegistryError::Mailbox`] when the mailbox is full past its
    /// backpressure timeout or already shut down.
    pub async fn send(&self, id: &AgentRuntimeId, activity: Activity) -> Result<(), RegistryError> {
        // Clone the mailbox out of the map; offering must not hold a
        // map reference across the await.
        let mailbox = self
            .shared
            .entries
            .get(id)
            .map(|entry| entry.mailbox.clone())
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        Ok(mailbox.offer(activity).await?)
    }

    /// Snapshot the observable state of a runtime.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] for unknown or terminated runtimes.
    pub fn get_state(&self, id: &AgentRuntimeId) -> Result<AgentState<S>, RegistryError> {
        self.shared
            .entries
            .get(id)
            .map(|entry| entry.cell.snapshot())
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Subscribe to the activity stream of a runtime.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] for unknown or terminated runtimes.
    pub fn subscribe(&self, id: &AgentRuntimeId) -> Result<Subscription, RegistryError> {
        self.shared
            .entries
            .get(id)
            .map(|entry| entry.mailbox.subscribe())
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Terminate a runtime: interrupt its loop, shut its mailbox down and
    /// drop the entry.
    ///
    /// Idempotent in observable effect: a second call returns `NotFound`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] when the id is not registered.
    pub async fn terminate(&self, id: &AgentRuntimeId) -> Result<(), RegistryError> {
        let (_, entry) = self
            .shared
            .entries
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        let RuntimeEntry {
            cell,
            mailbox,
            token,
            mut loop_handle,
        } = entry;

        mailbox.shutdown();
        token.cancel();

        if timeout(TERMINATE_TIMEOUT, &mut loop_handle).await.is_err() {
            // A non-cancellable workflow is still running; cut the task.
            loop_handle.abort();
            cell.update(|state| state.status = AgentStatus::Terminated);
            mailbox.close_subscribers();
            self.shared.monitor.record(RuntimeEvent::terminated(id));
            tracing::warn!(agent_runtime_id = %id, "processing loop aborted after terminate timeout");
        }

        tracing::debug!(agent_runtime_id = %id, "agent runtime terminated");
        Ok(())
    }

    /// Terminate every runtime. Explicit teardown hook for embedders and
    /// tests.
    pub async fn shutdown(&self) {
        let ids: Vec<AgentRuntimeId> = self
            .shared
            .entries
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for id in ids {
            let _ = self.terminate(&id).await;
        }
    }

    /// Number of live runtimes.
    pub fn runtime_count(&self) -> usize {
        self.shared.entries.len()
    }

    /// Whether the id names a live runtime.
    pub fn contains(&self, id: &AgentRuntimeId) -> bool {
        self.shared.entries.contains_key(id)
    }

    /// An [`ActivityRouter`] backed by this registry through a weak
    /// reference, for machine-shaped workflows. Routing after the registry
    /// is gone fails the emitting workflow instead of keeping the registry
    /// alive.
    pub fn router(&self) -> Arc<dyn ActivityRouter> {
        Arc::new(RegistryRouter {
            shared: Arc::downgrade(&self.shared),
        })
    }
}

/// Weak-handle router dispatching effects through the registry.
pub struct RegistryRouter<S> {
    shared: Weak<RegistryShared<S>>,
}

#[async_trait]
impl<S> ActivityRouter for RegistryRouter<S>
where
    S: Clone + Serialize + Send + Sync + 'static,
{
    async fn route(&self, activity: Activity) -> Result<(), WorkflowError> {
        let shared = self.shared.upgrade().ok_or_else(|| WorkflowError::Effect {
            description: "registry no longer available".to_string(),
        })?;

        let id = activity.agent_runtime_id.clone();
        let mailbox = shared
            .entries
            .get(&id)
            .map(|entry| entry.mailbox.clone())
            .ok_or_else(|| WorkflowError::Effect {
                description: format!("agent runtime not found: {id}"),
            })?;

        mailbox
            .offer(activity)
            .await
            .map_err(|err| WorkflowError::Effect {
                description: format!("delivery to {id} failed: {err}"),
            })
    }
}
