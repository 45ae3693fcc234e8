//! Machine-shaped workflows: state machines with routed side effects.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use super::context::WorkflowContext;
use super::error::WorkflowError;
use super::traits::Workflow;
use crate::activity::Activity;

/// A side-effect request emitted by a machine transition.
///
/// Effects are executed by the [`MachineWorkflow`] adapter after the
/// transition has produced the new configuration; the machine itself never
/// performs IO.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Send an activity to the runtime named in its envelope
    Send { activity: Activity },
}

/// Result of one machine step: the next configuration plus emitted effects.
#[derive(Debug)]
pub struct Transition<S> {
    /// Next configuration
    pub state: S,
    /// Effects to execute through the router, in order
    pub effects: Vec<Effect>,
}

impl<S> Transition<S> {
    /// A transition with no side effects.
    pub fn to(state: S) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    /// Builder method: attach an effect.
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// A deterministic state machine advanced by activities.
///
/// Implementations map each activity to a [`Transition`]; unknown inputs
/// should return an error rather than silently keeping the configuration.
pub trait Machine<S>: Send + Sync + 'static {
    /// Compute the transition for one activity.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] when the activity cannot be mapped to a
    /// transition from the current configuration.
    fn on_activity(&self, activity: &Activity, state: S) -> Result<Transition<S>, WorkflowError>;
}

/// Destination for effects emitted by machine workflows.
///
/// The registry implements this through a weak reference to itself, so a
/// workflow holding a router never keeps the registry (or its own runtime
/// entry) alive.
#[async_trait]
pub trait ActivityRouter: Send + Sync {
    /// Deliver an activity to the runtime named in its envelope.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError::Effect`] when the destination does not
    /// exist or its mailbox refuses the activity.
    async fn route(&self, activity: Activity) -> Result<(), WorkflowError>;
}

/// Adapter driving a [`Machine`] as a [`Workflow`].
///
/// Effects are executed in emission order after the transition succeeds; a
/// failed effect fails the whole invocation, and the activity is recorded as
/// a failure without the new configuration being kept.
pub struct MachineWorkflow<M> {
    machine: M,
    router: Arc<dyn ActivityRouter>,
}

impl<M> MachineWorkflow<M> {
    /// Pair a machine with the router that will execute its effects.
    pub fn new(machine: M, router: Arc<dyn ActivityRouter>) -> Self {
        Self { machine, router }
    }
}

#[async_trait]
impl<S, M> Workflow<S> for MachineWorkflow<M>
where
    S: Send + 'static,
    M: Machine<S>,
{
    async fn apply(
        &self,
        activity: &Activity,
        state: S,
        _ctx: &WorkflowContext,
    ) -> Result<S, WorkflowError> {
        let transition = self.machine.on_activity(activity, state)?;
        for effect in transition.effects {
            match effect {
                Effect::Send { activity } => self.router.route(activity).await?,
            }
        }
        Ok(transition.state)
    }
}
