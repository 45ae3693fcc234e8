//! Core workflow trait.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use super::context::WorkflowContext;
use super::error::WorkflowError;
use crate::activity::Activity;

/// The transition function of an agent runtime.
///
/// Invocations are serialized by the processing loop: at most one `apply`
/// runs per runtime at any time, so implementations may keep interior state
/// behind `&self` without additional locking, although deterministic
/// behaviour with respect to `(activity, state)` is expected.
///
/// # Example
///
/// ```rust
/// use agentsys_rt::activity::Activity;
/// use agentsys_rt::workflow::{Workflow, WorkflowContext, WorkflowError};
/// use async_trait::async_trait;
///
/// struct Counter;
///
/// #[async_trait]
/// impl Workflow<u64> for Counter {
///     async fn apply(
///         &self,
///         _activity: &Activity,
///         state: u64,
///         _ctx: &WorkflowContext,
///     ) -> Result<u64, WorkflowError> {
///         Ok(state + 1)
///     }
/// }
/// ```
#[async_trait]
pub trait Workflow<S>: Send + Sync + 'static {
    /// Advance the state in response to one activity.
    ///
    /// # Errors
    ///
    /// A returned [`WorkflowError`] is recorded on the runtime state; the
    /// processing loop continues with the next activity.
    async fn apply(
        &self,
        activity: &Activity,
        state: S,
        ctx: &WorkflowContext,
    ) -> Result<S, WorkflowError>;
}
