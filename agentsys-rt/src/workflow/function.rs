//! Function-shaped workflows.

// Layer 1: Standard library imports
use std::marker::PhantomData;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

// Layer 3: Internal module imports
use super::context::WorkflowContext;
use super::error::WorkflowError;
use super::traits::Workflow;
use crate::activity::{Activity, ActivityType};

/// Adapter turning a plain closure into a [`Workflow`].
///
/// # Example
///
/// ```rust
/// use agentsys_rt::activity::Activity;
/// use agentsys_rt::workflow::{FnWorkflow, WorkflowError};
///
/// let workflow = FnWorkflow::new(|_activity: &Activity, state: u32| {
///     Ok::<_, WorkflowError>(state + 1)
/// });
/// # let _ = workflow;
/// ```
pub struct FnWorkflow<F> {
    f: F,
}

impl<F> FnWorkflow<F> {
    /// Wrap a synchronous transition function.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<S, F> Workflow<S> for FnWorkflow<F>
where
    S: Send + 'static,
    F: Fn(&Activity, S) -> Result<S, WorkflowError> + Send + Sync + 'static,
{
    async fn apply(
        &self,
        activity: &Activity,
        state: S,
        _ctx: &WorkflowContext,
    ) -> Result<S, WorkflowError> {
        (self.f)(activity, state)
    }
}

/// Default function-shaped workflow: folds STATE_CHANGE payloads into the
/// state and rejects every other activity type.
///
/// The merge is a deep JSON object merge: object keys from the payload
/// override or extend the current state, nested objects merge recursively,
/// and non-object values replace outright.
///
/// # Example
///
/// ```rust
/// use agentsys_rt::workflow::MergeWorkflow;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct CounterState {
///     count: u64,
/// }
///
/// let workflow = MergeWorkflow::<CounterState>::new();
/// # let _ = workflow;
/// ```
pub struct MergeWorkflow<S> {
    _state: PhantomData<fn() -> S>,
}

impl<S> MergeWorkflow<S> {
    /// Create the default merge workflow.
    pub fn new() -> Self {
        Self {
            _state: PhantomData,
        }
    }
}

impl<S> Default for MergeWorkflow<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep-merge `patch` into `base`: objects merge key-wise, everything else
/// replaces.
fn merge_json(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match base_map.get_mut(key) {
                    Some(base_value) => merge_json(base_value, patch_value),
                    None => {
                        base_map.insert(key.clone(), patch_value.clone());
                    }
                }
            }
        }
        (base_slot, patch_value) => *base_slot = patch_value.clone(),
    }
}

#[async_trait]
impl<S> Workflow<S> for MergeWorkflow<S>
where
    S: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn apply(
        &self,
        activity: &Activity,
        state: S,
        _ctx: &WorkflowContext,
    ) -> Result<S, WorkflowError> {
        if activity.activity_type != ActivityType::StateChange {
            return Err(WorkflowError::UnsupportedActivity {
                activity_type: activity.activity_type,
            });
        }
        if !activity.payload.is_object() {
            return Err(WorkflowError::invalid_payload(
                "STATE_CHANGE payload must be a JSON object",
            ));
        }

        let mut merged = serde_json::to_value(&state)?;
        merge_json(&mut merged, &activity.payload);
        Ok(serde_json::from_value(merged)?)
    }
}
