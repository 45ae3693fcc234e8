//! The per-runtime processing loop.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Instant;

// Layer 2: Third-party crate imports
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// Layer 3: Internal module imports
use super::cell::StateCell;
use super::state::AgentStatus;
use crate::activity::{Activity, ActivityType};
use crate::mailbox::PriorityMailbox;
use crate::monitoring::{Monitor, RuntimeEvent};
use crate::util::AgentRuntimeId;
use crate::workflow::{Workflow, WorkflowContext};

/// Spawn the processing loop for one runtime.
///
/// The loop serializes workflow invocations: it takes one activity at a
/// time, applies the workflow, records the outcome on the state cell and
/// broadcasts a STATE_CHANGE on success. A failing workflow never stops the
/// loop; only mailbox drain or cancellation does.
///
/// Cancellation is observed at the mailbox take. An in-flight workflow
/// invocation is allowed to finish; cancellable workflows additionally see
/// the signal through their [`WorkflowContext`] and may cut themselves
/// short.
pub(crate) fn spawn_processing_loop<S, W>(
    id: AgentRuntimeId,
    cell: StateCell<S>,
    mailbox: PriorityMailbox,
    workflow: W,
    token: CancellationToken,
    monitor: Arc<dyn Monitor>,
) -> JoinHandle<()>
where
    S: Clone + Serialize + Send + Sync + 'static,
    W: Workflow<S>,
{
    tokio::spawn(async move {
        loop {
            let activity = tokio::select! {
                _ = token.cancelled() => break,
                taken = mailbox.take() => match taken {
                    Some(activity) => activity,
                    None => break,
                },
            };

            process_one(&id, &cell, &mailbox, &workflow, &token, &monitor, activity).await;
        }

        cell.update(|state| state.status = AgentStatus::Terminated);
        mailbox.close_subscribers();
        monitor.record(RuntimeEvent::terminated(&id));
        tracing::debug!(agent_runtime_id = %id, "processing loop exited");
    })
}

async fn process_one<S, W>(
    id: &AgentRuntimeId,
    cell: &StateCell<S>,
    mailbox: &PriorityMailbox,
    workflow: &W,
    token: &CancellationToken,
    monitor: &Arc<dyn Monitor>,
    activity: Activity,
) where
    S: Clone + Serialize + Send + Sync + 'static,
    W: Workflow<S>,
{
    cell.update(|state| state.status = AgentStatus::Processing);
    let current = cell.snapshot().state;
    let ctx = WorkflowContext::new(id.clone(), token.child_token());

    let started = Instant::now();
    match workflow.apply(&activity, current, &ctx).await {
        Ok(new_state) => {
            let elapsed = started.elapsed();
            cell.update(|state| {
                state.state = new_state.clone();
                state.status = AgentStatus::Idle;
                state.error = None;
                state.processing.record_success(elapsed);
            });

            let payload = match serde_json::to_value(&new_state) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(
                        agent_runtime_id = %id,
                        error = %err,
                        "state not serializable for broadcast"
                    );
                    Value::Null
                }
            };
            let change = Activity::new(id.clone(), ActivityType::StateChange, payload)
                .with_source(id.clone())
                .stamped(mailbox.next_sequence());
            mailbox.broadcast(&change).await;

            monitor.record(RuntimeEvent::activity_processed(id, elapsed));
        }
        Err(err) => {
            let description = err.to_string();
            tracing::error!(
                agent_runtime_id = %id,
                activity_id = %activity.id,
                activity_type = %activity.activity_type,
                error = %err,
                "workflow invocation failed"
            );
            cell.update(|state| {
                state.status = AgentStatus::Error;
                state.error = Some(description.clone());
                state.processing.record_failure(description.clone());
            });
            monitor.record(RuntimeEvent::workflow_failed(id, description));
        }
    }
}
