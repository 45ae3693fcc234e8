//! End-to-end tests for runtime lifecycle, ordering and shutdown behaviour.

#![allow(clippy::unwrap_used, clippy::panic)] // Tests are allowed to use unwrap for simplicity

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use agentsys_rt::activity::{Activity, ActivityType, Priority};
use agentsys_rt::mailbox::{MailboxConfig, MailboxError, PriorityMailbox};
use agentsys_rt::registry::{AgentRegistry, RegistryError};
use agentsys_rt::runtime::AgentStatus;
use agentsys_rt::util::AgentRuntimeId;
use agentsys_rt::workflow::{
    Effect, FnWorkflow, Machine, MachineWorkflow, MergeWorkflow, Transition, Workflow,
    WorkflowContext, WorkflowError,
};

use agentsys_resilience::{ErrorClass, RetryPolicy};

fn rid(name: &str) -> AgentRuntimeId {
    AgentRuntimeId::new(name).unwrap()
}

async fn wait_until<F>(mut check: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..400 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CounterState {
    count: u64,
}

/// Basic lifecycle: create, mutate through a state change, observe, terminate.
#[tokio::test]
async fn basic_lifecycle_create_send_observe_terminate() {
    let registry: AgentRegistry<CounterState> = AgentRegistry::new();
    let id = rid("a1");

    let handle = registry
        .create(id.clone(), CounterState { count: 0 }, MergeWorkflow::new())
        .unwrap();
    let mut changes = handle.subscribe().unwrap();

    handle
        .send(Activity::new(
            id.clone(),
            ActivityType::StateChange,
            json!({"count": 1}),
        ))
        .await
        .unwrap();

    // First the dequeued incoming activity, then the emitted state change.
    let incoming = changes.recv().await.unwrap();
    assert_eq!(incoming.activity_type, ActivityType::StateChange);
    assert_eq!(incoming.payload, json!({"count": 1}));

    let emitted = changes.recv().await.unwrap();
    assert_eq!(emitted.activity_type, ActivityType::StateChange);
    assert_eq!(emitted.payload, json!({"count": 1}));
    assert_eq!(emitted.metadata.source_agent_runtime_id, Some(id.clone()));

    let state = registry.get_state(&id).unwrap();
    assert_eq!(state.state, CounterState { count: 1 });
    assert_eq!(state.processing.processed, 1);
    assert_eq!(state.processing.failures, 0);
    assert_eq!(state.status, AgentStatus::Idle);

    registry.terminate(&id).await.unwrap();
    let rejected = registry
        .send(
            &id,
            Activity::new(id.clone(), ActivityType::StateChange, json!({"count": 2})),
        )
        .await;
    assert!(matches!(rejected, Err(RegistryError::NotFound(_))));
}

/// Priority ordering with anti-starvation: 100 HIGH and 10 NORMAL drain as
/// sixteen HIGH, one NORMAL, sixteen HIGH, one NORMAL and so on.
#[tokio::test]
async fn priority_ordering_with_anti_starvation() {
    let mailbox = PriorityMailbox::new(MailboxConfig::default());
    let id = rid("s2");

    // Interleave offers; FIFO per bucket makes offer order within a
    // priority the only order that matters.
    let mut highs = (0..100u64).map(|i| {
        Activity::new(id.clone(), ActivityType::Command, json!({"h": i}))
            .with_priority(Priority::High)
    });
    let mut normals = (0..10u64).map(|i| {
        Activity::new(id.clone(), ActivityType::Command, json!({"n": i}))
            .with_priority(Priority::Normal)
    });
    for round in 0..100 {
        if let Some(high) = highs.next() {
            mailbox.offer(high).await.unwrap();
        }
        if round % 10 == 0 {
            if let Some(normal) = normals.next() {
                mailbox.offer(normal).await.unwrap();
            }
        }
    }

    let mut order = Vec::new();
    for _ in 0..110 {
        let activity = mailbox.take().await.unwrap();
        order.push(activity.payload);
    }
    assert_eq!(order.len(), 110);

    // First sixteen dequeues are HIGH, the seventeenth is NORMAL.
    for payload in order.iter().take(16) {
        assert!(payload.get("h").is_some(), "expected HIGH, got {payload}");
    }
    assert!(order[16].get("n").is_some(), "17th dequeue must be NORMAL");

    // The pattern repeats while both buckets are non-empty.
    assert!(order[33].get("n").is_some(), "34th dequeue must be NORMAL");

    // FIFO within each priority.
    let high_values: Vec<u64> = order
        .iter()
        .filter_map(|p| p.get("h").and_then(|v| v.as_u64()))
        .collect();
    assert_eq!(high_values, (0..100).collect::<Vec<_>>());
    let normal_values: Vec<u64> = order
        .iter()
        .filter_map(|p| p.get("n").and_then(|v| v.as_u64()))
        .collect();
    assert_eq!(normal_values, (0..10).collect::<Vec<_>>());
}

/// Mailbox shutdown drains queued activities before ending the stream.
#[tokio::test]
async fn mailbox_shutdown_drains_then_rejects() {
    let mailbox = PriorityMailbox::new(MailboxConfig::default());
    let id = rid("s6");

    for i in 0..5u64 {
        mailbox
            .offer(Activity::new(id.clone(), ActivityType::Command, json!(i)))
            .await
            .unwrap();
    }
    mailbox.shutdown();

    for i in 0..5u64 {
        assert_eq!(mailbox.take().await.unwrap().payload, json!(i));
    }
    assert!(mailbox.take().await.is_none());

    let rejected = mailbox
        .offer(Activity::new(id, ActivityType::Command, json!(9)))
        .await;
    assert_eq!(rejected, Err(MailboxError::Shutdown));
}

/// processed + failures equals activities consumed; failures leave the loop
/// alive and the error recorded.
#[tokio::test]
async fn counters_account_for_every_dequeued_activity() {
    let registry: AgentRegistry<u64> = AgentRegistry::new();
    let id = rid("counters");

    let workflow = FnWorkflow::new(|activity: &Activity, state: u64| {
        match activity.payload.as_u64() {
            Some(value) => Ok(state + value),
            None => Err(WorkflowError::invalid_payload("expected a number")),
        }
    });
    registry.create(id.clone(), 0, workflow).unwrap();

    let payloads = [json!(1), json!("bad"), json!(2), json!("bad"), json!(3)];
    for payload in payloads {
        registry
            .send(
                &id,
                Activity::new(id.clone(), ActivityType::Command, payload),
            )
            .await
            .unwrap();
    }

    wait_until(|| {
        registry
            .get_state(&id)
            .map(|s| s.processing.consumed() == 5)
            .unwrap_or(false)
    })
    .await;

    let state = registry.get_state(&id).unwrap();
    assert_eq!(state.processing.processed, 3);
    assert_eq!(state.processing.failures, 2);
    assert_eq!(state.state, 6);
    assert!(state
        .processing
        .last_error
        .as_deref()
        .unwrap()
        .contains("expected a number"));

    registry.terminate(&id).await.unwrap();
}

/// Subscribers observe one state change per successful invocation, in
/// processing order with increasing sequences.
#[tokio::test]
async fn state_changes_delivered_in_processing_order() {
    let registry: AgentRegistry<u64> = AgentRegistry::new();
    let id = rid("ordered");

    let workflow =
        FnWorkflow::new(|_: &Activity, state: u64| Ok::<_, WorkflowError>(state + 1));
    let handle = registry.create(id.clone(), 0, workflow).unwrap();
    let mut subscription = handle.subscribe().unwrap();

    for _ in 0..5 {
        handle
            .send(Activity::new(id.clone(), ActivityType::Command, json!(null)))
            .await
            .unwrap();
    }

    let mut changes = Vec::new();
    let mut change_sequences = Vec::new();
    while changes.len() < 5 {
        let activity = subscription.recv().await.unwrap();
        if activity.activity_type == ActivityType::StateChange {
            changes.push(activity.payload.as_u64().unwrap());
            change_sequences.push(activity.sequence);
        }
    }
    assert_eq!(changes, vec![1, 2, 3, 4, 5]);
    assert!(change_sequences.windows(2).all(|pair| pair[0] < pair[1]));

    registry.terminate(&id).await.unwrap();
}

/// Terminate is idempotent and create/terminate returns the registry to its
/// prior shape.
#[tokio::test]
async fn terminate_round_trip_and_idempotence() {
    let registry: AgentRegistry<u64> = AgentRegistry::new();
    let id = rid("round-trip");
    assert_eq!(registry.runtime_count(), 0);

    let workflow = FnWorkflow::new(|_: &Activity, state: u64| Ok::<_, WorkflowError>(state));
    registry.create(id.clone(), 0, workflow).unwrap();
    assert_eq!(registry.runtime_count(), 1);

    registry.terminate(&id).await.unwrap();
    assert_eq!(registry.runtime_count(), 0);
    assert!(matches!(
        registry.terminate(&id).await,
        Err(RegistryError::NotFound(_))
    ));
    assert!(matches!(
        registry.get_state(&id),
        Err(RegistryError::NotFound(_))
    ));
}

/// A subscriber that stops reading is dropped; the runtime keeps processing.
#[tokio::test]
async fn slow_subscriber_dropped_without_stalling_runtime() {
    let config = MailboxConfig::builder()
        .with_subscriber_capacity(1)
        .with_subscriber_timeout(Duration::from_millis(10))
        .build()
        .unwrap();
    let registry: AgentRegistry<u64> = AgentRegistry::with_config(config);
    let id = rid("slow-sub");

    let workflow =
        FnWorkflow::new(|_: &Activity, state: u64| Ok::<_, WorkflowError>(state + 1));
    let handle = registry.create(id.clone(), 0, workflow).unwrap();

    // Subscribe and never read.
    let _stuck = handle.subscribe().unwrap();

    for _ in 0..10 {
        handle
            .send(Activity::new(id.clone(), ActivityType::Command, json!(null)))
            .await
            .unwrap();
    }
    wait_until(|| {
        registry
            .get_state(&id)
            .map(|s| s.processing.processed == 10)
            .unwrap_or(false)
    })
    .await;

    registry.terminate(&id).await.unwrap();
}

/// Machine-shaped workflows route effects to sibling runtimes through the
/// registry.
struct HandoffMachine {
    sibling: AgentRuntimeId,
}

impl Machine<u64> for HandoffMachine {
    fn on_activity(
        &self,
        activity: &Activity,
        state: u64,
    ) -> Result<Transition<u64>, WorkflowError> {
        if activity.activity_type != ActivityType::Command {
            return Err(WorkflowError::UnsupportedActivity {
                activity_type: activity.activity_type,
            });
        }
        let next = state + 1;
        let notify = Activity::new(
            self.sibling.clone(),
            ActivityType::Event,
            json!({"from_parent": next}),
        );
        Ok(Transition::to(next).with_effect(Effect::Send { activity: notify }))
    }
}

#[tokio::test]
async fn machine_workflow_routes_to_sibling_runtime() {
    let registry: AgentRegistry<u64> = AgentRegistry::new();
    let parent = rid("parent");
    let child = rid("child");

    let child_workflow = FnWorkflow::new(|activity: &Activity, state: u64| {
        Ok::<_, WorkflowError>(
            state
                + activity
                    .payload
                    .get("from_parent")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0),
        )
    });
    registry.create(child.clone(), 0, child_workflow).unwrap();

    let machine = MachineWorkflow::new(
        HandoffMachine {
            sibling: child.clone(),
        },
        registry.router(),
    );
    registry.create(parent.clone(), 0, machine).unwrap();

    registry
        .send(
            &parent,
            Activity::new(parent.clone(), ActivityType::Command, json!(null)),
        )
        .await
        .unwrap();

    wait_until(|| {
        registry
            .get_state(&child)
            .map(|s| s.state == 1)
            .unwrap_or(false)
    })
    .await;

    assert_eq!(registry.get_state(&parent).unwrap().state, 1);
    registry.shutdown().await;
}

/// A workflow may wrap its own effectful calls in resilience primitives.
#[derive(Debug, thiserror::Error)]
#[error("downstream unavailable")]
struct Downstream;

impl ErrorClass for Downstream {
    fn error_tag(&self) -> &str {
        "network"
    }
}

struct RetryingWorkflow {
    policy: RetryPolicy,
    attempts: Arc<AtomicU32>,
}

#[async_trait]
impl Workflow<u64> for RetryingWorkflow {
    async fn apply(
        &self,
        _activity: &Activity,
        state: u64,
        _ctx: &WorkflowContext,
    ) -> Result<u64, WorkflowError> {
        let attempts = Arc::clone(&self.attempts);
        self.policy
            .execute(|| {
                let attempts = Arc::clone(&attempts);
                async move {
                    // The downstream recovers on the third call.
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Downstream)
                    } else {
                        Ok(state + 1)
                    }
                }
            })
            .await
            .map_err(|err| WorkflowError::failed(err.to_string()))
    }
}

#[tokio::test]
async fn workflow_composes_with_retry_policy() {
    let registry: AgentRegistry<u64> = AgentRegistry::new();
    let id = rid("retrying");

    let attempts = Arc::new(AtomicU32::new(0));
    let workflow = RetryingWorkflow {
        policy: RetryPolicy::builder()
            .with_max_attempts(3)
            .with_base_delay(Duration::from_millis(1))
            .build()
            .unwrap(),
        attempts: Arc::clone(&attempts),
    };
    registry.create(id.clone(), 0, workflow).unwrap();

    registry
        .send(
            &id,
            Activity::new(id.clone(), ActivityType::Command, json!(null)),
        )
        .await
        .unwrap();

    wait_until(|| {
        registry
            .get_state(&id)
            .map(|s| s.state == 1)
            .unwrap_or(false)
    })
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    let state = registry.get_state(&id).unwrap();
    assert_eq!(state.processing.processed, 1);
    assert_eq!(state.processing.failures, 0);

    registry.terminate(&id).await.unwrap();
}
