//! The prioritized mailbox: bounded offer, blocking take, broadcast fan-out.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::{Notify, Semaphore};
use tokio::time::timeout;

// Layer 3: Internal module imports
use super::config::MailboxConfig;
use super::error::MailboxError;
use super::queue::BucketQueues;
use super::subscription::Subscription;
use crate::activity::{Activity, Priority};

/// Bounded multi-priority mailbox feeding a single processing loop.
///
/// Cloning is cheap and shares the underlying queues; the runtime hands
/// clones to the registry (for `send`) and to the processing loop (for
/// `take`). The take side assumes a single consumer, matching the
/// one-loop-per-runtime model.
///
/// # Example
/// ```rust
/// use agentsys_rt::activity::{Activity, ActivityType};
/// use agentsys_rt::mailbox::{MailboxConfig, PriorityMailbox};
/// use agentsys_rt::util::AgentRuntimeId;
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mailbox = PriorityMailbox::new(MailboxConfig::default());
/// let id = AgentRuntimeId::new("a1").unwrap();
///
/// mailbox
///     .offer(Activity::new(id, ActivityType::Command, json!(1)))
///     .await
///     .unwrap();
///
/// let taken = mailbox.take().await.unwrap();
/// assert_eq!(taken.payload, json!(1));
/// # }
/// ```
#[derive(Clone)]
pub struct PriorityMailbox {
    inner: Arc<MailboxInner>,
}

struct MailboxInner {
    config: MailboxConfig,
    queues: Mutex<BucketQueues>,
    /// One capacity semaphore per bucket; closed on shutdown
    space: Vec<Semaphore>,
    /// Signalled when an item is pushed or the mailbox shuts down
    item_notify: Notify,
    /// Per-mailbox activity sequence, shared with loop-emitted state changes
    sequence: AtomicU64,
    subscribers: Mutex<SubscriberSet>,
    next_subscriber_id: AtomicU64,
}

struct SubscriberSet {
    senders: HashMap<u64, mpsc::Sender<Activity>>,
    closed: bool,
}

impl PriorityMailbox {
    /// Create a mailbox from the given configuration.
    ///
    /// Configurations built through `MailboxConfig::builder` are already
    /// validated; a hand-rolled zero-capacity config never accepts an offer.
    pub fn new(config: MailboxConfig) -> Self {
        let prioritized = config.enable_prioritization;
        let bucket_count = if prioritized { 4 } else { 1 };
        let capacity = config.bucket_capacity();

        Self {
            inner: Arc::new(MailboxInner {
                space: (0..bucket_count).map(|_| Semaphore::new(capacity)).collect(),
                queues: Mutex::new(BucketQueues::new(prioritized)),
                item_notify: Notify::new(),
                sequence: AtomicU64::new(1),
                subscribers: Mutex::new(SubscriberSet {
                    senders: HashMap::new(),
                    closed: false,
                }),
                next_subscriber_id: AtomicU64::new(1),
                config,
            }),
        }
    }

    /// Enqueue an activity into the bucket selected by its priority.
    ///
    /// Stamps the per-mailbox sequence on acceptance. When the bucket is
    /// full, waits up to the configured backpressure timeout for space.
    ///
    /// # Errors
    ///
    /// [`MailboxError::Shutdown`] once [`shutdown`](Self::shutdown) was
    /// called, [`MailboxError::Full`] when the bucket stayed full past the
    /// backpressure timeout.
    pub async fn offer(&self, activity: Activity) -> Result<(), MailboxError> {
        let bucket = self
            .inner
            .queues
            .lock()
            .bucket_for(activity.metadata.priority);
        let capacity = self.inner.config.bucket_capacity();

        let permit = match timeout(
            self.inner.config.backpressure_timeout,
            self.inner.space[bucket].acquire(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_closed)) => return Err(MailboxError::Shutdown),
            Err(_elapsed) => return Err(MailboxError::Full { capacity }),
        };
        // The slot is handed to the queue; `take` returns it on dequeue.
        permit.forget();

        let sequence = self.inner.sequence.fetch_add(1, Ordering::Relaxed);
        {
            let mut queues = self.inner.queues.lock();
            if queues.shutdown {
                return Err(MailboxError::Shutdown);
            }
            queues.push(bucket, activity.stamped(sequence));
        }
        self.inner.item_notify.notify_one();
        Ok(())
    }

    /// Dequeue the next activity, blocking while the mailbox is open and
    /// empty.
    ///
    /// Returns `None` exactly once the mailbox was shut down and fully
    /// drained; subscribers are terminated at that point. Every dequeued
    /// activity is broadcast to live subscribers before being returned.
    pub async fn take(&self) -> Option<Activity> {
        loop {
            enum Step {
                Got(usize, Activity),
                Drained,
                Wait,
            }

            let step = {
                let mut queues = self.inner.queues.lock();
                if let Some((bucket, activity)) =
                    queues.pop_next(self.inner.config.anti_starvation_limit)
                {
                    Step::Got(bucket, activity)
                } else if queues.shutdown {
                    Step::Drained
                } else {
                    Step::Wait
                }
            };

            match step {
                Step::Got(bucket, activity) => {
                    self.inner.space[bucket].add_permits(1);
                    self.broadcast(&activity).await;
                    return Some(activity);
                }
                Step::Drained => {
                    self.close_subscribers();
                    return None;
                }
                Step::Wait => self.inner.item_notify.notified().await,
            }
        }
    }

    /// Register a bounded subscriber.
    ///
    /// The subscriber receives every dequeued activity and every state
    /// change the processing loop broadcasts. A subscriber whose channel
    /// stays full past the subscriber timeout is dropped; the producer is
    /// never blocked longer than that.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.config.subscriber_capacity);
        {
            let mut subscribers = self.inner.subscribers.lock();
            if !subscribers.closed {
                let id = self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
                subscribers.senders.insert(id, tx);
            }
            // When already closed, `tx` is dropped here and the subscription
            // observes an immediate end of stream.
        }
        Subscription::new(rx)
    }

    /// Broadcast an activity to all live subscribers.
    ///
    /// Used by `take` for dequeued activities and by the processing loop for
    /// emitted state changes. Slow or disconnected subscribers are removed.
    pub async fn broadcast(&self, activity: &Activity) {
        let targets: Vec<(u64, mpsc::Sender<Activity>)> = {
            let subscribers = self.inner.subscribers.lock();
            subscribers
                .senders
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        };
        if targets.is_empty() {
            return;
        }

        let wait = self.inner.config.effective_subscriber_timeout();
        let mut dropped = Vec::new();
        for (id, tx) in targets {
            match timeout(wait, tx.send(activity.clone())).await {
                Ok(Ok(())) => {}
                Ok(Err(_receiver_gone)) => dropped.push(id),
                Err(_elapsed) => {
                    tracing::warn!(subscriber = id, "dropping subscriber after backpressure timeout");
                    dropped.push(id);
                }
            }
        }

        if !dropped.is_empty() {
            let mut subscribers = self.inner.subscribers.lock();
            for id in dropped {
                subscribers.senders.remove(&id);
            }
        }
    }

    /// Close the mailbox for new offers. Idempotent.
    ///
    /// Queued activities remain takeable; once drained, `take` returns
    /// `None` and subscribers observe end of stream.
    pub fn shutdown(&self) {
        {
            let mut queues = self.inner.queues.lock();
            if queues.shutdown {
                return;
            }
            queues.shutdown = true;
        }
        for semaphore in &self.inner.space {
            semaphore.close();
        }
        // Wake a parked consumer so it can observe the drain.
        self.inner.item_notify.notify_waiters();
        self.inner.item_notify.notify_one();
    }

    /// Whether `shutdown` has been called.
    pub fn is_shutdown(&self) -> bool {
        self.inner.queues.lock().shutdown
    }

    /// Total queued activities across all buckets.
    pub fn len(&self) -> usize {
        self.inner.queues.lock().len()
    }

    /// Queued activities in the bucket serving the given priority.
    pub fn bucket_len(&self, priority: Priority) -> usize {
        let queues = self.inner.queues.lock();
        let bucket = queues.bucket_for(priority);
        queues.bucket_len(bucket)
    }

    /// Whether no activities are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Next value of the per-mailbox sequence, for loop-emitted broadcasts.
    pub(crate) fn next_sequence(&self) -> u64 {
        self.inner.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Terminate all subscribers and refuse new ones.
    pub(crate) fn close_subscribers(&self) {
        let mut subscribers = self.inner.subscribers.lock();
        subscribers.closed = true;
        subscribers.senders.clear();
    }
}
