//! Bounded subscriber channel handed out by `subscribe`.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

// Layer 3: Internal module imports
use crate::activity::Activity;

/// Receiving end of a mailbox subscription.
///
/// Delivers every activity the processing loop dequeues plus every state
/// change it emits, in processing order. The channel is bounded; a
/// subscriber that stops reading is dropped by the mailbox after its
/// backpressure timeout, after which `recv` returns `None`.
///
/// # Example
/// ```rust,ignore
/// let mut subscription = mailbox.subscribe();
/// while let Some(activity) = subscription.recv().await {
///     println!("observed {}", activity.activity_type);
/// }
/// ```
pub struct Subscription {
    receiver: mpsc::Receiver<Activity>,
}

impl Subscription {
    pub(crate) fn new(receiver: mpsc::Receiver<Activity>) -> Self {
        Self { receiver }
    }

    /// Receive the next broadcast activity.
    ///
    /// Returns `None` once the mailbox terminated this subscriber, either by
    /// shutdown-and-drain or because the subscriber fell too far behind.
    pub async fn recv(&mut self) -> Option<Activity> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<Activity> {
        self.receiver.try_recv().ok()
    }

    /// Convert into a `Stream` of activities.
    pub fn into_stream(self) -> ReceiverStream<Activity> {
        ReceiverStream::new(self.receiver)
    }
}
