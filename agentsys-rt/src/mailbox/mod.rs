//! Prioritized, bounded mailbox feeding a single processing loop.
//!
//! Each agent runtime owns one [`PriorityMailbox`]: four FIFO buckets (one
//! per [`Priority`](crate::activity::Priority) level, or a single bucket when
//! prioritization is disabled), bounded per bucket, with backpressure on
//! `offer` and broadcast fan-out to bounded subscriber channels.
//!
//! # Scheduling
//!
//! `take` drains the highest-priority non-empty bucket first, strict FIFO
//! within a bucket. To keep a continuously replenished high bucket from
//! starving lower ones, after `anti_starvation_limit` consecutive dequeues
//! from the same bucket one item is serviced from the next non-empty lower
//! bucket before priority order resumes.
//!
//! # Lifecycle
//!
//! A mailbox is open until [`PriorityMailbox::shutdown`] is called. Shutdown
//! rejects new offers immediately, lets the consumer drain what was already
//! queued, then ends the take stream and terminates subscribers.

pub mod config;
pub mod error;
pub mod priority;
pub mod queue;
pub mod subscription;

pub use config::{
    MailboxConfig, MailboxConfigBuilder, DEFAULT_ANTI_STARVATION_LIMIT,
    DEFAULT_BACKPRESSURE_TIMEOUT, DEFAULT_MAILBOX_SIZE, DEFAULT_PRIORITY_QUEUE_SIZE,
    DEFAULT_SUBSCRIBER_CAPACITY,
};
pub use error::MailboxError;
pub use priority::PriorityMailbox;
pub use subscription::Subscription;
