//! Priority bucket queues with bounded anti-starvation.
//!
//! This is the synchronous core of the mailbox: plain FIFO buckets plus the
//! dequeue policy. All waiting, capacity accounting and subscriber fan-out
//! live in [`priority`](super::priority); everything here runs under a single
//! short-lived lock.

// Layer 1: Standard library imports
use std::collections::VecDeque;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::activity::{Activity, Priority};

/// FIFO buckets ordered by priority, highest first.
///
/// # Dequeue policy
///
/// `pop_next` serves the highest-priority non-empty bucket, strict FIFO
/// within a bucket. A streak counter tracks consecutive pops from the same
/// bucket; once the streak reaches the anti-starvation limit and a lower
/// bucket holds items, one item from the next non-empty lower bucket is
/// served instead, resetting the streak.
#[derive(Debug)]
pub(crate) struct BucketQueues {
    buckets: Vec<VecDeque<Activity>>,
    streak_bucket: usize,
    streak: u32,
    pub(crate) shutdown: bool,
}

impl BucketQueues {
    /// Create the bucket set: four buckets when prioritized, one otherwise.
    pub(crate) fn new(prioritized: bool) -> Self {
        let bucket_count = if prioritized { Priority::ALL.len() } else { 1 };
        Self {
            buckets: (0..bucket_count).map(|_| VecDeque::new()).collect(),
            streak_bucket: 0,
            streak: 0,
            shutdown: false,
        }
    }

    /// Bucket index for a priority under the current mode.
    pub(crate) fn bucket_for(&self, priority: Priority) -> usize {
        if self.buckets.len() == 1 {
            0
        } else {
            priority.bucket()
        }
    }

    /// Append an activity to its bucket. Capacity is enforced by the caller.
    pub(crate) fn push(&mut self, bucket: usize, activity: Activity) {
        self.buckets[bucket].push_back(activity);
    }

    /// Pop the next activity according to the dequeue policy.
    ///
    /// Returns the bucket index alongside the activity so the caller can
    /// release the matching capacity permit.
    pub(crate) fn pop_next(&mut self, anti_starvation_limit: u32) -> Option<(usize, Activity)> {
        let highest = self.buckets.iter().position(|b| !b.is_empty())?;

        let mut chosen = highest;
        if self.streak_bucket == highest && self.streak >= anti_starvation_limit {
            if let Some(offset) = self.buckets[highest + 1..]
                .iter()
                .position(|b| !b.is_empty())
            {
                chosen = highest + 1 + offset;
            }
        }

        if chosen == self.streak_bucket {
            self.streak += 1;
        } else {
            self.streak_bucket = chosen;
            self.streak = 1;
        }

        let activity = self.buckets[chosen].pop_front()?;
        Some((chosen, activity))
    }

    /// Total queued activities across all buckets.
    pub(crate) fn len(&self) -> usize {
        self.buckets.iter().map(VecDeque::len).sum()
    }

    /// Queued activities in a single bucket.
    pub(crate) fn bucket_len(&self, bucket: usize) -> usize {
        self.buckets[bucket].len()
    }
}
