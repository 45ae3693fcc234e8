//! Bounded in-memory monitor for tests and introspection.

// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;

// Layer 3: Internal module imports
use super::events::{RuntimeEvent, RuntimeEventKind};
use super::traits::Monitor;

/// Default bounded history size.
const DEFAULT_MAX_EVENTS: usize = 1024;

/// Monitor retaining a bounded history of events in memory.
///
/// Oldest events are discarded once the bound is reached. Clones share the
/// same history.
///
/// # Example
/// ```rust
/// use agentsys_rt::monitoring::{InMemoryMonitor, Monitor, RuntimeEvent};
/// use agentsys_rt::util::AgentRuntimeId;
///
/// let monitor = InMemoryMonitor::new();
/// let id = AgentRuntimeId::new("a1").unwrap();
/// monitor.record(RuntimeEvent::created(&id));
/// assert_eq!(monitor.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryMonitor {
    events: Arc<Mutex<VecDeque<RuntimeEvent>>>,
    max_events: usize,
}

impl InMemoryMonitor {
    /// Create a monitor with the default history bound.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_EVENTS)
    }

    /// Create a monitor with a custom history bound.
    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            max_events: max_events.max(1),
        }
    }

    /// Snapshot of the retained events, oldest first.
    pub fn events(&self) -> Vec<RuntimeEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether no events are retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count retained events matching a predicate on the kind.
    pub fn count_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&RuntimeEventKind) -> bool,
    {
        self.events
            .lock()
            .iter()
            .filter(|event| predicate(&event.kind))
            .count()
    }

    /// Discard all retained events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Default for InMemoryMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Monitor for InMemoryMonitor {
    fn record(&self, event: RuntimeEvent) {
        let mut events = self.events.lock();
        if events.len() == self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}
