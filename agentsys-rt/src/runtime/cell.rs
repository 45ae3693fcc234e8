//! Atomic cell holding the observable runtime state.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::Utc;
use parking_lot::RwLock;

// Layer 3: Internal module imports
use super::state::AgentState;

/// Shared cell over an [`AgentState`].
///
/// Mutations are serialized through the write lock; in practice only the
/// processing loop and `terminate` write. External readers take consistent
/// snapshots and never hold the lock across an await. Every update bumps
/// `last_updated` monotonically.
#[derive(Debug)]
pub struct StateCell<S> {
    inner: Arc<RwLock<AgentState<S>>>,
}

impl<S> Clone for StateCell<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Clone> StateCell<S> {
    /// Wrap an initial state.
    pub fn new(state: AgentState<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Take a consistent snapshot.
    pub fn snapshot(&self) -> AgentState<S> {
        self.inner.read().clone()
    }

    /// Apply a serialized mutation.
    ///
    /// `last_updated` is set to the later of its previous value and now, so
    /// observers never see it move backwards.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut AgentState<S>),
    {
        let mut guard = self.inner.write();
        let previous = guard.last_updated;
        f(&mut guard);
        guard.last_updated = previous.max(Utc::now());
    }
}
