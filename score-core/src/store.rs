//! The canonical state tree.
//!
//! A [`Store`] is plain data plus a reducer. It has no locking of its own: the
//! relay owns exactly one and guards it with the lock that also orders
//! broadcasts, so "apply" and "announce" happen in the same turn.

use std::fmt;
use std::sync::Arc;

use score_types::{Action, StoreState};

use crate::Reducer;

/// The single in-memory state tree and its mutation entry point.
pub struct Store {
    state: StoreState,
    version: u64,
    reducer: Arc<dyn Reducer>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("version", &self.version)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Create a store seeded with `initial` state.
    pub fn new(reducer: Arc<dyn Reducer>, initial: StoreState) -> Self {
        Self {
            state: initial,
            version: 0,
            reducer,
        }
    }

    /// Apply one action.
    ///
    /// Unknown actions leave the state unchanged but still count towards
    /// [`version`](Self::version): the counter tracks applications, not
    /// effective changes.
    pub fn apply(&mut self, action: &Action) {
        self.reducer.reduce(&mut self.state, action);
        self.version += 1;
    }

    /// Apply a batch in order. Returns the number of actions applied.
    pub fn apply_batch(&mut self, actions: &[Action]) -> usize {
        for action in actions {
            self.apply(action);
        }
        actions.len()
    }

    /// Borrow the current state.
    pub fn state(&self) -> &StoreState {
        &self.state
    }

    /// Copy of the current state, for snapshots and persistence.
    pub fn snapshot(&self) -> StoreState {
        self.state.clone()
    }

    /// Monotonic count of applied actions since the store was created.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The reducer this store applies actions with.
    pub fn reducer(&self) -> &Arc<dyn Reducer> {
        &self.reducer
    }
}
