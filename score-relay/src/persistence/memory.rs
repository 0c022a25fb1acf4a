//! In-memory snapshot backend for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use score_types::StoreState;

use super::SnapshotStore;
use crate::error::{PersistenceError, PersistenceResult};

#[derive(Debug, Default)]
struct Inner {
    snapshot: Mutex<Option<StoreState>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

/// Snapshot held in memory. Not persistent - lost when dropped.
///
/// Clones share the same snapshot, so a test can keep a handle after giving
/// one to the relay. Saves can be made to fail on demand.
#[derive(Debug, Default, Clone)]
pub struct MemorySnapshotStore {
    inner: Arc<Inner>,
}

impl MemorySnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `state`.
    pub fn with_snapshot(state: StoreState) -> Self {
        let store = Self::new();
        *store.slot() = Some(state);
        store
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn fail_saves(&self, fail: bool) {
        self.inner.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// The currently stored snapshot.
    pub fn snapshot(&self) -> Option<StoreState> {
        self.slot().clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.inner.saves.load(Ordering::SeqCst)
    }

    fn slot(&self) -> MutexGuard<'_, Option<StoreState>> {
        self.inner
            .snapshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> PersistenceResult<Option<StoreState>> {
        Ok(self.snapshot())
    }

    async fn save(&self, state: &StoreState) -> PersistenceResult<()> {
        if self.inner.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable {
                reason: "saves disabled".to_string(),
            });
        }
        *self.slot() = Some(state.clone());
        self.inner.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn clones_share_the_snapshot() {
        let store = MemorySnapshotStore::new();
        let handle = store.clone();

        store.save(&json!({"n": 1})).await.unwrap();
        assert_eq!(handle.snapshot(), Some(json!({"n": 1})));
        assert_eq!(handle.save_count(), 1);
    }

    #[tokio::test]
    async fn failing_saves_keep_the_old_snapshot() {
        let store = MemorySnapshotStore::with_snapshot(json!({"n": 1}));
        store.fail_saves(true);

        assert!(matches!(
            store.save(&json!({"n": 2})).await,
            Err(PersistenceError::Unavailable { .. })
        ));
        assert_eq!(store.load().await.unwrap(), Some(json!({"n": 1})));

        store.fail_saves(false);
        store.save(&json!({"n": 2})).await.unwrap();
        assert_eq!(store.snapshot(), Some(json!({"n": 2})));
    }
}
