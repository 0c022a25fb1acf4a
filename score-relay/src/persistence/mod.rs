//! Persistence gateway for the store snapshot.
//!
//! The relay keeps exactly one snapshot: the whole state tree, written only
//! when a client asks for it and read once at startup.

mod file;
mod memory;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

use crate::error::PersistenceResult;
use async_trait::async_trait;
use score_types::StoreState;

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the persisted snapshot.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    async fn load(&self) -> PersistenceResult<Option<StoreState>>;

    /// Replace the persisted snapshot with `state`.
    ///
    /// Either the whole new snapshot becomes visible or the previous one is
    /// left untouched.
    async fn save(&self, state: &StoreState) -> PersistenceResult<()>;

    /// Human readable location, for logs.
    fn describe(&self) -> String;
}

/// Load the snapshot from `store`, falling back to `default` when absent.
pub async fn load_or_default(
    store: &dyn SnapshotStore,
    default: impl FnOnce() -> StoreState,
) -> PersistenceResult<StoreState> {
    match store.load().await? {
        Some(state) => {
            tracing::info!("Loaded snapshot from {}", store.describe());
            Ok(state)
        }
        None => {
            tracing::info!(
                "No snapshot at {}, starting from initial state",
                store.describe()
            );
            Ok(default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn load_or_default_uses_default_when_empty() {
        let store = MemorySnapshotStore::new();
        let state = load_or_default(&store, || json!({"fresh": true}))
            .await
            .unwrap();
        assert_eq!(state, json!({"fresh": true}));
    }

    #[tokio::test]
    async fn load_or_default_prefers_saved_state() {
        let store = MemorySnapshotStore::new();
        store.save(&json!({"saved": 1})).await.unwrap();

        let state = load_or_default(&store, || json!({"fresh": true}))
            .await
            .unwrap();
        assert_eq!(state, json!({"saved": 1}));
    }
}
