//! Removes closed sessions from the shared roster.

use score_core::Store;
use score_types::{encode_action_batch, Action, SessionId};

use crate::registry::{BroadcastReport, SessionRegistry};

/// Result of reconciling one closed session.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// The removal action that was applied and announced.
    pub action: Action,
    /// Reach of the announcement.
    pub broadcast: BroadcastReport,
}

/// Apply the removal action for `sid`, unregister it, and announce the
/// removal to the sessions that remain.
///
/// Returns `None` if `sid` is not registered, so a session is reconciled at
/// most once however many times its close is reported. The caller holds the
/// store lock.
pub fn reconcile(
    store: &mut Store,
    registry: &SessionRegistry,
    sid: &SessionId,
) -> Option<Reconciled> {
    if !registry.contains(sid) {
        return None;
    }

    let action = store.reducer().session_closed(sid);
    store.apply(&action);
    registry.unregister(sid);

    let broadcast = match encode_action_batch(std::slice::from_ref(&action)) {
        Ok(frame) => registry.broadcast(&frame, None),
        Err(e) => {
            tracing::error!(sid = %sid, "Failed to encode removal action: {}", e);
            BroadcastReport::default()
        }
    };

    tracing::debug!(
        sid = %sid,
        delivered = broadcast.delivered,
        "Announced session removal"
    );
    Some(Reconciled { action, broadcast })
}

#[cfg(test)]
mod tests {
    use super::*;
    use score_core::{connected_devices, ContestConfig, ContestReducer, REMOVE_DEVICE_ACTION};
    use serde_json::json;
    use std::sync::Arc;

    fn contest_store() -> Store {
        Store::new(
            Arc::new(ContestReducer::new()),
            ContestConfig::default().initial_state(),
        )
    }

    fn add_device(store: &mut Store, sid: &SessionId) {
        store.apply(&Action::new(
            "connectedDevices/addDeviceOrUpdate",
            json!({"sockId": sid.to_string(), "deviceName": "board"}),
        ));
    }

    #[tokio::test]
    async fn removal_is_applied_and_announced_to_the_rest() {
        let mut store = contest_store();
        let registry = SessionRegistry::new(8);
        let gone = registry.register();
        let mut stays = registry.register();
        add_device(&mut store, &gone.sid);
        add_device(&mut store, &stays.sid);

        let reconciled = reconcile(&mut store, &registry, &gone.sid).unwrap();
        assert_eq!(reconciled.action.kind, REMOVE_DEVICE_ACTION);
        assert_eq!(reconciled.broadcast.delivered, 1);
        assert!(!registry.contains(&gone.sid));

        let roster = connected_devices(store.state());
        assert_eq!(roster, vec![stays.sid.to_string().as_str()]);

        let frame = stays.outbound.recv().await.unwrap();
        let announced: Vec<Action> = serde_json::from_str(&frame).unwrap();
        assert_eq!(announced, vec![reconciled.action]);
    }

    #[test]
    fn second_close_is_ignored() {
        let mut store = contest_store();
        let registry = SessionRegistry::new(8);
        let gone = registry.register();

        assert!(reconcile(&mut store, &registry, &gone.sid).is_some());
        let version = store.version();
        assert!(reconcile(&mut store, &registry, &gone.sid).is_none());
        assert_eq!(store.version(), version);
    }
}
