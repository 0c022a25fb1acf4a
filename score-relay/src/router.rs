//! Applies dispatched batches and replicates them.

use score_core::Store;
use score_types::Action;

use crate::registry::{BroadcastReport, SessionRegistry};

/// Outcome of routing one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routed {
    /// Actions applied to the store.
    pub applied: usize,
    /// Reach of the rebroadcast.
    pub broadcast: BroadcastReport,
}

/// Apply `actions` in order, then send `raw` unchanged to every session,
/// the sender included.
///
/// The caller holds the store lock for the whole call; that lock is what
/// makes broadcast order match apply order.
pub fn route(
    store: &mut Store,
    registry: &SessionRegistry,
    raw: &str,
    actions: &[Action],
) -> Routed {
    let applied = store.apply_batch(actions);
    let broadcast = registry.broadcast(raw, None);
    tracing::debug!(
        applied,
        version = store.version(),
        delivered = broadcast.delivered,
        "Routed dispatch"
    );
    Routed { applied, broadcast }
}

#[cfg(test)]
mod tests {
    use super::*;
    use score_types::{ClientMessage, StoreState};
    use serde_json::json;
    use std::sync::Arc;

    fn counter() -> Store {
        let reducer = |state: &mut StoreState, action: &Action| {
            if action.kind == "incrementTask" {
                let id = action.payload["id"].as_str().unwrap_or_default().to_string();
                let n = state["tasks"][&id].as_i64().unwrap_or(0);
                state["tasks"][&id] = json!(n + 1);
            }
        };
        Store::new(Arc::new(reducer), json!({"tasks": {}}))
    }

    #[tokio::test]
    async fn dispatch_is_applied_and_echoed_verbatim() {
        let mut store = counter();
        let registry = SessionRegistry::new(8);
        let mut sender = registry.register();
        let mut other = registry.register();

        // Odd spacing survives: the frame is forwarded as received.
        let raw = r#"{ "type":"dispatch", "actions":[{"type":"incrementTask","payload":{"id":"T1"}}] }"#;
        let msg = ClientMessage::from_json(raw).unwrap();

        let routed = route(&mut store, &registry, raw, msg.actions().unwrap());
        assert_eq!(routed.applied, 1);
        assert_eq!(routed.broadcast.delivered, 2);
        assert_eq!(store.state()["tasks"]["T1"], 1);

        assert_eq!(&*sender.outbound.recv().await.unwrap(), raw);
        assert_eq!(&*other.outbound.recv().await.unwrap(), raw);
    }

    #[test]
    fn empty_batch_still_broadcasts() {
        let mut store = counter();
        let registry = SessionRegistry::new(8);
        let _a = registry.register();

        let routed = route(&mut store, &registry, r#"{"type":"dispatch","actions":[]}"#, &[]);
        assert_eq!(routed.applied, 0);
        assert_eq!(routed.broadcast.delivered, 1);
        assert_eq!(store.version(), 0);
    }
}
