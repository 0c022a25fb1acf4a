//! The reducer seam.

use score_types::{Action, SessionId, StoreState};
use serde_json::json;

/// Interprets actions against the state tree.
///
/// Implementations must treat unknown action types (and known types with
/// payloads they cannot use) as no-ops, and must never panic on client input:
/// every connected session can submit anything.
pub trait Reducer: Send + Sync {
    /// Apply one action to `state` in place.
    fn reduce(&self, state: &mut StoreState, action: &Action);

    /// The action that removes a closed session from the roster.
    ///
    /// The relay applies and broadcasts exactly one of these per closed
    /// session.
    fn session_closed(&self, sid: &SessionId) -> Action {
        Action::new(
            crate::contest::REMOVE_DEVICE_ACTION,
            json!({ "sockId": sid.to_string() }),
        )
    }
}

impl<F> Reducer for F
where
    F: Fn(&mut StoreState, &Action) + Send + Sync,
{
    fn reduce(&self, state: &mut StoreState, action: &Action) {
        self(state, action)
    }
}
