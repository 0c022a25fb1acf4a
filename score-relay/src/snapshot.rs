//! Welcome snapshots for newly opened sessions.

use std::time::{SystemTime, UNIX_EPOCH};

use score_core::Store;
use score_types::{ServerMessage, SessionId, Welcome};

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The welcome message for `sid`, reflecting the store as it is right now.
///
/// Must be built and queued in the same turn that registers `sid`, so the
/// session sees every later broadcast and none of the earlier ones.
pub fn welcome(store: &Store, sid: SessionId) -> ServerMessage {
    ServerMessage::Welcome(Welcome {
        sid,
        time: now_millis(),
        state: store.snapshot(),
        version: store.version(),
    })
}
