//! WebSocket upgrade handler.
//!
//! Accepts the upgrade on the configured path and hands the socket to a
//! [`Session`].

use crate::server::SyncRelay;
use crate::session::Session;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;
use axum::Extension;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Upgrade an HTTP request to a relay session.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(relay): Extension<Arc<SyncRelay>>,
) -> impl IntoResponse {
    let max_message_size = relay.config().session.max_message_size;
    ws.max_message_size(max_message_size)
        .max_frame_size(max_message_size)
        .on_upgrade(move |socket| async move {
            relay.metrics().connections_total.fetch_add(1, Ordering::Relaxed);
            if let Err(e) = Session::new(relay).run(socket).await {
                tracing::warn!("Session error: {}", e);
            }
        })
}
