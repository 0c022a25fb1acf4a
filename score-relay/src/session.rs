//! Per-connection session management.
//!
//! Each WebSocket gets a Session that registers with the relay, pumps its
//! outbound queue into the socket and feeds inbound frames to the relay.

use crate::error::{ProtocolError, RelayError};
use crate::server::SyncRelay;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use score_types::SessionId;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// A per-connection session.
///
/// `run` walks the connection through `Connecting -> Open -> Closed` once:
/// it is open from `open_session` until the read loop ends, and closed
/// after `close_session` has reconciled it.
pub struct Session {
    relay: Arc<SyncRelay>,
}

impl Session {
    /// Create a new session for an accepted socket.
    pub fn new(relay: Arc<SyncRelay>) -> Self {
        Self { relay }
    }

    /// Run the session until the socket closes or the relay kicks it.
    pub async fn run(self, socket: WebSocket) -> Result<(), RelayError> {
        let registration = self.relay.open_session().await?;
        let sid = registration.sid;
        let kicked = registration.kicked;
        let mut outbound = registration.outbound;

        let (mut ws_tx, mut ws_rx) = socket.split();

        // Writer task: forward queued frames to the socket
        let writer = tokio::spawn(async move {
            while let Some(frame) = outbound.recv().await {
                if ws_tx.send(Message::Text(frame.to_string())).await.is_err() {
                    break;
                }
            }
            let _ = ws_tx.close().await;
        });

        loop {
            tokio::select! {
                _ = kicked.notified() => {
                    tracing::warn!(sid = %sid, "Session kicked: outbound queue overflowed");
                    break;
                }
                incoming = ws_rx.next() => match incoming {
                    Some(Ok(Message::Text(text))) => self.on_text(&sid, &text).await,
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                        Ok(text) => self.on_text(&sid, &text).await,
                        Err(e) => {
                            let err = ProtocolError::NotText {
                                len: e.as_bytes().len(),
                            };
                            self.relay.metrics().errors_total.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(sid = %sid, "Dropping frame: {}", err);
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    // axum answers pings itself
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(sid = %sid, "Socket error: {}", e);
                        break;
                    }
                },
            }
        }

        self.relay.close_session(&sid).await;
        writer.abort();
        Ok(())
    }

    async fn on_text(&self, sid: &SessionId, text: &str) {
        if let Err(e) = self.relay.handle_text(sid, text).await {
            tracing::warn!(sid = %sid, "Dropping frame: {}", e);
        }
    }
}
