//! HTTP endpoints for score-relay.
//!
//! Serves the WebSocket endpoint plus health checks and metrics.

pub mod health;
mod metrics;

use crate::protocol::ws_handler;
use crate::server::SyncRelay;
use axum::{routing::get, Extension, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

pub use health::HealthStatus;

/// Build the HTTP router with all endpoints.
///
/// `/metrics` is only routed when enabled in config.
pub fn build_router(relay: Arc<SyncRelay>) -> Router {
    let ws_path = relay.config().server.ws_path.clone();
    let mut router = Router::new()
        .route(&ws_path, get(ws_handler))
        .route("/health", get(health::health_handler));

    if relay.config().http.metrics_enabled {
        router = router.route("/metrics", get(metrics::metrics_handler));
    }

    router.layer(Extension(relay))
}

/// Serve the relay on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, relay: Arc<SyncRelay>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(relay))
        .with_graceful_shutdown(shutdown)
        .await
}
