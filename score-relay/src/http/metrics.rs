//! Prometheus metrics endpoint.

use crate::server::SyncRelay;
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Extension};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Prometheus metrics handler.
///
/// Returns metrics in Prometheus text format.
pub async fn metrics_handler(Extension(relay): Extension<Arc<SyncRelay>>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        render(&relay).await,
    )
}

async fn render(relay: &SyncRelay) -> String {
    let m = relay.metrics();

    // Gauges: current state
    let sessions = relay.total_sessions();
    let store_version = relay.store_version().await;

    // Counters: monotonic since startup
    let conns_total = m.connections_total.load(Ordering::Relaxed);
    let dispatches = m.dispatches_total.load(Ordering::Relaxed);
    let applied = m.actions_applied_total.load(Ordering::Relaxed);
    let drops = m.broadcast_drops_total.load(Ordering::Relaxed);
    let saves = m.saves_total.load(Ordering::Relaxed);
    let save_failures = m.save_failures_total.load(Ordering::Relaxed);
    let errors = m.errors_total.load(Ordering::Relaxed);

    format!(
        r#"# HELP score_relay_sessions_active Number of open sessions
# TYPE score_relay_sessions_active gauge
score_relay_sessions_active {sessions}

# HELP score_relay_store_version Actions applied to the store
# TYPE score_relay_store_version gauge
score_relay_store_version {store_version}

# HELP score_relay_info Server information
# TYPE score_relay_info gauge
score_relay_info{{version="{version}"}} 1

# HELP score_relay_connections_total Total WebSocket connections accepted
# TYPE score_relay_connections_total counter
score_relay_connections_total {conns_total}

# HELP score_relay_dispatches_total Total dispatch messages routed
# TYPE score_relay_dispatches_total counter
score_relay_dispatches_total {dispatches}

# HELP score_relay_actions_applied_total Total actions applied to the store
# TYPE score_relay_actions_applied_total counter
score_relay_actions_applied_total {applied}

# HELP score_relay_broadcast_drops_total Total deliveries skipped for slow or closed sessions
# TYPE score_relay_broadcast_drops_total counter
score_relay_broadcast_drops_total {drops}

# HELP score_relay_saves_total Total snapshot saves
# TYPE score_relay_saves_total counter
score_relay_saves_total {saves}

# HELP score_relay_save_failures_total Total failed snapshot saves
# TYPE score_relay_save_failures_total counter
score_relay_save_failures_total {save_failures}

# HELP score_relay_errors_total Total protocol errors
# TYPE score_relay_errors_total counter
score_relay_errors_total {errors}
"#,
        version = env!("CARGO_PKG_VERSION"),
    )
}
