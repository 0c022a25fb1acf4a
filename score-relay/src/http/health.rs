//! Health check endpoint.

use crate::server::SyncRelay;
use axum::{Extension, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health status response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Overall status.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Number of open sessions.
    pub sessions: usize,
    /// Number of actions applied to the store.
    pub store_version: u64,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Health check handler.
pub async fn health_handler(Extension(relay): Extension<Arc<SyncRelay>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: relay.total_sessions(),
        store_version: relay.store_version().await,
        uptime_seconds: relay.uptime().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::persistence::MemorySnapshotStore;
    use score_core::ContestReducer;

    #[test]
    fn health_status_serializes() {
        let status = HealthStatus {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            sessions: 4,
            store_version: 120,
            uptime_seconds: 3600,
        };

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"sessions\":4"));
        assert!(json.contains("\"store_version\":120"));
    }

    #[tokio::test]
    async fn handler_reports_sessions_and_store_version() {
        let config = Config::default();
        let initial = config.contest.initial_state();
        let relay = Arc::new(SyncRelay::new(
            config,
            Arc::new(ContestReducer::new()),
            initial,
            Arc::new(MemorySnapshotStore::new()),
        ));
        let _reg = relay.open_session().await.unwrap();

        let Json(status) = health_handler(Extension(relay)).await;
        assert_eq!(status.status, "ok");
        assert_eq!(status.sessions, 1);
        assert_eq!(status.store_version, 0);
    }
}
