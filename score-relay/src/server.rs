//! Main SyncRelay server coordination.
//!
//! SyncRelay owns the store, the session registry and the snapshot backend.
//! Every store mutation and every broadcast happens while holding the store
//! lock, which is the single point that orders the system.

use crate::config::Config;
use crate::error::{ProtocolError, ProtocolResult, Result};
use crate::persistence::{self, SnapshotStore};
use crate::reconciler;
use crate::registry::{Registration, SessionRegistry};
use crate::router;
use crate::snapshot;
use score_core::{Reducer, Store};
use score_types::{Action, ClientMessage, SaveStoreResult, ServerMessage, SessionId, StoreState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Operational metrics for monitoring relay activity.
///
/// All counters are monotonically increasing (reset only on restart).
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Total WebSocket connections accepted.
    pub connections_total: AtomicU64,
    /// Total dispatch / dispatch_all messages routed.
    pub dispatches_total: AtomicU64,
    /// Total actions applied to the store, removals included.
    pub actions_applied_total: AtomicU64,
    /// Total per-session deliveries skipped because a queue was full or closed.
    pub broadcast_drops_total: AtomicU64,
    /// Total successful snapshot saves.
    pub saves_total: AtomicU64,
    /// Total failed snapshot saves.
    pub save_failures_total: AtomicU64,
    /// Total protocol errors (frames dropped).
    pub errors_total: AtomicU64,
}

/// Main relay server.
pub struct SyncRelay {
    config: Config,
    store: Mutex<Store>,
    registry: SessionRegistry,
    persistence: Arc<dyn SnapshotStore>,
    /// Serializes saves against each other, never against dispatches.
    save_lock: Mutex<()>,
    metrics: RelayMetrics,
    started_at: Instant,
}

impl std::fmt::Debug for SyncRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncRelay")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .field("sessions_count", &self.registry.len())
            .field("persistence", &self.persistence.describe())
            .finish_non_exhaustive()
    }
}

impl SyncRelay {
    /// Create a relay whose store starts at `initial`.
    pub fn new(
        config: Config,
        reducer: Arc<dyn Reducer>,
        initial: StoreState,
        persistence: Arc<dyn SnapshotStore>,
    ) -> Self {
        let registry = SessionRegistry::new(config.session.send_queue);
        Self {
            config,
            store: Mutex::new(Store::new(reducer, initial)),
            registry,
            persistence,
            save_lock: Mutex::new(()),
            metrics: RelayMetrics::default(),
            started_at: Instant::now(),
        }
    }

    /// Create a relay seeded from the persisted snapshot, or from the
    /// contest's initial state when nothing has been saved.
    ///
    /// # Errors
    ///
    /// Fails if the snapshot exists but cannot be read or parsed.
    pub async fn bootstrap(
        config: Config,
        reducer: Arc<dyn Reducer>,
        persistence: Arc<dyn SnapshotStore>,
    ) -> Result<Self> {
        let initial =
            persistence::load_or_default(persistence.as_ref(), || config.contest.initial_state())
                .await?;
        Ok(Self::new(config, reducer, initial, persistence))
    }

    /// Get the relay configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// Number of open sessions.
    pub fn total_sessions(&self) -> usize {
        self.registry.len()
    }

    /// Time since the relay was created.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Number of actions applied to the store so far.
    pub async fn store_version(&self) -> u64 {
        self.store.lock().await.version()
    }

    /// Copy of the current store state.
    pub async fn state_snapshot(&self) -> StoreState {
        self.store.lock().await.snapshot()
    }

    /// Register a new session and queue its welcome snapshot.
    ///
    /// Registration and the welcome happen under the store lock: the welcome
    /// is the first frame in the session's queue and reflects every action
    /// whose broadcast the session will not receive.
    pub async fn open_session(&self) -> Result<Registration> {
        let store = self.store.lock().await;
        let registration = self.registry.register();
        let sid = registration.sid;

        let frame = match snapshot::welcome(&store, sid).to_json() {
            Ok(frame) => frame,
            Err(e) => {
                self.registry.unregister(&sid);
                return Err(ProtocolError::from(e).into());
            }
        };
        self.registry.send_to(&sid, &frame);
        drop(store);

        tracing::info!(sid = %sid, sessions = self.registry.len(), "Session opened");
        Ok(registration)
    }

    /// Handle one inbound text frame from `sid`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] if the frame is not a valid client
    /// message. The frame is dropped; the session stays open.
    pub async fn handle_text(&self, sid: &SessionId, text: &str) -> ProtocolResult<()> {
        let result = self.process(sid, text).await;
        if result.is_err() {
            self.metrics.errors_total.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    async fn process(&self, sid: &SessionId, text: &str) -> ProtocolResult<()> {
        let message = ClientMessage::from_json(text)?;
        match message {
            ClientMessage::Dispatch { actions } | ClientMessage::DispatchAll { actions } => {
                self.dispatch(sid, text, &actions).await
            }
            ClientMessage::SaveStore => {
                self.save_store(Some(sid)).await;
                Ok(())
            }
        }
    }

    async fn dispatch(&self, sid: &SessionId, raw: &str, actions: &[Action]) -> ProtocolResult<()> {
        let mut store = self.store.lock().await;
        if !self.registry.contains(sid) {
            return Err(ProtocolError::UnknownSession(sid.to_string()));
        }
        let routed = router::route(&mut store, &self.registry, raw, actions);
        drop(store);

        self.metrics.dispatches_total.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .actions_applied_total
            .fetch_add(routed.applied as u64, Ordering::Relaxed);
        self.metrics
            .broadcast_drops_total
            .fetch_add(routed.broadcast.dropped as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Persist the current state and acknowledge to `requester`, if any.
    ///
    /// The state is copied under the store lock and written outside it, so
    /// dispatches keep flowing during disk I/O. Saves never overlap.
    pub async fn save_store(&self, requester: Option<&SessionId>) -> SaveStoreResult {
        let _guard = self.save_lock.lock().await;
        let state = self.store.lock().await.snapshot();

        let result = match self.persistence.save(&state).await {
            Ok(()) => {
                self.metrics.saves_total.fetch_add(1, Ordering::Relaxed);
                tracing::info!("Saved snapshot to {}", self.persistence.describe());
                SaveStoreResult {
                    ok: true,
                    time: snapshot::now_millis(),
                    error: None,
                }
            }
            Err(e) => {
                self.metrics.save_failures_total.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Failed to save snapshot: {}", e);
                SaveStoreResult {
                    ok: false,
                    time: snapshot::now_millis(),
                    error: Some(e.to_string()),
                }
            }
        };

        if let Some(sid) = requester {
            match ServerMessage::SaveStoreResult(result.clone()).to_json() {
                Ok(frame) => {
                    self.registry.send_to(sid, &frame);
                }
                Err(e) => tracing::error!(sid = %sid, "Failed to encode save result: {}", e),
            }
        }
        result
    }

    /// Reconcile a closed session: remove it from the roster, unregister it
    /// and tell everyone else.
    ///
    /// Safe to call more than once; only the first call has an effect.
    pub async fn close_session(&self, sid: &SessionId) -> Option<Action> {
        let mut store = self.store.lock().await;
        let reconciled = reconciler::reconcile(&mut store, &self.registry, sid)?;
        drop(store);

        self.metrics.actions_applied_total.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .broadcast_drops_total
            .fetch_add(reconciled.broadcast.dropped as u64, Ordering::Relaxed);
        tracing::info!(sid = %sid, sessions = self.registry.len(), "Session closed");
        Some(reconciled.action)
    }
}
