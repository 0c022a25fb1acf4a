//! Registry of open sessions and their outbound queues.
//!
//! Every session owns a bounded queue drained by its socket writer task.
//! Sends never wait: a full queue means the client cannot keep up, so the
//! session is kicked and will resync from a fresh welcome when it reconnects.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use score_types::SessionId;
use tokio::sync::{mpsc, Notify};

/// An outbound text frame, shared between every queue it is pushed to.
pub type Frame = Arc<str>;

/// Per-session bookkeeping held by the registry.
#[derive(Debug)]
struct SessionHandle {
    tx: mpsc::Sender<Frame>,
    kick: Arc<Notify>,
    /// Set on the first dropped frame. Nothing is queued after it.
    stalled: AtomicBool,
    connected_at: SystemTime,
}

impl SessionHandle {
    /// Queue a frame without waiting. Returns false if it was not queued.
    fn offer(&self, sid: &SessionId, frame: &Frame) -> bool {
        if self.stalled.load(Ordering::Acquire) {
            return false;
        }
        match self.tx.try_send(Arc::clone(frame)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                if !self.stalled.swap(true, Ordering::AcqRel) {
                    tracing::warn!(sid = %sid, "Send queue full, disconnecting slow session");
                    self.kick.notify_one();
                }
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// What a broadcast reached.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sessions the frame was queued for.
    pub delivered: usize,
    /// Sessions skipped because their queue was full or closed.
    pub dropped: usize,
}

/// Receiving half handed to a newly registered session.
#[derive(Debug)]
pub struct Registration {
    /// Id assigned to the session.
    pub sid: SessionId,
    /// Frames to write to the socket, in order.
    pub outbound: mpsc::Receiver<Frame>,
    /// Fires when the registry wants the session closed.
    pub kicked: Arc<Notify>,
}

/// All currently registered sessions.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<SessionHandle>>,
    send_queue: usize,
}

impl SessionRegistry {
    /// Create an empty registry whose sessions get `send_queue` slots each.
    pub fn new(send_queue: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            send_queue: send_queue.max(1),
        }
    }

    /// Register a new session under a fresh id.
    pub fn register(&self) -> Registration {
        let sid = SessionId::new();
        let (tx, outbound) = mpsc::channel(self.send_queue);
        let kicked = Arc::new(Notify::new());
        self.sessions.insert(
            sid,
            Arc::new(SessionHandle {
                tx,
                kick: Arc::clone(&kicked),
                stalled: AtomicBool::new(false),
                connected_at: SystemTime::now(),
            }),
        );
        tracing::debug!(sid = %sid, total = self.sessions.len(), "Registered session");
        Registration {
            sid,
            outbound,
            kicked,
        }
    }

    /// Remove a session. Returns false if it was not registered.
    pub fn unregister(&self, sid: &SessionId) -> bool {
        let removed = self.sessions.remove(sid).is_some();
        if removed {
            tracing::debug!(sid = %sid, remaining = self.sessions.len(), "Unregistered session");
        }
        removed
    }

    /// Whether `sid` is currently registered.
    pub fn contains(&self, sid: &SessionId) -> bool {
        self.sessions.contains_key(sid)
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session is registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// When `sid` registered, if it still is.
    pub fn connected_at(&self, sid: &SessionId) -> Option<SystemTime> {
        self.sessions.get(sid).map(|h| h.connected_at)
    }

    /// Queue a frame for a single session.
    pub fn send_to(&self, sid: &SessionId, frame: &str) -> bool {
        let frame: Frame = Arc::from(frame);
        match self.sessions.get(sid) {
            Some(handle) => handle.offer(sid, &frame),
            None => false,
        }
    }

    /// Queue a frame for every registered session except `exclude`.
    pub fn broadcast(&self, frame: &str, exclude: Option<&SessionId>) -> BroadcastReport {
        let frame: Frame = Arc::from(frame);
        // Collect first so no shard lock is held while notifying kicks.
        let targets: Vec<(SessionId, Arc<SessionHandle>)> = self
            .sessions
            .iter()
            .filter(|entry| Some(entry.key()) != exclude)
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut report = BroadcastReport::default();
        for (sid, handle) in targets {
            if handle.offer(&sid, &frame) {
                report.delivered += 1;
            } else {
                report.dropped += 1;
            }
        }
        report
    }
}
