//! Error types for score-relay.

use std::path::PathBuf;

/// Main error type for score-relay operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Persistence error.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Snapshot load/save errors.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Filesystem error while reading or writing a snapshot.
    #[error("snapshot I/O failed for {path}: {source}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Snapshot file exists but is not valid JSON.
    #[error("snapshot at {path} is corrupt: {source}")]
    Corrupt {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// State could not be serialized.
    #[error("snapshot serialization failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Backend refused the write (used by test backends).
    #[error("snapshot backend unavailable: {reason}")]
    Unavailable {
        /// Why the backend refused.
        reason: String,
    },
}

/// Protocol layer errors.
///
/// Always scoped to one inbound frame: the frame is dropped, the connection
/// stays open.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Frame is not a valid client message.
    #[error("invalid message format: {0}")]
    InvalidMessage(#[from] score_types::WireError),

    /// Binary frame that is not UTF-8 text.
    #[error("binary frame is not valid UTF-8 ({len} bytes)")]
    NotText {
        /// Frame length in bytes.
        len: usize,
    },

    /// Frame came from a session the registry no longer knows.
    #[error("session {0} is not registered")]
    UnknownSession(String),
}

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Result type alias for persistence operations.
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
