//! Error types for synchronization operations.
//!
//! Every fault in this crate degrades to local-only operation; none is fatal
//! to the hosting process. Cache faults are recovered inside the store,
//! remote faults are surfaced through the [`ErrorSink`](crate::notify::ErrorSink)
//! collaborator.

use thiserror::Error;

/// Errors that can occur during sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local cache read or deserialization failure. The store falls back to
    /// the caller-supplied initial value.
    #[error("cache read failed for key {0}")]
    CacheRead(String),

    /// Local cache persistence failure. In-memory state remains correct for
    /// the session.
    #[error("cache write failed for key {0}")]
    CacheWrite(String),

    /// Connection or permission failure on the live remote subscription.
    #[error("remote subscription failed: {0}")]
    RemoteSubscription(String),

    /// Remote upsert failure. The local write is retained, never rolled back.
    #[error("remote write failed: {0}")]
    RemoteWrite(String),

    /// Payload serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Malformed store key.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Database error from the SQLite cache backend.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Returns true if the store can keep serving local reads after this
    /// error. Only a malformed key is a caller bug; everything else degrades
    /// to local-only operation.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SyncError::InvalidKey(_))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}
