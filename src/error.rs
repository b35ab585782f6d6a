//! Error types for DriftKV
//!
//! Every engine operation returns a typed [`StoreError`]; nothing is
//! swallowed on the caller path. Durable sink failures are reported as
//! [`SinkError`] and wrapped into [`StoreError::Io`] when they cross the
//! engine boundary.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures returned by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is absent, or it was present but has expired.
    #[error("key not found")]
    NotFound,

    /// The key holds a scalar where a list was expected, or vice versa.
    #[error("key holds a value of another type")]
    TypeConflict,

    /// Malformed input (negative TTL, odd key/value count, negative count).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A list index or range does not fit the current list.
    ///
    /// `len` is the length of the list at the time of the call.
    #[error("index out of range (list length {len})")]
    IndexOutOfRange { len: usize },

    /// The durable sink failed to save or load a snapshot.
    #[error("snapshot sink error: {0}")]
    Io(#[from] SinkError),
}

impl StoreError {
    /// The list length carried by [`StoreError::IndexOutOfRange`], if any.
    pub fn list_len(&self) -> Option<usize> {
        match self {
            StoreError::IndexOutOfRange { len } => Some(*len),
            _ => None,
        }
    }
}

/// Failures of a durable snapshot sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("snapshot encoding error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A blocking sink call panicked or was cancelled.
    #[error("sink task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for SinkError {
    fn from(err: tokio::task::JoinError) -> Self {
        SinkError::Task(err.to_string())
    }
}
