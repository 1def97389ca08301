//! Persistence error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving a snapshot
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Encoding a record to JSON or binary failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// A stored record exists but could not be decoded
    #[error("Malformed {record} record: {reason}")]
    MalformedSnapshot { record: &'static str, reason: String },

    /// Reading, writing or removing a record file failed
    #[error("I/O error on {}: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },

    /// The backing store refused the operation
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Whether the error came from decoding stored data.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedSnapshot { .. })
    }
}
