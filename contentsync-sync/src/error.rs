//! Error types for the sync layer.

use crate::extract::ExtractionError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network error (connection, TLS, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The remote API answered with a non-success status.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A table, column, or key name that cannot be used as a SQL identifier.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// A source field could not be read.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// The remote API broke its own paging or response contract.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A source item could not be parsed into a record.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Timeout.
    #[error("{0} timed out")]
    Timeout(String),
}

impl From<rusqlite::Error> for SyncError {
    fn from(e: rusqlite::Error) -> Self {
        SyncError::Storage(e.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SyncError::Timeout("http request".to_string())
        } else {
            SyncError::Network(e.to_string())
        }
    }
}
