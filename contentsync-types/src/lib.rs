//! Core type definitions for contentsync.
//!
//! This crate defines the plain data model shared by the sync engine and the
//! runner:
//! - External records as delivered by the content source
//! - Field kinds that drive property extraction
//! - Normalized values and the flat destination rows built from them
//!
//! Nothing here performs I/O. Extraction logic lives in `contentsync-sync`.

mod field;
mod record;
mod row;
mod value;

pub use field::FieldKind;
pub use record::{ExternalRecord, RecordId};
pub use row::DestinationRow;
pub use value::NormalizedValue;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid record id: {0}")]
    InvalidRecordId(String),

    #[error("unknown field kind: {0}")]
    UnknownFieldKind(String),
}
