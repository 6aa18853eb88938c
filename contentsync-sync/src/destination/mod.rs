//! Relational destinations.
//!
//! A destination accepts one row at a time and upserts it keyed on a
//! conflict-key column. Writing the same row twice leaves the store unchanged.

pub mod postgrest;
pub mod sqlite;

pub use postgrest::{PostgrestConfig, PostgrestStore};
pub use sqlite::SqliteStore;

use crate::error::SyncResult;
use async_trait::async_trait;
use contentsync_types::DestinationRow;
use serde::{Deserialize, Serialize};

/// What an upsert did to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    /// No row with the conflict key existed.
    Created,
    /// An existing row was replaced.
    Updated,
    /// The store merged the row without saying which of the two happened.
    Merged,
}

/// Abstract relational destination.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Returns the name of the destination provider.
    fn provider_name(&self) -> &'static str;

    /// Inserts `row` into `table`, or replaces the row whose `conflict_key`
    /// column holds the same value.
    async fn upsert(
        &self,
        table: &str,
        row: &DestinationRow,
        conflict_key: &str,
    ) -> SyncResult<UpsertOutcome>;
}
