//! Content sources.
//!
//! A source enumerates every record of one database. Pagination is the
//! source's responsibility: `fetch_all` either returns the complete sequence
//! or fails as a whole.

pub mod notion;

pub use notion::{NotionConfig, NotionSource};

use crate::error::SyncResult;
use async_trait::async_trait;
use contentsync_types::ExternalRecord;

/// Abstract content source interface.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Returns the name of the source provider.
    fn provider_name(&self) -> &'static str;

    /// Fetches every record of a database, in source order.
    async fn fetch_all(&self, database_id: &str) -> SyncResult<Vec<ExternalRecord>>;
}
