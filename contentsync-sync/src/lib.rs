//! Table sync engine for contentsync.
//!
//! Copies structured content from a paginated content API into relational
//! tables and records one audit row per table sync.
//!
//! # Architecture
//!
//! One generic [`TableSyncer`] is driven by a [`TableSyncSpec`] per table;
//! nothing table-specific lives outside the spec. Collaborators are injected
//! as trait objects:
//!
//! - **Source** ([`ContentSource`]): enumerates every record of a database
//! - **Destination** ([`Destination`]): upserts rows keyed on a conflict key
//! - **Audit** ([`AuditSink`]): stores one [`AuditEntry`] per table sync
//!
//! ## Sync Process
//!
//! 1. **Resolve**: look up the table's source database id; unset means skip
//! 2. **Fetch**: pull every record (a failed fetch fails the table)
//! 3. **Map**: extract each field into a [`DestinationRow`](contentsync_types::DestinationRow)
//! 4. **Upsert**: write the row; a failed record is noted and skipped
//! 5. **Audit**: persist the table's stats, best effort
//!
//! [`SyncOrchestrator`] runs every table, isolates failures and panics per
//! table, and aggregates a [`RunSummary`].
//!
//! # Example
//!
//! ```no_run
//! use contentsync_sync::{
//!     builtin_tables, SourceRefs, SqliteStore, SyncConfig, SyncOrchestrator,
//!     NotionConfig, NotionSource,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> contentsync_sync::SyncResult<()> {
//! let source = NotionSource::new(NotionConfig {
//!     api_key: "secret".to_string(),
//!     ..Default::default()
//! })?;
//! let store = Arc::new(SqliteStore::open_in_memory()?);
//! let refs = SourceRefs::new().with("NOTION_BLOG_POSTS_DB_ID", "db-1");
//!
//! let orchestrator = SyncOrchestrator::from_parts(
//!     Arc::new(source),
//!     store.clone(),
//!     store,
//!     refs,
//!     SyncConfig::default(),
//! );
//! let summary = orchestrator.run_all(&builtin_tables()).await;
//! println!("{} records synced", summary.total_records_synced());
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod catalog;
pub mod config;
pub mod destination;
mod error;
pub mod extract;
mod orchestrator;
pub mod source;
pub mod spec;
pub mod stats;
mod syncer;

pub use audit::{AuditLogger, AuditSink};
pub use catalog::builtin_tables;
pub use config::SyncConfig;
pub use destination::{
    Destination, PostgrestConfig, PostgrestStore, SqliteStore, UpsertOutcome,
};
pub use error::{SyncError, SyncResult};
pub use extract::{ExtractionError, extract, extract_from, try_extract, unset_value};
pub use orchestrator::SyncOrchestrator;
pub use source::{ContentSource, NotionConfig, NotionSource};
pub use spec::{ColumnMapping, SourceRefs, TableSyncSpec, validate_identifier};
pub use stats::{AuditEntry, RunSummary, SyncStats, SyncStatus, TableReport};
pub use syncer::TableSyncer;
