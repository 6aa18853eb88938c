//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default audit table name.
pub const DEFAULT_AUDIT_TABLE: &str = "content_sync_log";

/// Default `sync_type` written to every audit entry.
pub const DEFAULT_SYNC_TYPE: &str = "notion_to_supabase";

/// Default column that receives the extraction timestamp.
pub const DEFAULT_SYNCED_AT_COLUMN: &str = "last_synced_at";

/// Configuration for a sync run.
///
/// Deserializes from the `[sync]` section of the runner's TOML file; any
/// omitted key keeps its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Constant recorded in the audit table's `sync_type` column.
    pub sync_type: String,
    /// Name of the audit table.
    pub audit_table: String,
    /// Column set to the extraction time on every row.
    pub synced_at_column: String,
    /// Timeout for one table's complete source fetch (seconds).
    pub fetch_timeout_secs: u64,
    /// Timeout for a single row upsert (seconds).
    pub upsert_timeout_secs: u64,
    /// Deadline for the whole run (seconds). Tables not yet started when it
    /// passes are recorded as failed; tables in flight finish normally.
    pub run_deadline_secs: u64,
    /// Maximum number of tables synced at the same time. `1` runs tables
    /// strictly in order.
    pub max_concurrent_tables: usize,
    /// Fetch and map records without writing rows or audit entries.
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_type: DEFAULT_SYNC_TYPE.to_string(),
            audit_table: DEFAULT_AUDIT_TABLE.to_string(),
            synced_at_column: DEFAULT_SYNCED_AT_COLUMN.to_string(),
            fetch_timeout_secs: 60,
            upsert_timeout_secs: 30,
            run_deadline_secs: 600,
            max_concurrent_tables: 1,
            dry_run: false,
        }
    }
}

impl SyncConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn upsert_timeout(&self) -> Duration {
        Duration::from_secs(self.upsert_timeout_secs)
    }

    pub fn run_deadline(&self) -> Duration {
        Duration::from_secs(self.run_deadline_secs)
    }

    /// Effective table concurrency (never below one).
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_tables.max(1)
    }
}
