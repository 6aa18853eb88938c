//! Sync counters, audit entries, and run summaries.

use crate::destination::UpsertOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Counters and errors for one table sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    /// Records returned by the source.
    pub records_seen: u64,
    /// Rows upserted successfully.
    pub records_synced: u64,
    /// Rows the destination reported as new.
    pub records_created: u64,
    /// Rows the destination reported as replaced.
    pub records_updated: u64,
    /// Rows removed at the destination. Deletions are never propagated, so
    /// this stays zero; it exists to fill the audit column.
    pub records_deleted: u64,
    /// Error messages in the order they occurred.
    pub errors: Vec<String>,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one successful upsert.
    pub fn record_upsert(&mut self, outcome: UpsertOutcome) {
        self.records_synced += 1;
        match outcome {
            UpsertOutcome::Created => self.records_created += 1,
            UpsertOutcome::Updated => self.records_updated += 1,
            UpsertOutcome::Merged => {}
        }
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// True when nothing was seen, written, or failed.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Outcome of one table sync.
///
/// `Skipped` marks a table whose source reference is not configured. It is
/// reported in the run summary but never written to the audit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Failed,
    Skipped,
}

impl SyncStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
            SyncStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the audit table.
///
/// Field names match the audit table's columns so the entry can be posted to
/// a REST endpoint as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub table_name: String,
    pub sync_type: String,
    #[serde(rename = "sync_status")]
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub records_synced: u64,
    pub records_created: u64,
    pub records_updated: u64,
    pub records_deleted: u64,
    pub errors: Vec<String>,
}

impl AuditEntry {
    pub fn from_report(report: &TableReport, sync_type: &str) -> Self {
        Self {
            table_name: report.table.clone(),
            sync_type: sync_type.to_string(),
            status: report.status,
            started_at: report.started_at,
            completed_at: report.completed_at,
            records_synced: report.stats.records_synced,
            records_created: report.stats.records_created,
            records_updated: report.stats.records_updated,
            records_deleted: report.stats.records_deleted,
            errors: report.stats.errors.clone(),
        }
    }
}

/// Final state of one table sync, as handed back to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct TableReport {
    pub table: String,
    pub status: SyncStatus,
    pub stats: SyncStats,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl TableReport {
    pub fn skipped(table: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            table: table.into(),
            status: SyncStatus::Skipped,
            stats: SyncStats::default(),
            started_at: at,
            completed_at: at,
        }
    }

    /// A table-level failure with a single error message.
    pub fn failed(
        table: impl Into<String>,
        message: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut stats = SyncStats::default();
        stats.record_error(message);
        Self {
            table: table.into(),
            status: SyncStatus::Failed,
            stats,
            started_at,
            completed_at: Utc::now(),
        }
    }

    pub fn duration(&self) -> Duration {
        (self.completed_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Aggregate of one orchestrator run. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Per-table reports in the order the tables were given.
    pub tables: Vec<TableReport>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn total_records_synced(&self) -> u64 {
        self.tables.iter().map(|t| t.stats.records_synced).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.tables.iter().map(|t| t.stats.error_count()).sum()
    }

    pub fn count(&self, status: SyncStatus) -> usize {
        self.tables.iter().filter(|t| t.status == status).count()
    }

    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn duration(&self) -> Duration {
        (self.completed_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}
