//! Per-table sync routine.
//!
//! [`TableSyncer::sync`] runs one table end to end: resolve the source
//! reference, fetch every record, map and upsert each record on its own, then
//! hand the final report to the audit logger.
//!
//! Failure scopes:
//! - unset reference: table skipped, nothing written, no audit entry
//! - fetch failure or timeout: table `failed`, audit entry still written
//! - mapping or upsert failure: one message in `errors`, next record proceeds

use crate::audit::{AuditLogger, AuditSink};
use crate::config::SyncConfig;
use crate::destination::{Destination, UpsertOutcome};
use crate::error::{SyncError, SyncResult};
use crate::extract::try_extract;
use crate::source::ContentSource;
use crate::spec::{SourceRefs, TableSyncSpec};
use crate::stats::{AuditEntry, SyncStats, SyncStatus, TableReport};
use chrono::{DateTime, Utc};
use contentsync_types::{DestinationRow, ExternalRecord, NormalizedValue};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Syncs tables one at a time against injected collaborators.
pub struct TableSyncer {
    source: Arc<dyn ContentSource>,
    destination: Arc<dyn Destination>,
    audit: AuditLogger,
    refs: SourceRefs,
    config: SyncConfig,
}

impl TableSyncer {
    pub fn new(
        source: Arc<dyn ContentSource>,
        destination: Arc<dyn Destination>,
        audit_sink: Arc<dyn AuditSink>,
        refs: SourceRefs,
        config: SyncConfig,
    ) -> Self {
        Self {
            source,
            destination,
            audit: AuditLogger::new(audit_sink),
            refs,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn refs(&self) -> &SourceRefs {
        &self.refs
    }

    /// Syncs one table and returns its report. Never fails; every error is
    /// folded into the report.
    pub async fn sync(&self, spec: &TableSyncSpec) -> TableReport {
        let started_at = Utc::now();

        let Some(database_id) = self.refs.resolve(&spec.source_ref) else {
            warn!("{} not set, skipping {} sync", spec.source_ref, spec.table);
            return TableReport::skipped(&spec.table, started_at);
        };

        info!("Syncing {}...", spec.table);

        let fetched = timeout(self.config.fetch_timeout(), self.source.fetch_all(database_id)).await;
        let records = match fetched {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                let message = format!("Fatal error syncing {}: {}", spec.table, e);
                return self.fail(spec, message, started_at).await;
            }
            Err(_) => {
                let e = SyncError::Timeout(format!("fetch from {}", self.source.provider_name()));
                let message = format!("Fatal error syncing {}: {}", spec.table, e);
                return self.fail(spec, message, started_at).await;
            }
        };

        let mut stats = SyncStats::new();
        stats.records_seen = records.len() as u64;

        for record in &records {
            match self.sync_record(spec, record).await {
                Ok(outcome) => stats.record_upsert(outcome),
                Err(e) => {
                    let message =
                        format!("Error syncing {} {}: {}", spec.record_label, record.id, e);
                    error!("{}", message);
                    stats.record_error(message);
                }
            }
        }

        info!(
            "Synced {} records into {} ({} errors)",
            stats.records_synced,
            spec.table,
            stats.error_count()
        );

        let report = TableReport {
            table: spec.table.clone(),
            status: SyncStatus::Success,
            stats,
            started_at,
            completed_at: Utc::now(),
        };
        self.write_audit(&report).await;
        report
    }

    /// Records a table-level failure: logs it, builds a `failed` report with
    /// `message` as its only error, and writes the audit entry.
    pub async fn fail(
        &self,
        spec: &TableSyncSpec,
        message: String,
        started_at: DateTime<Utc>,
    ) -> TableReport {
        error!("{}", message);
        let report = TableReport::failed(&spec.table, message, started_at);
        self.write_audit(&report).await;
        report
    }

    /// Builds the destination row for one record.
    ///
    /// The conflict key always carries the record id. A field that cannot be
    /// read is logged and written as null (or the column's fallback).
    pub fn map_record(
        &self,
        spec: &TableSyncSpec,
        record: &ExternalRecord,
    ) -> SyncResult<DestinationRow> {
        if let Some(reason) = record.malformed_reason() {
            return Err(SyncError::MalformedRecord(reason.to_string()));
        }
        let id = record.id.as_str();
        if id.trim().is_empty() {
            return Err(SyncError::InvalidIdentifier(id.to_string()));
        }

        let mut row = DestinationRow::new();
        row.set(spec.conflict_key.as_str(), id);

        for mapping in &spec.columns {
            let value = match try_extract(&record.properties, &mapping.field, mapping.kind) {
                Ok(value) => value,
                Err(e) => {
                    warn!(
                        "Error extracting property {} of {} {} in {}: {}",
                        mapping.field, spec.record_label, id, spec.table, e
                    );
                    NormalizedValue::Null
                }
            };
            row.set(mapping.column.as_str(), mapping.resolve(value));
        }

        row.set(
            self.config.synced_at_column.as_str(),
            Utc::now().to_rfc3339(),
        );
        Ok(row)
    }

    async fn sync_record(
        &self,
        spec: &TableSyncSpec,
        record: &ExternalRecord,
    ) -> SyncResult<UpsertOutcome> {
        let row = self.map_record(spec, record)?;
        if self.config.dry_run {
            debug!("Dry run: mapped {} {}", spec.record_label, record.id);
            return Ok(UpsertOutcome::Merged);
        }

        timeout(
            self.config.upsert_timeout(),
            self.destination
                .upsert(&spec.table, &row, &spec.conflict_key),
        )
        .await
        .map_err(|_| {
            SyncError::Timeout(format!(
                "upsert into {}",
                self.destination.provider_name()
            ))
        })?
    }

    async fn write_audit(&self, report: &TableReport) {
        if self.config.dry_run {
            debug!("Dry run: not logging sync result for {}", report.table);
            return;
        }
        let entry = AuditEntry::from_report(report, &self.config.sync_type);
        self.audit.record(&entry).await;
    }
}
