//! Run-level orchestration.
//!
//! Every table runs in its own task, so a panic inside one table sync is
//! contained by its `JoinHandle` and recorded as that table's failure. With a
//! concurrency of one the tables run strictly in order; above that a semaphore
//! bounds how many are in flight. Reports always come back in input order.

use crate::audit::AuditSink;
use crate::config::SyncConfig;
use crate::destination::Destination;
use crate::source::ContentSource;
use crate::spec::{SourceRefs, TableSyncSpec};
use crate::stats::{RunSummary, SyncStatus, TableReport};
use crate::syncer::TableSyncer;
use chrono::Utc;
use futures::future::join_all;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::info;

/// Runs every configured table and aggregates the outcome.
pub struct SyncOrchestrator {
    syncer: Arc<TableSyncer>,
}

impl SyncOrchestrator {
    pub fn new(syncer: Arc<TableSyncer>) -> Self {
        Self { syncer }
    }

    /// Builds the syncer from its collaborators.
    pub fn from_parts(
        source: Arc<dyn ContentSource>,
        destination: Arc<dyn Destination>,
        audit_sink: Arc<dyn AuditSink>,
        refs: SourceRefs,
        config: SyncConfig,
    ) -> Self {
        Self::new(Arc::new(TableSyncer::new(
            source,
            destination,
            audit_sink,
            refs,
            config,
        )))
    }

    pub fn syncer(&self) -> &Arc<TableSyncer> {
        &self.syncer
    }

    /// Syncs every table in `specs` and logs the run summary.
    pub async fn run_all(&self, specs: &[TableSyncSpec]) -> RunSummary {
        let started_at = Utc::now();
        let config = self.syncer.config();
        let deadline = Instant::now() + config.run_deadline();
        let concurrency = config.concurrency();

        info!(
            "Starting sync of {} tables (concurrency {})",
            specs.len(),
            concurrency
        );

        let tables = if concurrency == 1 {
            let mut reports = Vec::with_capacity(specs.len());
            for spec in specs {
                reports.push(run_table(Arc::clone(&self.syncer), spec.clone(), deadline).await);
            }
            reports
        } else {
            self.run_bounded(specs, concurrency, deadline).await
        };

        let summary = RunSummary {
            tables,
            started_at,
            completed_at: Utc::now(),
        };
        log_summary(&summary);
        summary
    }

    async fn run_bounded(
        &self,
        specs: &[TableSyncSpec],
        concurrency: usize,
        deadline: Instant,
    ) -> Vec<TableReport> {
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let handles: Vec<_> = specs
            .iter()
            .map(|spec| {
                let semaphore = Arc::clone(&semaphore);
                let syncer = Arc::clone(&self.syncer);
                let spec = spec.clone();
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    run_table(syncer, spec, deadline).await
                })
            })
            .collect();

        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(specs.len());
        for (joined, spec) in join_all(handles).await.into_iter().zip(specs) {
            let report = match joined {
                Ok(report) => report,
                Err(e) => {
                    let message =
                        format!("Fatal error syncing {}: {}", spec.table, join_error_message(e));
                    self.syncer.fail(spec, message, started_at).await
                }
            };
            reports.push(report);
        }
        reports
    }
}

/// Runs one table in its own task, honouring the run deadline.
async fn run_table(syncer: Arc<TableSyncer>, spec: TableSyncSpec, deadline: Instant) -> TableReport {
    let started_at = Utc::now();
    if Instant::now() >= deadline {
        let message = format!("Run deadline passed before {} started", spec.table);
        return syncer.fail(&spec, message, started_at).await;
    }

    let task = {
        let syncer = Arc::clone(&syncer);
        let spec = spec.clone();
        tokio::spawn(async move { syncer.sync(&spec).await })
    };

    match task.await {
        Ok(report) => report,
        Err(e) => {
            let message = format!("Fatal error syncing {}: {}", spec.table, join_error_message(e));
            syncer.fail(&spec, message, started_at).await
        }
    }
}

fn join_error_message(e: JoinError) -> String {
    if e.is_panic() {
        format!("panicked: {}", panic_message(e.into_panic().as_ref()))
    } else {
        "task cancelled".to_string()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn log_summary(summary: &RunSummary) {
    info!("=== Sync Complete ===");
    for report in &summary.tables {
        info!(
            "{}: {} ({} synced, {} errors)",
            report.table,
            report.status,
            report.stats.records_synced,
            report.stats.error_count()
        );
    }
    info!(
        "Tables: {} succeeded, {} failed, {} skipped",
        summary.count(SyncStatus::Success),
        summary.count(SyncStatus::Failed),
        summary.count(SyncStatus::Skipped)
    );
    info!("Total records synced: {}", summary.total_records_synced());
    info!("Total errors: {}", summary.total_errors());
    info!("Duration: {:.1}s", summary.duration().as_secs_f64());
}
