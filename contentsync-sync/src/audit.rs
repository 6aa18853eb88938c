//! Audit trail for table syncs.
//!
//! Sinks persist [`AuditEntry`] rows. The [`AuditLogger`] wraps a sink with the
//! engine's policy: one attempt, no retries, and failures are logged rather
//! than returned. A sink that panics is treated as a failed write.

use crate::error::SyncResult;
use crate::stats::AuditEntry;
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

/// Durable destination for audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends one entry.
    async fn write_entry(&self, entry: &AuditEntry) -> SyncResult<()>;
}

/// Best-effort front for an [`AuditSink`].
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
}

impl AuditLogger {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Writes the entry once. Returns whether the write succeeded.
    pub async fn record(&self, entry: &AuditEntry) -> bool {
        let write = AssertUnwindSafe(self.sink.write_entry(entry)).catch_unwind();
        match write.await {
            Ok(Ok(())) => {
                debug!(
                    "Logged {} sync result for {}",
                    entry.status, entry.table_name
                );
                true
            }
            Ok(Err(e)) => {
                error!(
                    "Failed to log sync result for {}: {}",
                    entry.table_name, e
                );
                false
            }
            Err(_) => {
                error!(
                    "Failed to log sync result for {}: audit sink panicked",
                    entry.table_name
                );
                false
            }
        }
    }
}
