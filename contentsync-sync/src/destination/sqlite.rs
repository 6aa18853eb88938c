//! Local SQLite destination and audit log.
//!
//! Serves as a self-contained content cache: destination tables are created
//! from their [`TableSyncSpec`] on demand, and audit entries land in a table
//! of the same shape the hosted store uses. All statements run on the
//! blocking pool so the async runtime never waits on disk I/O.

use super::{Destination, UpsertOutcome};
use crate::audit::AuditSink;
use crate::config::DEFAULT_AUDIT_TABLE;
use crate::error::{SyncError, SyncResult};
use crate::spec::{TableSyncSpec, validate_identifier};
use crate::stats::{AuditEntry, SyncStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contentsync_types::{DestinationRow, FieldKind, NormalizedValue};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// SQLite-backed destination.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    audit_table: String,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn new(path: impl AsRef<Path>, audit_table: &str) -> SyncResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| SyncError::Storage(format!("failed to open sqlite store: {e}")))?;
        Self::with_connection(conn, audit_table)
    }

    /// Opens an in-memory store with the default audit table (for testing).
    pub fn open_in_memory() -> SyncResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            SyncError::Storage(format!("failed to open in-memory sqlite store: {e}"))
        })?;
        Self::with_connection(conn, DEFAULT_AUDIT_TABLE)
    }

    fn with_connection(conn: Connection, audit_table: &str) -> SyncResult<Self> {
        validate_identifier(audit_table)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            audit_table: audit_table.to_string(),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn audit_table(&self) -> &str {
        &self.audit_table
    }

    fn init_schema(&self) -> SyncResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(&format!(
            "
            CREATE TABLE IF NOT EXISTS \"{table}\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                table_name TEXT NOT NULL,
                sync_type TEXT NOT NULL,
                sync_status TEXT NOT NULL,
                started_at TEXT NOT NULL,
                completed_at TEXT NOT NULL,
                records_synced INTEGER NOT NULL DEFAULT 0,
                records_created INTEGER NOT NULL DEFAULT 0,
                records_updated INTEGER NOT NULL DEFAULT 0,
                records_deleted INTEGER NOT NULL DEFAULT 0,
                errors TEXT NOT NULL DEFAULT '[]'
            );
            ",
            table = self.audit_table
        ))
        .map_err(|e| SyncError::Storage(format!("failed to init audit schema: {e}")))?;
        Ok(())
    }

    /// Creates the destination table for `spec` if it does not exist.
    ///
    /// An existing table is left untouched, even when its columns differ.
    pub fn ensure_table(&self, spec: &TableSyncSpec, synced_at_column: &str) -> SyncResult<()> {
        spec.validate(synced_at_column)?;
        validate_identifier(synced_at_column)?;

        let mut columns = vec![
            "id INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
            format!("\"{}\" TEXT NOT NULL UNIQUE", spec.conflict_key),
        ];
        for mapping in &spec.columns {
            columns.push(format!("\"{}\" {}", mapping.column, column_type(mapping.kind)));
        }
        columns.push(format!("\"{synced_at_column}\" TEXT"));

        let sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
            spec.table,
            columns.join(", ")
        );
        let conn = lock(&self.conn)?;
        conn.execute(&sql, [])
            .map_err(|e| SyncError::Storage(format!("failed to create {}: {e}", spec.table)))?;
        debug!("Ensured table {}", spec.table);
        Ok(())
    }

    /// Returns the number of rows in a table.
    pub fn row_count(&self, table: &str) -> SyncResult<usize> {
        validate_identifier(table)?;
        let conn = lock(&self.conn)?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| row.get(0))
            .map_err(|e| SyncError::Storage(format!("failed to count {table}: {e}")))?;
        Ok(count as usize)
    }

    /// Loads the row whose `key_column` equals `key`, as a JSON object keyed
    /// by column name.
    pub fn fetch_row(
        &self,
        table: &str,
        key_column: &str,
        key: &str,
    ) -> SyncResult<Option<Map<String, Value>>> {
        validate_identifier(table)?;
        validate_identifier(key_column)?;
        let conn = lock(&self.conn)?;
        let mut stmt = conn
            .prepare(&format!("SELECT * FROM \"{table}\" WHERE \"{key_column}\" = ?1"))
            .map_err(|e| SyncError::Storage(format!("failed to prepare row query: {e}")))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        stmt.query_row(params![key], |row| {
            let mut map = Map::new();
            for (index, name) in names.iter().enumerate() {
                map.insert(name.clone(), sql_to_json(row.get_ref(index)?));
            }
            Ok(map)
        })
        .optional()
        .map_err(|e| SyncError::Storage(format!("failed to read row from {table}: {e}")))
    }

    /// Loads audit entries, newest first.
    pub fn load_audit_log(&self, limit: usize, offset: usize) -> SyncResult<Vec<AuditEntry>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT table_name, sync_type, sync_status, started_at, completed_at,
                        records_synced, records_created, records_updated, records_deleted, errors
                 FROM \"{}\" ORDER BY id DESC LIMIT ?1 OFFSET ?2",
                self.audit_table
            ))
            .map_err(|e| SyncError::Storage(format!("failed to prepare audit query: {e}")))?;

        let rows = stmt
            .query_map(params![limit as i64, offset as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    [
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, i64>(7)?,
                        row.get::<_, i64>(8)?,
                    ],
                    row.get::<_, String>(9)?,
                ))
            })
            .map_err(|e| SyncError::Storage(format!("failed to query audit log: {e}")))?;

        let mut result = Vec::new();
        for row in rows {
            let (table_name, sync_type, status, started_at, completed_at, counts, errors) =
                row.map_err(|e| SyncError::Storage(format!("failed to read audit row: {e}")))?;
            let [synced, created, updated, deleted] = counts;
            result.push(AuditEntry {
                table_name,
                sync_type,
                status: parse_status(&status)?,
                started_at: parse_timestamp(&started_at)?,
                completed_at: parse_timestamp(&completed_at)?,
                records_synced: synced as u64,
                records_created: created as u64,
                records_updated: updated as u64,
                records_deleted: deleted as u64,
                errors: serde_json::from_str(&errors)?,
            });
        }
        Ok(result)
    }

    /// Returns the total number of audit entries.
    pub fn audit_log_count(&self) -> SyncResult<usize> {
        self.row_count(&self.audit_table)
    }
}

#[async_trait]
impl Destination for SqliteStore {
    fn provider_name(&self) -> &'static str {
        "SQLite"
    }

    async fn upsert(
        &self,
        table: &str,
        row: &DestinationRow,
        conflict_key: &str,
    ) -> SyncResult<UpsertOutcome> {
        validate_identifier(table)?;
        validate_identifier(conflict_key)?;
        for column in row.column_names() {
            validate_identifier(column)?;
        }
        let key = row
            .get(conflict_key)
            .and_then(NormalizedValue::as_str)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                SyncError::Storage(format!("row for {table} has no {conflict_key} value"))
            })?
            .to_string();

        let columns: Vec<String> = row.column_names().map(String::from).collect();
        let values = row
            .iter()
            .map(|(_, value)| to_sql_value(value))
            .collect::<SyncResult<Vec<_>>>()?;
        let probe = format!("SELECT 1 FROM \"{table}\" WHERE \"{conflict_key}\" = ?1");
        let insert = upsert_sql(table, &columns, conflict_key);

        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> SyncResult<UpsertOutcome> {
            let mut guard = lock(&conn)?;
            let tx = guard.transaction()?;
            let existed = tx
                .query_row(&probe, params![key], |_| Ok(()))
                .optional()?
                .is_some();
            tx.execute(&insert, params_from_iter(values))?;
            tx.commit()?;
            Ok(if existed {
                UpsertOutcome::Updated
            } else {
                UpsertOutcome::Created
            })
        })
        .await
        .map_err(|e| SyncError::Storage(format!("sqlite task failed: {e}")))?
    }
}

#[async_trait]
impl AuditSink for SqliteStore {
    async fn write_entry(&self, entry: &AuditEntry) -> SyncResult<()> {
        let sql = format!(
            "INSERT INTO \"{}\" (table_name, sync_type, sync_status, started_at, completed_at,
                records_synced, records_created, records_updated, records_deleted, errors)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            self.audit_table
        );
        let errors = serde_json::to_string(&entry.errors)?;
        let entry = entry.clone();
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || -> SyncResult<()> {
            let guard = lock(&conn)?;
            guard.execute(
                &sql,
                params![
                    entry.table_name,
                    entry.sync_type,
                    entry.status.as_str(),
                    entry.started_at.to_rfc3339(),
                    entry.completed_at.to_rfc3339(),
                    entry.records_synced as i64,
                    entry.records_created as i64,
                    entry.records_updated as i64,
                    entry.records_deleted as i64,
                    errors,
                ],
            )
            .map_err(|e| SyncError::Storage(format!("failed to save audit entry: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| SyncError::Storage(format!("sqlite task failed: {e}")))?
    }
}

fn lock(conn: &Mutex<Connection>) -> SyncResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| SyncError::Storage("sqlite connection lock poisoned".to_string()))
}

fn column_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Number => "NUMERIC",
        FieldKind::Boolean => "INTEGER",
        // Lists are stored as JSON text.
        FieldKind::Title
        | FieldKind::Text
        | FieldKind::EnumSingle
        | FieldKind::EnumMulti
        | FieldKind::Date
        | FieldKind::Url
        | FieldKind::RelationIds => "TEXT",
    }
}

fn upsert_sql(table: &str, columns: &[String], conflict_key: &str) -> String {
    let names = columns
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = columns
        .iter()
        .filter(|c| c.as_str() != conflict_key)
        .map(|c| format!("\"{c}\" = excluded.\"{c}\""))
        .collect::<Vec<_>>();

    let action = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };
    format!(
        "INSERT INTO \"{table}\" ({names}) VALUES ({placeholders}) \
         ON CONFLICT(\"{conflict_key}\") {action}"
    )
}

fn to_sql_value(value: &NormalizedValue) -> SyncResult<SqlValue> {
    Ok(match value {
        NormalizedValue::Null => SqlValue::Null,
        NormalizedValue::Bool(b) => SqlValue::Integer(i64::from(*b)),
        NormalizedValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => SqlValue::Integer(i),
            (None, Some(f)) => SqlValue::Real(f),
            (None, None) => SqlValue::Null,
        },
        NormalizedValue::Text(s) => SqlValue::Text(s.clone()),
        NormalizedValue::List(items) => SqlValue::Text(serde_json::to_string(items)?),
    })
}

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn parse_status(s: &str) -> SyncResult<SyncStatus> {
    match s {
        "success" => Ok(SyncStatus::Success),
        "failed" => Ok(SyncStatus::Failed),
        "skipped" => Ok(SyncStatus::Skipped),
        other => Err(SyncError::Storage(format!("unknown sync status in audit: {other}"))),
    }
}

fn parse_timestamp(s: &str) -> SyncResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| SyncError::Storage(format!("invalid timestamp in audit: {e}")))
}
