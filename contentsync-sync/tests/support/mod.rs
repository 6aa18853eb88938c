//! In-process collaborators and property builders shared by the engine tests.

#![allow(dead_code)]

use async_trait::async_trait;
use contentsync_sync::{
    AuditEntry, AuditSink, ContentSource, Destination, SyncError, SyncResult, UpsertOutcome,
};
use contentsync_types::{DestinationRow, ExternalRecord};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

/// Installs a test subscriber when `RUST_LOG` is set.
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

// ── Property containers ─────────────────────────────────────────

pub fn title(text: &str) -> Value {
    json!({"type": "title", "title": [{"plain_text": text}]})
}

pub fn rich_text(fragments: &[&str]) -> Value {
    let parts: Vec<Value> = fragments.iter().map(|f| json!({"plain_text": f})).collect();
    json!({"type": "rich_text", "rich_text": parts})
}

pub fn select(name: &str) -> Value {
    json!({"type": "select", "select": {"name": name}})
}

pub fn multi_select(names: &[&str]) -> Value {
    let options: Vec<Value> = names.iter().map(|n| json!({"name": n})).collect();
    json!({"type": "multi_select", "multi_select": options})
}

pub fn number(n: Value) -> Value {
    json!({"type": "number", "number": n})
}

pub fn checkbox(flag: bool) -> Value {
    json!({"type": "checkbox", "checkbox": flag})
}

pub fn date(start: &str) -> Value {
    json!({"type": "date", "date": {"start": start, "end": null}})
}

pub fn url(u: &str) -> Value {
    json!({"type": "url", "url": u})
}

pub fn relation(ids: &[&str]) -> Value {
    let items: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
    json!({"type": "relation", "relation": items})
}

/// A record with a `Name` title property.
pub fn named_record(id: &str, name: &str) -> ExternalRecord {
    ExternalRecord::new(id).with_property("Name", title(name))
}

// ── Source ──────────────────────────────────────────────────────

#[derive(Clone)]
enum Behavior {
    Records(Vec<ExternalRecord>),
    Fail(String),
    Panic,
    Hang,
}

/// Source serving canned records per database id.
#[derive(Default)]
pub struct FakeSource {
    databases: Mutex<HashMap<String, Behavior>>,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(self, database_id: &str, records: Vec<ExternalRecord>) -> Self {
        self.set_records(database_id, records);
        self
    }

    pub fn failing(self, database_id: &str, message: &str) -> Self {
        self.set(database_id, Behavior::Fail(message.to_string()));
        self
    }

    pub fn panicking(self, database_id: &str) -> Self {
        self.set(database_id, Behavior::Panic);
        self
    }

    pub fn hanging(self, database_id: &str) -> Self {
        self.set(database_id, Behavior::Hang);
        self
    }

    pub fn set_records(&self, database_id: &str, records: Vec<ExternalRecord>) {
        self.set(database_id, Behavior::Records(records));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn set(&self, database_id: &str, behavior: Behavior) {
        self.databases
            .lock()
            .unwrap()
            .insert(database_id.to_string(), behavior);
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    fn provider_name(&self) -> &'static str {
        "Fake"
    }

    async fn fetch_all(&self, database_id: &str) -> SyncResult<Vec<ExternalRecord>> {
        self.calls.lock().unwrap().push(database_id.to_string());
        let behavior = self.databases.lock().unwrap().get(database_id).cloned();
        match behavior {
            Some(Behavior::Records(records)) => Ok(records),
            Some(Behavior::Fail(message)) => Err(SyncError::Api {
                status: 500,
                message,
            }),
            Some(Behavior::Panic) => panic!("source exploded for {database_id}"),
            Some(Behavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Ok(Vec::new())
            }
            None => Err(SyncError::Api {
                status: 404,
                message: format!("database {database_id} not found"),
            }),
        }
    }
}

// ── Destination ─────────────────────────────────────────────────

/// Keyed in-memory tables. Upserts for ids listed in `fail_ids` are rejected;
/// a hanging destination never answers.
#[derive(Default)]
pub struct MemoryDestination {
    tables: Mutex<HashMap<String, BTreeMap<String, DestinationRow>>>,
    fail_ids: HashSet<String>,
    hang: bool,
    upserts: Mutex<usize>,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(ids: &[&str]) -> Self {
        Self {
            fail_ids: ids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn rows(&self, table: &str) -> BTreeMap<String, DestinationRow> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn upsert_count(&self) -> usize {
        *self.upserts.lock().unwrap()
    }
}

#[async_trait]
impl Destination for MemoryDestination {
    fn provider_name(&self) -> &'static str {
        "Memory"
    }

    async fn upsert(
        &self,
        table: &str,
        row: &DestinationRow,
        conflict_key: &str,
    ) -> SyncResult<UpsertOutcome> {
        *self.upserts.lock().unwrap() += 1;
        if self.hang {
            tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
        }
        let key = row
            .get(conflict_key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| SyncError::Storage("missing conflict key".to_string()))?
            .to_string();
        if self.fail_ids.contains(&key) {
            return Err(SyncError::Storage(format!("constraint violated for {key}")));
        }
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        Ok(match rows.insert(key, row.clone()) {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Created,
        })
    }
}

// ── Audit ───────────────────────────────────────────────────────

/// Collects audit entries, or rejects every write when `failing`, or panics
/// on every write when `panicking`.
#[derive(Default)]
pub struct MemoryAudit {
    entries: Mutex<Vec<AuditEntry>>,
    failing: bool,
    panicking: bool,
    attempts: Mutex<usize>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panicking: true,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn entry_for(&self, table: &str) -> Option<AuditEntry> {
        self.entries()
            .into_iter()
            .find(|e| e.table_name == table)
    }
}

#[async_trait]
impl AuditSink for MemoryAudit {
    async fn write_entry(&self, entry: &AuditEntry) -> SyncResult<()> {
        *self.attempts.lock().unwrap() += 1;
        if self.panicking {
            panic!("audit store exploded for {}", entry.table_name);
        }
        if self.failing {
            return Err(SyncError::Network("audit store unreachable".to_string()));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
