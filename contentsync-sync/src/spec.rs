//! Table sync specifications and source reference resolution.
//!
//! A [`TableSyncSpec`] is fixed for the whole run: it names the destination
//! table, the configuration reference that yields the source database id, the
//! conflict-key column, and the ordered column mappings. The engine has one
//! generic syncer; everything table-specific lives here.

use crate::error::{SyncError, SyncResult};
use contentsync_types::{FieldKind, NormalizedValue};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Default conflict-key column.
pub const DEFAULT_CONFLICT_KEY: &str = "notion_id";

/// One destination column fed from one source field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Destination column name.
    pub column: String,
    /// Source field name.
    pub field: String,
    /// How the source field is read.
    pub kind: FieldKind,
    /// Value written instead of a null or empty-string extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<NormalizedValue>,
}

impl ColumnMapping {
    pub fn new(column: impl Into<String>, field: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            column: column.into(),
            field: field.into(),
            kind,
            fallback: None,
        }
    }

    /// Applies the fallback to a blank value.
    pub fn resolve(&self, value: NormalizedValue) -> NormalizedValue {
        match &self.fallback {
            Some(fallback) if value.is_blank() => fallback.clone(),
            _ => value,
        }
    }
}

fn default_conflict_key() -> String {
    DEFAULT_CONFLICT_KEY.to_string()
}

fn default_record_label() -> String {
    "record".to_string()
}

/// Static configuration for syncing one destination table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSyncSpec {
    /// Destination table name.
    pub table: String,
    /// Name of the configuration reference holding the source database id
    /// (e.g. `NOTION_BLOG_POSTS_DB_ID`).
    pub source_ref: String,
    /// Column that receives the record's external id and decides
    /// insert-vs-update.
    #[serde(default = "default_conflict_key")]
    pub conflict_key: String,
    /// Singular noun used in per-record error messages ("blog post").
    #[serde(default = "default_record_label")]
    pub record_label: String,
    /// Ordered column mappings.
    #[serde(default)]
    pub columns: Vec<ColumnMapping>,
}

impl TableSyncSpec {
    pub fn new(table: impl Into<String>, source_ref: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            source_ref: source_ref.into(),
            conflict_key: default_conflict_key(),
            record_label: default_record_label(),
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_conflict_key(mut self, column: impl Into<String>) -> Self {
        self.conflict_key = column.into();
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.record_label = label.into();
        self
    }

    /// Appends a column mapping.
    #[must_use]
    pub fn column(mut self, column: &str, field: &str, kind: FieldKind) -> Self {
        self.columns.push(ColumnMapping::new(column, field, kind));
        self
    }

    /// Appends a column mapping with a fallback for blank values.
    #[must_use]
    pub fn column_or(
        mut self,
        column: &str,
        field: &str,
        kind: FieldKind,
        fallback: impl Into<NormalizedValue>,
    ) -> Self {
        let mut mapping = ColumnMapping::new(column, field, kind);
        mapping.fallback = Some(fallback.into());
        self.columns.push(mapping);
        self
    }

    /// Checks names and column uniqueness.
    ///
    /// The conflict key is always filled from the record id, so mapping a
    /// source field into it is rejected, as is mapping into the timestamp
    /// column.
    pub fn validate(&self, synced_at_column: &str) -> SyncResult<()> {
        validate_identifier(&self.table)?;
        validate_identifier(&self.conflict_key)?;
        if self.source_ref.trim().is_empty() {
            return Err(SyncError::Config(format!(
                "table {} has an empty source reference",
                self.table
            )));
        }
        if self.columns.is_empty() {
            return Err(SyncError::Config(format!(
                "table {} maps no columns",
                self.table
            )));
        }

        let mut seen = HashSet::new();
        for mapping in &self.columns {
            validate_identifier(&mapping.column)?;
            if mapping.field.is_empty() {
                return Err(SyncError::Config(format!(
                    "table {}: column {} has an empty source field",
                    self.table, mapping.column
                )));
            }
            if mapping.column == self.conflict_key || mapping.column == synced_at_column {
                return Err(SyncError::Config(format!(
                    "table {}: column {} is reserved",
                    self.table, mapping.column
                )));
            }
            if !seen.insert(mapping.column.as_str()) {
                return Err(SyncError::Config(format!(
                    "table {}: column {} mapped twice",
                    self.table, mapping.column
                )));
            }
        }
        Ok(())
    }
}

/// Returns `Ok` when `name` is a plain SQL identifier
/// (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn validate_identifier(name: &str) -> SyncResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SyncError::InvalidIdentifier(name.to_string()))
    }
}

/// Source database ids keyed by reference name, resolved once at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRefs {
    refs: HashMap<String, String>,
}

impl SourceRefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every reference named by `specs` through `lookup`
    /// (typically the process environment).
    pub fn from_lookup<F>(specs: &[TableSyncSpec], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut refs = Self::new();
        for spec in specs {
            if let Some(id) = lookup(&spec.source_ref) {
                refs.insert(spec.source_ref.clone(), id);
            }
        }
        refs
    }

    pub fn insert(&mut self, name: impl Into<String>, database_id: impl Into<String>) {
        self.refs.insert(name.into(), database_id.into());
    }

    /// Builder-style [`SourceRefs::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, database_id: impl Into<String>) -> Self {
        self.insert(name, database_id);
        self
    }

    /// Adds entries from `other` for names not already present.
    pub fn fill_from(&mut self, other: &HashMap<String, String>) {
        for (name, id) in other {
            self.refs
                .entry(name.clone())
                .or_insert_with(|| id.clone());
        }
    }

    /// Returns the database id for a reference. Blank values count as unset.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.refs
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}
