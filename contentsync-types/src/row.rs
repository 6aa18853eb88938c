//! Flat destination rows.

use crate::NormalizedValue;
use serde_json::{Map, Value};

/// An ordered mapping from destination column to normalized value.
///
/// Column order follows insertion order, which keeps generated SQL and
/// request bodies deterministic. Setting an existing column replaces its value
/// in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DestinationRow {
    columns: Vec<(String, NormalizedValue)>,
}

impl DestinationRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column, replacing any previous value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<NormalizedValue>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Builder-style [`DestinationRow::set`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<NormalizedValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&NormalizedValue> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NormalizedValue)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Renders the row as a JSON object (column order preserved only as far
    /// as the JSON map implementation preserves it).
    #[must_use]
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .columns
            .iter()
            .map(|(c, v)| (c.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }
}
