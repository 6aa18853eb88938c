//! External records as delivered by the content source.
//!
//! A record is read-only to the engine: it carries the source's stable
//! identifier and the raw, source-shaped property containers keyed by field
//! name. Interpreting those containers is the extractor's job.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a record in the content source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a record ID from any string-like value.
    ///
    /// Callers that accept untrusted input should prefer [`RecordId::parse`],
    /// which rejects blank identifiers.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parses a record ID, rejecting blank strings.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(crate::Error::InvalidRecordId("record id is empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One item fetched from the content source.
///
/// The field layout matches a page object from the source API, so a page can
/// be deserialized directly into this type. Unknown top-level keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalRecord {
    /// Stable identifier used as the destination conflict key.
    pub id: RecordId,
    /// Property containers keyed by source field name.
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Last edit time reported by the source, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_time: Option<String>,
    /// Set when the source item could not be parsed. Such a record carries no
    /// properties and fails at mapping time.
    #[serde(skip)]
    pub malformed: Option<String>,
}

impl ExternalRecord {
    /// Creates a record with no properties.
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            properties: Map::new(),
            last_edited_time: None,
            malformed: None,
        }
    }

    /// Creates a placeholder for a source item that could not be parsed.
    pub fn malformed(id: impl Into<RecordId>, reason: impl Into<String>) -> Self {
        Self {
            malformed: Some(reason.into()),
            ..Self::new(id)
        }
    }

    /// Adds a raw property container (builder style).
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, container: Value) -> Self {
        self.properties.insert(name.into(), container);
        self
    }

    /// Returns the raw container for a field, if present.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Parses a record from a JSON page object.
    pub fn from_json(value: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parses a page object, keeping an unparseable one as a malformed
    /// record so a single bad item does not sink the whole page.
    ///
    /// The id is taken from the raw `id` key when it is a string, otherwise
    /// from its JSON text; a missing id leaves it empty.
    pub fn from_json_lossy(value: Value) -> Self {
        let id = match value.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        match Self::from_json(value) {
            Ok(record) => record,
            Err(e) => Self::malformed(id, e.to_string()),
        }
    }

    /// Why the source item could not be parsed, if it could not.
    pub fn malformed_reason(&self) -> Option<&str> {
        self.malformed.as_deref()
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
