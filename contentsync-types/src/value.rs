//! Normalized values produced by property extraction.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A flat, destination-ready value.
///
/// Serializes untagged, so a value encodes as the plain JSON scalar or array
/// a relational REST endpoint expects.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    List(Vec<String>),
}

impl NormalizedValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, NormalizedValue::Null)
    }

    /// True for null and for the empty string. Column fallbacks apply to
    /// blank values.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            NormalizedValue::Null => true,
            NormalizedValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NormalizedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NormalizedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            NormalizedValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            NormalizedValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            NormalizedValue::Null => Value::Null,
            NormalizedValue::Bool(b) => Value::Bool(*b),
            NormalizedValue::Number(n) => Value::Number(n.clone()),
            NormalizedValue::Text(s) => Value::String(s.clone()),
            NormalizedValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

impl From<&str> for NormalizedValue {
    fn from(s: &str) -> Self {
        NormalizedValue::Text(s.to_string())
    }
}

impl From<String> for NormalizedValue {
    fn from(s: String) -> Self {
        NormalizedValue::Text(s)
    }
}

impl From<bool> for NormalizedValue {
    fn from(b: bool) -> Self {
        NormalizedValue::Bool(b)
    }
}

impl From<i64> for NormalizedValue {
    fn from(n: i64) -> Self {
        NormalizedValue::Number(n.into())
    }
}

impl From<f64> for NormalizedValue {
    /// Non-finite floats have no JSON representation and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(NormalizedValue::Null, NormalizedValue::Number)
    }
}

impl From<Vec<String>> for NormalizedValue {
    fn from(items: Vec<String>) -> Self {
        NormalizedValue::List(items)
    }
}

impl<T: Into<NormalizedValue>> From<Option<T>> for NormalizedValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(NormalizedValue::Null, Into::into)
    }
}
