//! Property extraction: raw source containers to normalized values.
//!
//! Every source property arrives as a JSON container shaped like
//! `{"type": "<kind>", "<kind>": <payload>}`. The extractor reads the payload
//! under the key for the declared [`FieldKind`] and flattens it:
//!
//! | kind | result |
//! |---|---|
//! | `title` / `text` | concatenated `plain_text` fragments, `""` when unset |
//! | `enum_single` | selected option name, or null |
//! | `enum_multi` | selected option names, `[]` when unset |
//! | `number` | the number, or null |
//! | `boolean` | the flag, `false` when unset |
//! | `date` | the range's `start` string, or null |
//! | `url` | the URL, or null |
//! | `relation_ids` | related record ids, `[]` when unset |
//!
//! A field missing from the record behaves exactly like an unset field.
//! Malformed payloads produce an [`ExtractionError`] from [`try_extract`];
//! [`extract`] turns that into `Null` and logs a warning, so one bad field
//! never takes down its record.

use contentsync_types::{ExternalRecord, FieldKind, NormalizedValue};
use serde_json::{Map, Value};
use tracing::warn;

/// Result type for extraction.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Why a property container could not be read.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("field {field:?}: expected {expected}, found {found}")]
    UnexpectedShape {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field {field:?}: item {index} has no {key:?}")]
    MissingItemKey {
        field: String,
        index: usize,
        key: &'static str,
    },
}

/// The value a kind resolves to when its field is absent or unset.
#[must_use]
pub fn unset_value(kind: FieldKind) -> NormalizedValue {
    match kind {
        FieldKind::Title | FieldKind::Text => NormalizedValue::Text(String::new()),
        FieldKind::EnumMulti | FieldKind::RelationIds => NormalizedValue::List(Vec::new()),
        FieldKind::Boolean => NormalizedValue::Bool(false),
        FieldKind::EnumSingle | FieldKind::Number | FieldKind::Date | FieldKind::Url => {
            NormalizedValue::Null
        }
    }
}

/// Extracts a field, logging and nulling any failure.
pub fn extract(properties: &Map<String, Value>, field: &str, kind: FieldKind) -> NormalizedValue {
    match try_extract(properties, field, kind) {
        Ok(value) => value,
        Err(e) => {
            warn!("Error extracting property {}: {}", field, e);
            NormalizedValue::Null
        }
    }
}

/// Extracts a field from a record.
pub fn extract_from(record: &ExternalRecord, field: &str, kind: FieldKind) -> NormalizedValue {
    extract(&record.properties, field, kind)
}

/// Extracts a field, reporting malformed containers as errors.
pub fn try_extract(
    properties: &Map<String, Value>,
    field: &str,
    kind: FieldKind,
) -> ExtractionResult<NormalizedValue> {
    let container = match properties.get(field) {
        None | Some(Value::Null) => return Ok(unset_value(kind)),
        Some(Value::Object(map)) => map,
        Some(other) => return Err(shape_error(field, "object", other)),
    };

    let payload = match container.get(kind.source_key()) {
        None | Some(Value::Null) => return Ok(unset_value(kind)),
        Some(p) => p,
    };

    match kind {
        FieldKind::Title | FieldKind::Text => plain_text(field, payload),
        FieldKind::EnumSingle => option_name(field, payload),
        FieldKind::EnumMulti => collect_strings(field, payload, "name"),
        FieldKind::Number => match payload {
            Value::Number(n) => Ok(NormalizedValue::Number(n.clone())),
            other => Err(shape_error(field, "number", other)),
        },
        FieldKind::Boolean => match payload {
            Value::Bool(b) => Ok(NormalizedValue::Bool(*b)),
            other => Err(shape_error(field, "boolean", other)),
        },
        FieldKind::Date => date_start(field, payload),
        FieldKind::Url => match payload {
            Value::String(s) => Ok(NormalizedValue::Text(s.clone())),
            other => Err(shape_error(field, "string", other)),
        },
        FieldKind::RelationIds => collect_strings(field, payload, "id"),
    }
}

fn plain_text(field: &str, payload: &Value) -> ExtractionResult<NormalizedValue> {
    let fragments = payload
        .as_array()
        .ok_or_else(|| shape_error(field, "array of text fragments", payload))?;

    let mut text = String::new();
    for (index, fragment) in fragments.iter().enumerate() {
        let piece = fragment
            .get("plain_text")
            .and_then(Value::as_str)
            .ok_or_else(|| ExtractionError::MissingItemKey {
                field: field.to_string(),
                index,
                key: "plain_text",
            })?;
        text.push_str(piece);
    }
    Ok(NormalizedValue::Text(text))
}

fn option_name(field: &str, payload: &Value) -> ExtractionResult<NormalizedValue> {
    let option = payload
        .as_object()
        .ok_or_else(|| shape_error(field, "option object", payload))?;
    match option.get("name") {
        None | Some(Value::Null) => Ok(NormalizedValue::Null),
        Some(Value::String(name)) => Ok(NormalizedValue::Text(name.clone())),
        Some(other) => Err(shape_error(field, "option name string", other)),
    }
}

fn date_start(field: &str, payload: &Value) -> ExtractionResult<NormalizedValue> {
    let range = payload
        .as_object()
        .ok_or_else(|| shape_error(field, "date range object", payload))?;
    match range.get("start") {
        None | Some(Value::Null) => Ok(NormalizedValue::Null),
        Some(Value::String(start)) => Ok(NormalizedValue::Text(start.clone())),
        Some(other) => Err(shape_error(field, "date string", other)),
    }
}

fn collect_strings(
    field: &str,
    payload: &Value,
    key: &'static str,
) -> ExtractionResult<NormalizedValue> {
    let items = payload
        .as_array()
        .ok_or_else(|| shape_error(field, "array", payload))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ExtractionError::MissingItemKey {
                    field: field.to_string(),
                    index,
                    key,
                })
        })
        .collect::<ExtractionResult<Vec<_>>>()
        .map(NormalizedValue::List)
}

fn shape_error(field: &str, expected: &'static str, found: &Value) -> ExtractionError {
    ExtractionError::UnexpectedShape {
        field: field.to_string(),
        expected,
        found: json_type_name(found),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
