use contentsync_types::{ExternalRecord, RecordId};
use std::collections::HashSet;
use std::str::FromStr;

// ── RecordId ──────────────────────────────────────────────────────

#[test]
fn record_id_display_matches_input() {
    let id = RecordId::new("59833787-2cf9-4fdf-8782-e53db20768a5");
    assert_eq!(id.to_string(), "59833787-2cf9-4fdf-8782-e53db20768a5");
    assert_eq!(id.as_str(), "59833787-2cf9-4fdf-8782-e53db20768a5");
}

#[test]
fn record_id_parse_trims() {
    let id = RecordId::parse("  abc  ").unwrap();
    assert_eq!(id.as_str(), "abc");
}

#[test]
fn record_id_parse_blank_rejected() {
    assert!(RecordId::parse("").is_err());
    assert!(RecordId::parse("   ").is_err());
}

#[test]
fn record_id_from_str() {
    let id: RecordId = RecordId::from_str("page-1").unwrap();
    assert_eq!(id, RecordId::from("page-1"));
}

#[test]
fn record_id_hash_and_eq() {
    let mut set = HashSet::new();
    set.insert(RecordId::new("a"));
    set.insert(RecordId::new("a"));
    set.insert(RecordId::new("b"));
    assert_eq!(set.len(), 2);
}

#[test]
fn record_id_serializes_transparently() {
    let json = serde_json::to_string(&RecordId::new("a")).unwrap();
    assert_eq!(json, "\"a\"");
}

// ── ExternalRecord ───────────────────────────────────────────────

#[test]
fn record_from_page_json() {
    let page = serde_json::json!({
        "object": "page",
        "id": "page-1",
        "last_edited_time": "2024-05-01T10:00:00.000Z",
        "archived": false,
        "properties": {
            "Name": {"id": "title", "type": "title", "title": [{"plain_text": "Hello"}]},
            "Featured": {"id": "x1", "type": "checkbox", "checkbox": true}
        }
    });

    let record = ExternalRecord::from_json(page).unwrap();
    assert_eq!(record.id.as_str(), "page-1");
    assert_eq!(record.properties.len(), 2);
    assert_eq!(
        record.last_edited_time.as_deref(),
        Some("2024-05-01T10:00:00.000Z")
    );
    assert!(record.property("Featured").is_some());
    assert!(record.property("Missing").is_none());
}

#[test]
fn record_without_properties_defaults_to_empty() {
    let record = ExternalRecord::from_json(serde_json::json!({"id": "bare"})).unwrap();
    assert!(record.properties.is_empty());
    assert!(record.last_edited_time.is_none());
}

#[test]
fn record_without_id_is_rejected() {
    let result = ExternalRecord::from_json(serde_json::json!({"properties": {}}));
    assert!(result.is_err());
}

#[test]
fn record_builder_adds_properties() {
    let record = ExternalRecord::new("r1")
        .with_property("Url", serde_json::json!({"url": "https://example.com"}))
        .with_property("Number", serde_json::json!({"number": 3}));

    assert_eq!(record.properties.len(), 2);
    assert_eq!(
        record.property("Url").unwrap()["url"],
        serde_json::json!("https://example.com")
    );
}

#[test]
fn lossy_parse_keeps_valid_page() {
    let record = ExternalRecord::from_json_lossy(serde_json::json!({
        "id": "page-1",
        "properties": {"Name": {"type": "title", "title": []}}
    }));
    assert_eq!(record.id.as_str(), "page-1");
    assert!(record.malformed_reason().is_none());
    assert!(record.property("Name").is_some());
}

#[test]
fn lossy_parse_marks_bad_properties() {
    let record = ExternalRecord::from_json_lossy(serde_json::json!({
        "id": "page-2",
        "properties": []
    }));
    assert_eq!(record.id.as_str(), "page-2");
    assert!(record.properties.is_empty());
    assert!(record.malformed_reason().is_some());
}

#[test]
fn lossy_parse_keeps_non_string_id_text() {
    let record = ExternalRecord::from_json_lossy(serde_json::json!({"id": 42, "properties": {}}));
    assert_eq!(record.id.as_str(), "42");
    assert!(record.malformed_reason().is_some());

    let record = ExternalRecord::from_json_lossy(serde_json::json!({"properties": {}}));
    assert_eq!(record.id.as_str(), "");
    assert!(record.malformed_reason().is_some());
}
