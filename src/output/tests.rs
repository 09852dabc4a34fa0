//! Tests for the output module

use super::*;
use crate::types::{JsonObject, JsonValue};
use pretty_assertions::assert_eq;
use serde_json::json;

fn record(value: JsonValue) -> JsonObject {
    match value {
        JsonValue::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

#[test]
fn test_schema_message_json() {
    let msg = Message::schema("paths", json!({"type": "object"}), &["id"]);
    assert!(msg.is_schema());
    assert_eq!(msg.stream(), Some("paths"));

    assert_eq!(
        serde_json::to_value(&msg).unwrap(),
        json!({
            "type": "SCHEMA",
            "stream": "paths",
            "schema": {"type": "object"},
            "key_properties": ["id"]
        })
    );
}

#[test]
fn test_record_message_json() {
    let msg = Message::record("users", record(json!({"id": "u1"})));
    assert!(msg.is_record());

    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "RECORD");
    assert_eq!(value["stream"], "users");
    assert_eq!(value["record"], json!({"id": "u1"}));
    assert!(value["time_extracted"].is_string());
}

#[test]
fn test_record_without_time_extracted() {
    let msg = Message::Record {
        stream: "users".to_string(),
        record: JsonObject::new(),
        time_extracted: None,
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert!(value.get("time_extracted").is_none());
}

#[test]
fn test_state_message_json() {
    let msg = Message::state(json!({}));
    assert!(msg.is_state());
    assert_eq!(msg.stream(), None);
    assert_eq!(
        serde_json::to_value(&msg).unwrap(),
        json!({"type": "STATE", "value": {}})
    );
}

#[test]
fn test_json_lines_writer() {
    let mut writer = JsonLinesWriter::new(Vec::new());

    writer
        .write_schema("guides", json!({"type": "object"}), &["id"])
        .unwrap();
    writer
        .write_message(Message::Record {
            stream: "guides".to_string(),
            record: record(json!({"id": "g1", "name": "Welcome"})),
            time_extracted: None,
        })
        .unwrap();
    writer.write_state(&json!({})).unwrap();

    assert_eq!(writer.messages_written(), 3);

    let output = String::from_utf8(writer.into_inner()).unwrap();
    let lines: Vec<_> = output.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"{"type":"SCHEMA","stream":"guides","schema":{"type":"object"},"key_properties":["id"]}"#,
            r#"{"type":"RECORD","stream":"guides","record":{"id":"g1","name":"Welcome"}}"#,
            r#"{"type":"STATE","value":{}}"#,
        ]
    );
}

#[test]
fn test_messages_parse_back() {
    let line = r#"{"type":"RECORD","stream":"users","record":{"id":1},"time_extracted":"2021-01-01T00:00:00Z"}"#;
    let msg: Message = serde_json::from_str(line).unwrap();
    assert!(msg.is_record());
    assert_eq!(msg.stream(), Some("users"));
}

#[test]
fn test_memory_sink() {
    let mut sink = MemorySink::new();

    sink.write_schema("paths", json!({}), &["id"]).unwrap();
    sink.write_record("paths", record(json!({"id": "p1"}))).unwrap();
    sink.write_schema("path_assignments", json!({}), &["id"])
        .unwrap();
    sink.write_record("path_assignments", record(json!({"id": "a1"})))
        .unwrap();
    sink.write_state(&json!({})).unwrap();

    assert_eq!(sink.messages.len(), 5);
    assert_eq!(sink.schema_streams(), vec!["paths", "path_assignments"]);
    assert_eq!(sink.state_count(), 1);

    let records: Vec<_> = sink
        .records()
        .into_iter()
        .map(|(stream, r)| (stream, r["id"].clone()))
        .collect();
    assert_eq!(
        records,
        vec![("paths", json!("p1")), ("path_assignments", json!("a1"))]
    );
}
