//! Field value normalization
//!
//! WorkRamp returns timestamps as milliseconds since the Unix epoch. Fields
//! declared as datetimes on a stream are rewritten as RFC 3339 UTC strings;
//! everything else passes through untouched.

use crate::types::{JsonObject, JsonValue};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Output format: RFC 3339 with microseconds and a `Z` suffix
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Normalize a single field value
///
/// Null, zero and non-numeric values are returned unchanged, as is any
/// value of a field not in `datetime_fields`.
pub fn normalize_value(field: &str, value: JsonValue, datetime_fields: &[&str]) -> JsonValue {
    if !datetime_fields.contains(&field) {
        return value;
    }

    let Some(micros) = epoch_micros(&value) else {
        return value;
    };

    match DateTime::<Utc>::from_timestamp_micros(micros) {
        Some(ts) => JsonValue::String(format_timestamp(&ts)),
        None => {
            warn!("{field}: {value} is outside the representable range, leaving as-is");
            value
        }
    }
}

/// Normalize every field of a record
pub fn normalize_record(record: JsonObject, datetime_fields: &[&str]) -> JsonObject {
    record
        .into_iter()
        .map(|(field, value)| {
            let value = normalize_value(&field, value, datetime_fields);
            (field, value)
        })
        .collect()
}

/// Format a UTC timestamp the way records carry it
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Epoch milliseconds as whole microseconds; `None` for zero and non-numbers
fn epoch_micros(value: &JsonValue) -> Option<i64> {
    let JsonValue::Number(n) = value else {
        return None;
    };
    if let Some(millis) = n.as_i64() {
        return (millis != 0).then(|| millis.saturating_mul(1000));
    }
    n.as_f64()
        .filter(|f| f.is_finite() && *f != 0.0)
        .map(|f| (f * 1000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    const FIELDS: &[&str] = &["createdAt", "updatedAt"];

    #[test_case(json!(1_609_459_200_000_i64), "2021-01-01T00:00:00.000000Z" ; "midnight")]
    #[test_case(json!(1_609_459_200_123_i64), "2021-01-01T00:00:00.123000Z" ; "with millis")]
    #[test_case(json!(1), "1970-01-01T00:00:00.001000Z" ; "one millisecond")]
    #[test_case(json!(-1000), "1969-12-31T23:59:59.000000Z" ; "before epoch")]
    #[test_case(json!(1_609_459_200_000.4_f64), "2021-01-01T00:00:00.000400Z" ; "float millis")]
    #[test_case(json!(1.5_f64), "1970-01-01T00:00:00.001500Z" ; "fractional millis")]
    fn test_datetime_field_is_converted(raw: JsonValue, expected: &str) {
        assert_eq!(normalize_value("createdAt", raw, FIELDS), json!(expected));
    }

    #[test_case(json!(null) ; "null")]
    #[test_case(json!(0) ; "zero")]
    #[test_case(json!(0.0_f64) ; "float zero")]
    #[test_case(json!("2021-01-01") ; "already a string")]
    #[test_case(json!(true) ; "boolean")]
    #[test_case(json!(i64::MAX) ; "out of range")]
    fn test_datetime_field_left_unchanged(raw: JsonValue) {
        assert_eq!(normalize_value("updatedAt", raw.clone(), FIELDS), raw);
    }

    #[test_case(json!(1_609_459_200_000_i64) ; "epoch-looking number")]
    #[test_case(json!("Onboarding") ; "string")]
    #[test_case(json!({"nested": 1}) ; "object")]
    #[test_case(json!(null) ; "null")]
    fn test_other_fields_are_identity(raw: JsonValue) {
        assert_eq!(normalize_value("name", raw.clone(), FIELDS), raw);
    }

    #[test]
    fn test_output_round_trips_as_rfc3339() {
        let millis = 1_650_000_123_456_i64;
        let JsonValue::String(s) = normalize_value("createdAt", json!(millis), FIELDS) else {
            panic!("expected a string");
        };
        let parsed = DateTime::parse_from_rfc3339(&s).unwrap();
        assert_eq!(parsed.timestamp_millis(), millis);
        assert_eq!(parsed.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_normalize_record() {
        let record = json!({
            "id": "p1",
            "name": "Sales onboarding",
            "createdAt": 1_609_459_200_000_i64,
            "updatedAt": null,
            "dueDate": 1_609_459_200_000_i64
        });
        let JsonValue::Object(record) = record else {
            unreachable!()
        };

        let normalized = normalize_record(record, FIELDS);

        assert_eq!(
            JsonValue::Object(normalized),
            json!({
                "id": "p1",
                "name": "Sales onboarding",
                "createdAt": "2021-01-01T00:00:00.000000Z",
                "updatedAt": null,
                "dueDate": 1_609_459_200_000_i64
            })
        );
    }

    #[test]
    fn test_normalize_record_keeps_field_order() {
        let JsonValue::Object(record) = json!({"z": 1, "createdAt": 1000, "a": 2}) else {
            unreachable!()
        };
        let keys: Vec<_> = normalize_record(record, FIELDS).keys().cloned().collect();
        assert_eq!(keys, vec!["z", "createdAt", "a"]);
    }
}
