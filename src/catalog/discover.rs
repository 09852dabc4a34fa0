//! Discovery
//!
//! Builds the full catalog from the registry and the bundled JSON schemas.
//! Never touches the network.

use super::registry::{StreamDefinition, STREAMS};
use super::types::{Catalog, CatalogEntry, MetadataEntry};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use serde_json::json;

/// Bundled schemas, keyed by stream identifier
const SCHEMAS: &[(&str, &str)] = &[
    ("guides", include_str!("../../schemas/guides.json")),
    (
        "guide_assignments",
        include_str!("../../schemas/guide_assignments.json"),
    ),
    ("paths", include_str!("../../schemas/paths.json")),
    (
        "path_assignments",
        include_str!("../../schemas/path_assignments.json"),
    ),
    ("users", include_str!("../../schemas/users.json")),
];

/// Parse the bundled schema for `stream_id`
pub fn load_schema(stream_id: &str) -> Result<JsonValue> {
    let (_, raw) = SCHEMAS
        .iter()
        .find(|(id, _)| *id == stream_id)
        .ok_or_else(|| Error::stream_not_found(stream_id))?;
    Ok(serde_json::from_str(raw)?)
}

/// Produce the catalog describing every known stream
pub fn discover() -> Result<Catalog> {
    let streams = STREAMS
        .iter()
        .map(|definition| {
            let schema = load_schema(definition.id)?;
            Ok(catalog_entry(definition, schema))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Catalog { streams })
}

fn catalog_entry(definition: &StreamDefinition, schema: JsonValue) -> CatalogEntry {
    let key_properties: Vec<String> = definition
        .key_properties
        .iter()
        .map(ToString::to_string)
        .collect();
    let metadata = standard_metadata(&schema, &key_properties, &[definition.replication_key]);

    CatalogEntry {
        tap_stream_id: definition.id.to_string(),
        stream: definition.id.to_string(),
        schema,
        key_properties,
        metadata,
        replication_key: None,
        replication_method: None,
    }
}

/// Standard stream and property metadata
///
/// No replication method is forced. Key and replication-key properties are
/// always included; everything else is available for selection.
pub fn standard_metadata(
    schema: &JsonValue,
    key_properties: &[String],
    valid_replication_keys: &[&str],
) -> Vec<MetadataEntry> {
    let mut root = JsonObject::new();
    root.insert("table-key-properties".to_string(), json!(key_properties));
    if !valid_replication_keys.is_empty() {
        root.insert(
            "valid-replication-keys".to_string(),
            json!(valid_replication_keys),
        );
    }
    root.insert("inclusion".to_string(), json!("available"));

    let mut entries = vec![MetadataEntry::root(root)];

    if let Some(properties) = schema.get("properties").and_then(JsonValue::as_object) {
        for name in properties.keys() {
            let automatic = key_properties.iter().any(|k| k == name)
                || valid_replication_keys.iter().any(|k| k == name);
            let mut metadata = JsonObject::new();
            metadata.insert(
                "inclusion".to_string(),
                json!(if automatic { "automatic" } else { "available" }),
            );
            entries.push(MetadataEntry::property(name.clone(), metadata));
        }
    }

    entries
}
