//! Operator catalog types
//!
//! The catalog is exchanged as JSON: discovery writes it, the operator marks
//! streams as selected in each entry's root metadata, and sync reads it back.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata key holding the operator's selection flag
pub const SELECTED_KEY: &str = "selected";

/// Full catalog of streams
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog entries, in operator order
    #[serde(default)]
    pub streams: Vec<CatalogEntry>,
}

/// One stream in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream identifier
    pub tap_stream_id: String,

    /// Stream name
    #[serde(default)]
    pub stream: String,

    /// JSON schema of the stream's records
    #[serde(default)]
    pub schema: JsonValue,

    /// Primary key fields
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// Breadcrumb-addressed metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,

    /// Replication key, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// Replication method, if fixed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_method: Option<String>,
}

/// Metadata attached to a breadcrumb (`[]` is the stream itself)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Path into the schema; empty for stream-level metadata
    #[serde(default)]
    pub breadcrumb: Vec<String>,

    /// Metadata key/values
    #[serde(default)]
    pub metadata: JsonObject,
}

impl MetadataEntry {
    /// Stream-level metadata
    pub fn root(metadata: JsonObject) -> Self {
        Self {
            breadcrumb: Vec::new(),
            metadata,
        }
    }

    /// Metadata for a top-level schema property
    pub fn property(name: impl Into<String>, metadata: JsonObject) -> Self {
        Self {
            breadcrumb: vec!["properties".to_string(), name.into()],
            metadata,
        }
    }

    /// Whether this entry describes the stream itself
    pub fn is_root(&self) -> bool {
        self.breadcrumb.is_empty()
    }
}

impl CatalogEntry {
    /// Stream-level metadata, if present
    pub fn root_metadata(&self) -> Option<&JsonObject> {
        self.metadata
            .iter()
            .find(|m| m.is_root())
            .map(|m| &m.metadata)
    }

    /// Whether the operator selected this stream
    pub fn is_selected(&self) -> bool {
        self.root_metadata()
            .and_then(|m| m.get(SELECTED_KEY))
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    /// Set the selection flag, creating root metadata if needed
    pub fn set_selected(&mut self, selected: bool) {
        if let Some(root) = self.metadata.iter_mut().find(|m| m.is_root()) {
            root.metadata
                .insert(SELECTED_KEY.to_string(), JsonValue::Bool(selected));
        } else {
            let mut metadata = JsonObject::new();
            metadata.insert(SELECTED_KEY.to_string(), JsonValue::Bool(selected));
            self.metadata.insert(0, MetadataEntry::root(metadata));
        }
    }
}

impl Catalog {
    /// Load a catalog file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read catalog file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid catalog JSON: {e}")))
    }

    /// Serialize as pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Find an entry by stream identifier
    pub fn get_stream(&self, stream_id: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|s| s.tap_stream_id == stream_id)
    }

    /// Find an entry by stream identifier, mutably
    pub fn get_stream_mut(&mut self, stream_id: &str) -> Option<&mut CatalogEntry> {
        self.streams
            .iter_mut()
            .find(|s| s.tap_stream_id == stream_id)
    }

    /// Identifiers of selected streams, in catalog order
    pub fn selected_stream_ids(&self) -> Vec<String> {
        self.streams
            .iter()
            .filter(|s| s.is_selected())
            .map(|s| s.tap_stream_id.clone())
            .collect()
    }

    /// Mark the given streams as selected; others keep their flag
    pub fn select<'a>(&mut self, stream_ids: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for id in stream_ids {
            self.get_stream_mut(id)
                .ok_or_else(|| Error::stream_not_found(id))?
                .set_selected(true);
        }
        Ok(())
    }
}
