//! Per-run stream selection
//!
//! Built once from the operator catalog before any fetch and read-only
//! afterwards. A stream counts as selected for syncing when a schema has
//! been bound to it.

use super::registry::{require_definition, SubStreamRelationship};
use super::types::Catalog;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use std::collections::HashMap;

/// Check that every selected sub-stream has its parent selected
///
/// All violations are collected into a single [`Error::Dependency`].
pub fn validate_selection<S: AsRef<str>>(
    selected_ids: &[S],
    relationship: &SubStreamRelationship,
) -> Result<()> {
    let is_selected = |id: &str| selected_ids.iter().any(|s| s.as_ref() == id);

    let violations: Vec<String> = relationship
        .iter()
        .flat_map(|(parent, children)| children.iter().map(move |child| (parent, *child)))
        .filter(|&(parent, child)| is_selected(child) && !is_selected(parent))
        .map(|(parent, child)| {
            format!(
                "Unable to extract {child} data. To receive {child} data, you also need to select {parent}."
            )
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::Dependency { violations })
    }
}

/// Selection record for one stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSelection {
    /// Whether the operator selected the stream
    pub selected: bool,
    /// Schema bound for this run
    pub schema: Option<JsonValue>,
}

/// Selection and schema bindings for a run, keyed by stream identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    entries: HashMap<String, StreamSelection>,
}

impl SelectionState {
    /// Empty selection (nothing selected)
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a schema is bound to `stream_id`
    pub fn is_selected(&self, stream_id: &str) -> bool {
        self.entries
            .get(stream_id)
            .is_some_and(|e| e.selected && e.schema.is_some())
    }

    /// Bound schema for `stream_id`
    pub fn schema(&self, stream_id: &str) -> Option<&JsonValue> {
        self.entries.get(stream_id)?.schema.as_ref()
    }

    /// Number of streams with a bound schema
    pub fn selected_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.selected && e.schema.is_some())
            .count()
    }
}

/// Bind catalog schemas to every stream present in both the catalog and
/// `selected_ids`
///
/// Fails with [`Error::StreamNotFound`] when a selected stream is not one
/// this tap can extract.
pub fn bind_schemas<S: AsRef<str>>(catalog: &Catalog, selected_ids: &[S]) -> Result<SelectionState> {
    let mut entries = HashMap::new();

    for entry in &catalog.streams {
        let id = entry.tap_stream_id.as_str();
        let selected = selected_ids.iter().any(|s| s.as_ref() == id);

        let selection = if selected {
            require_definition(id)?;
            StreamSelection {
                selected: true,
                schema: Some(entry.schema.clone()),
            }
        } else {
            StreamSelection::default()
        };
        entries.insert(id.to_string(), selection);
    }

    Ok(SelectionState { entries })
}
