//! Execution engine module
//!
//! Sync orchestration over the stream registry.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - validates the selection, then syncs each selected
//!   top-level stream in catalog order
//! - `StreamSync` - shared interface of `TopLevelStream` and `SubStream`
//! - `RecordStream` - the lazy, interleaved sequence of tagged records

mod streams;
mod types;

pub use streams::{StreamSync, SubStream, TopLevelStream};
pub use types::{RecordStream, StreamResult, SyncContext, SyncSummary, TaggedRecord};

use crate::catalog::{
    bind_schemas, require_definition, validate_selection, Catalog, SelectionState,
    SubStreamRelationship,
};
use crate::error::Result;
use crate::http::HttpClient;
use crate::output::OutputSink;
use crate::types::JsonValue;
use futures::TryStreamExt;
use std::time::Instant;
use tracing::{debug, info};

/// Sync engine for one extraction run
pub struct SyncEngine {
    /// HTTP client
    client: HttpClient,
    /// Configured start date
    start_date: String,
    /// State echoed after each stream and at the end of the run
    state: JsonValue,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(client: HttpClient, start_date: impl Into<String>) -> Self {
        Self {
            client,
            start_date: start_date.into(),
            state: JsonValue::Object(Default::default()),
        }
    }

    /// Set the state to pass through
    #[must_use]
    pub fn with_state(mut self, state: JsonValue) -> Self {
        self.state = state;
        self
    }

    /// Get the HTTP client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Get the pass-through state
    pub fn state(&self) -> &JsonValue {
        &self.state
    }

    /// Run a sync for every selected stream in `catalog`
    ///
    /// The selection is validated before any request is made. Sub-streams
    /// are synced through their parent and their records are interleaved
    /// right after the parent record they belong to.
    pub async fn sync<S: OutputSink>(&self, catalog: &Catalog, sink: &mut S) -> Result<SyncSummary> {
        let start = Instant::now();

        let selected = catalog.selected_stream_ids();
        let relationship = SubStreamRelationship::registry();
        validate_selection(&selected, &relationship)?;
        let selection = bind_schemas(catalog, &selected)?;
        info!("Starting sync of {} selected streams", selection.selected_count());

        let ctx = SyncContext {
            client: &self.client,
            selection: &selection,
            start_date: &self.start_date,
        };

        let mut summary = SyncSummary::default();

        for entry in &catalog.streams {
            let id = entry.tap_stream_id.as_str();

            if !selection.is_selected(id) {
                info!("{id}: Skipping - not selected");
                summary.skipped.push(id.to_string());
                continue;
            }

            if let Some(parent) = relationship.parent_of(id) {
                debug!("{id}: synced through {parent}");
                continue;
            }

            let stream = TopLevelStream::new(require_definition(id)?, ctx);
            write_schemas(&stream, &selection, sink)?;

            info!("{id}: Starting sync");
            let result = self.sync_stream(&stream, sink).await?;
            sink.write_state(&self.state)?;
            info!("{id}: Completed sync ({} rows)", result.rows);

            summary.streams.push(result);
        }

        sink.write_state(&self.state)?;
        summary.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Finished sync ({} records in {}ms)",
            summary.total_records(),
            summary.duration_ms
        );

        Ok(summary)
    }

    /// Drain one top-level stream (and its selected sub-streams) into `sink`
    pub async fn sync_stream<S: OutputSink>(
        &self,
        stream: &TopLevelStream<'_>,
        sink: &mut S,
    ) -> Result<StreamResult> {
        let start = Instant::now();
        let mut result = StreamResult::new(stream.id());
        for sub in stream.selected_sub_streams()? {
            result.sub_streams.insert(sub.id().to_string(), 0);
        }

        let mut records = stream.sync(None);
        while let Some(tagged) = records.try_next().await? {
            result.add_record(tagged.stream);
            sink.write_record(tagged.stream, tagged.record)?;
        }

        for (sub, rows) in &result.sub_streams {
            info!("{sub}: Completed sync ({rows} rows)");
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}

/// Declare the top-level stream, then each selected sub-stream
fn write_schemas<S: OutputSink>(
    stream: &TopLevelStream<'_>,
    selection: &SelectionState,
    sink: &mut S,
) -> Result<()> {
    let definition = stream.definition();
    sink.write_schema(
        definition.id,
        selection.schema(definition.id).cloned().unwrap_or_default(),
        definition.key_properties,
    )?;

    for sub in stream.selected_sub_streams()? {
        let sub_definition = sub.definition();
        sink.write_schema(
            sub_definition.id,
            selection.schema(sub_definition.id).cloned().unwrap_or_default(),
            sub_definition.key_properties,
        )?;
    }

    Ok(())
}
