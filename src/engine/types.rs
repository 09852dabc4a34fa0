//! Engine types
//!
//! Tagged records, the per-run sync context, and run summaries.

use crate::catalog::SelectionState;
use crate::error::Result;
use crate::http::HttpClient;
use crate::types::JsonObject;
use futures::stream::BoxStream;
use std::collections::BTreeMap;

/// A normalized record and the stream it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRecord {
    /// Stream identifier
    pub stream: &'static str,
    /// Normalized record
    pub record: JsonObject,
}

/// Lazy, finite sequence of tagged records
///
/// Each item is produced on demand; HTTP calls happen only when the
/// consumer polls past the records already fetched.
pub type RecordStream<'a> = BoxStream<'a, Result<TaggedRecord>>;

/// Shared, read-only inputs for every stream in a run
#[derive(Debug, Clone, Copy)]
pub struct SyncContext<'a> {
    /// Authenticated client
    pub client: &'a HttpClient,
    /// Selection and schema bindings
    pub selection: &'a SelectionState,
    /// Configured start date; the API cannot filter by it
    pub start_date: &'a str,
}

/// Outcome of syncing one top-level stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamResult {
    /// Top-level stream identifier
    pub stream: String,
    /// Records emitted for the stream itself
    pub rows: usize,
    /// Records emitted per selected sub-stream
    pub sub_streams: BTreeMap<String, usize>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl StreamResult {
    /// Create an empty result for `stream`
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            ..Self::default()
        }
    }

    /// Count one emitted record
    pub fn add_record(&mut self, stream: &str) {
        if stream == self.stream {
            self.rows += 1;
        } else {
            *self.sub_streams.entry(stream.to_string()).or_default() += 1;
        }
    }
}

/// Outcome of a whole sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Synced top-level streams, in catalog order
    pub streams: Vec<StreamResult>,
    /// Catalog streams that were not selected
    pub skipped: Vec<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncSummary {
    /// Rows emitted for a stream, top-level or sub-stream
    pub fn rows_for(&self, stream: &str) -> Option<usize> {
        self.streams.iter().find_map(|r| {
            if r.stream == stream {
                Some(r.rows)
            } else {
                r.sub_streams.get(stream).copied()
            }
        })
    }

    /// Total records emitted across all streams
    pub fn total_records(&self) -> usize {
        self.streams
            .iter()
            .map(|r| r.rows + r.sub_streams.values().sum::<usize>())
            .sum()
    }
}
