//! Per-stream sync
//!
//! Two kinds of stream share one interface: top-level streams fetch a fixed
//! collection, sub-streams fetch once per parent record. A top-level stream
//! drains each selected sub-stream right after yielding the parent record,
//! so children of parent N always land between parent N and parent N+1.

use super::types::{RecordStream, SyncContext, TaggedRecord};
use crate::catalog::{require_definition, StreamDefinition};
use crate::error::{Error, Result};
use crate::normalize::normalize_record;
use crate::types::{JsonObject, JsonValue};
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use tracing::debug;

/// Capability shared by every stream kind
pub trait StreamSync<'a> {
    /// Static definition of the stream
    fn definition(&self) -> &'static StreamDefinition;

    /// Stream identifier
    fn id(&self) -> &'static str {
        self.definition().id
    }

    /// Fields converted from epoch milliseconds
    fn datetime_fields(&self) -> &'static [&'static str] {
        self.definition().datetime_fields
    }

    /// Whether a schema is bound to this stream for the run
    fn is_selected(&self) -> bool;

    /// Lazily produce this stream's records (and its sub-streams' records)
    ///
    /// `parent_id` is required for sub-streams and ignored otherwise.
    fn sync(&self, parent_id: Option<&str>) -> RecordStream<'a>;
}

// ============================================================================
// Sub-streams
// ============================================================================

/// Stream fetched once per parent record
#[derive(Debug, Clone, Copy)]
pub struct SubStream<'a> {
    definition: &'static StreamDefinition,
    ctx: SyncContext<'a>,
}

impl<'a> SubStream<'a> {
    /// Create a sub-stream syncer
    pub fn new(definition: &'static StreamDefinition, ctx: SyncContext<'a>) -> Self {
        Self { definition, ctx }
    }
}

impl<'a> StreamSync<'a> for SubStream<'a> {
    fn definition(&self) -> &'static StreamDefinition {
        self.definition
    }

    fn is_selected(&self) -> bool {
        self.ctx.selection.is_selected(self.definition.id)
    }

    fn sync(&self, parent_id: Option<&str>) -> RecordStream<'a> {
        let walk = SubStreamWalk {
            definition: self.definition,
            ctx: self.ctx,
            parent_id: parent_id.map(ToString::to_string),
            rows: None,
        };

        stream::try_unfold(walk, |mut walk| async move {
            Ok(walk.next_record().await?.map(|record| (record, walk)))
        })
        .boxed()
    }
}

struct SubStreamWalk<'a> {
    definition: &'static StreamDefinition,
    ctx: SyncContext<'a>,
    parent_id: Option<String>,
    rows: Option<std::vec::IntoIter<JsonObject>>,
}

impl SubStreamWalk<'_> {
    async fn next_record(&mut self) -> Result<Option<TaggedRecord>> {
        if self.rows.is_none() {
            let path = self.definition.resolve_path(self.parent_id.as_deref())?;
            let rows = self.ctx.client.fetch_records(&path).await?;
            debug!("{}: {} rows for {path}", self.definition.id, rows.len());
            self.rows = Some(rows.into_iter());
        }

        Ok(self
            .rows
            .as_mut()
            .and_then(Iterator::next)
            .map(|row| TaggedRecord {
                stream: self.definition.id,
                record: normalize_record(row, self.definition.datetime_fields),
            }))
    }
}

// ============================================================================
// Top-level streams
// ============================================================================

/// Stream fetched from a fixed path, optionally driving sub-streams
#[derive(Debug, Clone, Copy)]
pub struct TopLevelStream<'a> {
    definition: &'static StreamDefinition,
    ctx: SyncContext<'a>,
}

impl<'a> TopLevelStream<'a> {
    /// Create a top-level syncer
    pub fn new(definition: &'static StreamDefinition, ctx: SyncContext<'a>) -> Self {
        Self { definition, ctx }
    }

    /// Selected sub-streams this stream will drive, in definition order
    pub fn selected_sub_streams(&self) -> Result<Vec<SubStream<'a>>> {
        let mut selected = Vec::new();
        for id in self.definition.sub_streams() {
            let sub = SubStream::new(require_definition(id)?, self.ctx);
            if sub.is_selected() {
                selected.push(sub);
            }
        }
        Ok(selected)
    }
}

impl<'a> StreamSync<'a> for TopLevelStream<'a> {
    fn definition(&self) -> &'static StreamDefinition {
        self.definition
    }

    fn is_selected(&self) -> bool {
        self.ctx.selection.is_selected(self.definition.id)
    }

    fn sync(&self, _parent_id: Option<&str>) -> RecordStream<'a> {
        let sub_streams = match self.selected_sub_streams() {
            Ok(subs) => subs,
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };

        debug!(
            "{}: full extraction (start_date {} is not filterable)",
            self.definition.id, self.ctx.start_date
        );

        let walk = TopLevelWalk {
            definition: self.definition,
            ctx: self.ctx,
            sub_streams,
            parents: None,
            pending: VecDeque::new(),
            current: None,
        };

        stream::try_unfold(walk, |mut walk| async move {
            Ok(walk.next_record().await?.map(|record| (record, walk)))
        })
        .boxed()
    }
}

struct TopLevelWalk<'a> {
    definition: &'static StreamDefinition,
    ctx: SyncContext<'a>,
    sub_streams: Vec<SubStream<'a>>,
    /// Parent rows, fetched on first poll
    parents: Option<std::vec::IntoIter<JsonObject>>,
    /// Sub-stream fetches owed for the last parent: (sub-stream index, parent id)
    pending: VecDeque<(usize, String)>,
    /// Sub-stream currently being drained
    current: Option<RecordStream<'a>>,
}

impl TopLevelWalk<'_> {
    async fn next_record(&mut self) -> Result<Option<TaggedRecord>> {
        loop {
            if let Some(current) = self.current.as_mut() {
                match current.next().await {
                    Some(item) => return item.map(Some),
                    None => self.current = None,
                }
                continue;
            }

            if let Some((index, parent_id)) = self.pending.pop_front() {
                self.current = Some(self.sub_streams[index].sync(Some(&parent_id)));
                continue;
            }

            if self.parents.is_none() {
                let path = self.definition.resolve_path(None)?;
                let rows = self.ctx.client.fetch_records(&path).await?;
                debug!("{}: {} rows for {path}", self.definition.id, rows.len());
                self.parents = Some(rows.into_iter());
            }

            let Some(row) = self.parents.as_mut().and_then(Iterator::next) else {
                return Ok(None);
            };
            let record = normalize_record(row, self.definition.datetime_fields);

            if !self.sub_streams.is_empty() {
                let parent_id = parent_key(&record).ok_or_else(|| Error::MissingParentKey {
                    stream: self.definition.id.to_string(),
                })?;
                self.pending
                    .extend((0..self.sub_streams.len()).map(|i| (i, parent_id.clone())));
            }

            return Ok(Some(TaggedRecord {
                stream: self.definition.id,
                record,
            }));
        }
    }
}

/// The parent's `id` as a path segment
fn parent_key(record: &JsonObject) -> Option<String> {
    match record.get("id")? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
