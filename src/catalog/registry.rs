//! Static stream registry
//!
//! One immutable [`StreamDefinition`] per record type the API exposes.
//! Parent/child linkage is plain data on the definition; the
//! [`SubStreamRelationship`] view is derived from it.

use crate::error::{Error, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Placeholder in a sub-stream path that is replaced by the parent's `id`
pub const PARENT_ID_PLACEHOLDER: &str = "{parent_id}";

/// Escaped in a parent id so it stays a single path segment. `\` counts as
/// a separator in http URLs.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Whether a stream is fetched on its own or once per parent record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Fetched from a fixed path; may own sub-streams
    TopLevel {
        /// Sub-streams fetched per record of this stream, in emission order
        sub_streams: &'static [&'static str],
    },
    /// Fetched once per parent record; never synced independently
    SubStream {
        /// Owning stream
        parent: &'static str,
    },
}

/// Immutable description of a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDefinition {
    /// Stream identifier (`tap_stream_id`)
    pub id: &'static str,
    /// Primary key fields
    pub key_properties: &'static [&'static str],
    /// Nominal replication key advertised during discovery
    pub replication_key: &'static str,
    /// Fields holding epoch-millisecond timestamps
    pub datetime_fields: &'static [&'static str],
    /// Fetch path relative to the API base URL
    pub path: &'static str,
    /// Parent/child role
    pub kind: StreamKind,
}

impl StreamDefinition {
    /// Sub-streams owned by this stream
    pub fn sub_streams(&self) -> &'static [&'static str] {
        match self.kind {
            StreamKind::TopLevel { sub_streams } => sub_streams,
            StreamKind::SubStream { .. } => &[],
        }
    }

    /// Resolve the fetch path, substituting the parent id for sub-streams
    ///
    /// The id is percent-encoded as one path segment. Ids that would
    /// collapse into a dot segment are rejected.
    pub fn resolve_path(&self, parent_id: Option<&str>) -> Result<String> {
        match (self.kind, parent_id) {
            (StreamKind::TopLevel { .. }, _) => Ok(self.path.to_string()),
            (StreamKind::SubStream { .. }, Some(id)) if !matches!(id, "" | "." | "..") => {
                let segment = utf8_percent_encode(id, PATH_SEGMENT).to_string();
                Ok(self.path.replace(PARENT_ID_PLACEHOLDER, &segment))
            }
            (StreamKind::SubStream { parent }, _) => Err(Error::MissingParentKey {
                stream: parent.to_string(),
            }),
        }
    }
}

const TIMESTAMPS: &[&str] = &["createdAt", "updatedAt"];

/// Every stream the tap knows about, in discovery order
pub static STREAMS: &[StreamDefinition] = &[
    StreamDefinition {
        id: "guides",
        key_properties: &["id"],
        replication_key: "updatedAt",
        datetime_fields: TIMESTAMPS,
        path: "guides",
        kind: StreamKind::TopLevel {
            sub_streams: &["guide_assignments"],
        },
    },
    StreamDefinition {
        id: "guide_assignments",
        key_properties: &["id"],
        replication_key: "updatedAt",
        datetime_fields: &["createdAt", "updatedAt", "dueDate", "completedAt"],
        path: "guides/{parent_id}/assignments",
        kind: StreamKind::SubStream { parent: "guides" },
    },
    StreamDefinition {
        id: "paths",
        key_properties: &["id"],
        replication_key: "updatedAt",
        datetime_fields: TIMESTAMPS,
        path: "paths",
        kind: StreamKind::TopLevel {
            sub_streams: &["path_assignments"],
        },
    },
    StreamDefinition {
        id: "path_assignments",
        key_properties: &["id"],
        replication_key: "updatedAt",
        datetime_fields: &["createdAt", "updatedAt", "dueDate"],
        path: "paths/{parent_id}/assignments",
        kind: StreamKind::SubStream { parent: "paths" },
    },
    StreamDefinition {
        id: "users",
        key_properties: &["id"],
        replication_key: "updatedAt",
        datetime_fields: TIMESTAMPS,
        path: "users",
        kind: StreamKind::TopLevel { sub_streams: &[] },
    },
];

/// Look up a stream definition by identifier
pub fn definition_for(stream_id: &str) -> Option<&'static StreamDefinition> {
    STREAMS.iter().find(|d| d.id == stream_id)
}

/// Look up a stream definition, failing if the identifier is unknown
pub fn require_definition(stream_id: &str) -> Result<&'static StreamDefinition> {
    definition_for(stream_id).ok_or_else(|| Error::stream_not_found(stream_id))
}

/// Parent → sub-stream mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubStreamRelationship {
    parents: Vec<(&'static str, Vec<&'static str>)>,
}

impl SubStreamRelationship {
    /// Derive the mapping from a set of definitions
    ///
    /// Parents appear in definition order; parents without children are
    /// omitted.
    pub fn from_definitions(definitions: &[StreamDefinition]) -> Self {
        let parents = definitions
            .iter()
            .filter(|d| !d.sub_streams().is_empty())
            .map(|d| (d.id, d.sub_streams().to_vec()))
            .collect();
        Self { parents }
    }

    /// Mapping for the built-in registry
    pub fn registry() -> Self {
        Self::from_definitions(STREAMS)
    }

    /// Parent of `child`, if it is a sub-stream
    pub fn parent_of(&self, child: &str) -> Option<&'static str> {
        self.parents
            .iter()
            .find(|(_, children)| children.iter().any(|c| *c == child))
            .map(|(p, _)| *p)
    }

    /// Iterate `(parent, sub_streams)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[&'static str])> {
        self.parents.iter().map(|(p, c)| (*p, c.as_slice()))
    }
}
