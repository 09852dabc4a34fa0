//! Stream catalog module
//!
//! Static stream definitions, the operator-facing catalog, and the per-run
//! selection state derived from it.
//!
//! # Overview
//!
//! - `STREAMS` / `definition_for` - the registry of known streams
//! - `SubStreamRelationship` - which streams are fetched per parent record
//! - `Catalog` - discovered or operator-supplied catalog
//! - `validate_selection` / `bind_schemas` - checks and bindings done before sync
//! - `discover` - catalog for every known stream, offline

mod discover;
mod registry;
mod selection;
mod types;

pub use discover::{discover, load_schema, standard_metadata};
pub use registry::{
    definition_for, require_definition, StreamDefinition, StreamKind, SubStreamRelationship,
    PARENT_ID_PLACEHOLDER, STREAMS,
};
pub use selection::{bind_schemas, validate_selection, SelectionState, StreamSelection};
pub use types::{Catalog, CatalogEntry, MetadataEntry, SELECTED_KEY};
