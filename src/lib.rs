// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # tap-workramp
//!
//! Extracts guides, guide assignments, paths, path assignments and users
//! from the WorkRamp REST API and writes them as schema, record and state
//! messages, one JSON object per line.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_workramp::catalog::discover;
//! use tap_workramp::engine::SyncEngine;
//! use tap_workramp::http::HttpClient;
//! use tap_workramp::output::JsonLinesWriter;
//! use tap_workramp::{Config, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::from_file("config.json")?;
//!     let client = HttpClient::with_config(config.http_client_config())?;
//!
//!     let mut catalog = discover()?;
//!     catalog.select(["paths", "path_assignments"])?;
//!
//!     let mut out = JsonLinesWriter::stdout();
//!     SyncEngine::new(client, &config.start_date)
//!         .sync(&catalog, &mut out)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Cli / Runner:  --discover → Catalog     sync → JSON lines   │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌───────────┬─────────────────┴───────┬────────────┬──────────┐
//! │  Catalog  │         Engine          │    HTTP    │  Output  │
//! ├───────────┼─────────────────────────┼────────────┼──────────┤
//! │ Registry  │ SyncEngine              │ Retry      │ Messages │
//! │ Selection │ TopLevelStream          │ Rate Limit │ JSONL    │
//! │ Discover  │ SubStream (per parent)  │ Bearer     │ Memory   │
//! └───────────┴─────────────────────────┴────────────┴──────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Configuration file loading and validation
pub mod config;

/// HTTP client with retry and rate limiting
pub mod http;

/// Epoch-millisecond timestamp normalization
pub mod normalize;

/// Stream registry, catalog and selection
pub mod catalog;

/// Sync orchestration and per-stream record streams
pub mod engine;

/// Schema, record and state messages
pub mod output;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
