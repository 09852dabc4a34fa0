//! Output module
//!
//! Schema, record and state messages and the sinks that receive them.
//!
//! # Overview
//!
//! - `Message` - tagged output message, serialized one per line
//! - `OutputSink` - what the sync engine writes to
//! - `JsonLinesWriter` - newline-delimited JSON over any `io::Write`
//! - `MemorySink` - in-memory collector

mod types;
mod writer;

pub use types::Message;
pub use writer::{JsonLinesWriter, MemorySink, OutputSink};

#[cfg(test)]
mod tests;
