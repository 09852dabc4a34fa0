//! Output sinks
//!
//! The sync engine talks to an [`OutputSink`]; the binary plugs in a
//! [`JsonLinesWriter`] over stdout, tests use a [`MemorySink`].

use super::types::Message;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use std::io::Write;

/// Destination for schema, record and state messages
pub trait OutputSink {
    /// Write one message
    fn write_message(&mut self, message: Message) -> Result<()>;

    /// Declare a stream's schema and key fields
    fn write_schema(&mut self, stream: &str, schema: JsonValue, key_properties: &[&str]) -> Result<()> {
        self.write_message(Message::schema(stream, schema, key_properties))
    }

    /// Emit a normalized record tagged with its stream
    fn write_record(&mut self, stream: &str, record: JsonObject) -> Result<()> {
        self.write_message(Message::record(stream, record))
    }

    /// Persist run state
    fn write_state(&mut self, value: &JsonValue) -> Result<()> {
        self.write_message(Message::state(value.clone()))
    }
}

/// Writes one JSON message per line
///
/// State messages flush the underlying writer.
#[derive(Debug)]
pub struct JsonLinesWriter<W: Write> {
    inner: W,
    messages_written: usize,
}

impl<W: Write> JsonLinesWriter<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            messages_written: 0,
        }
    }

    /// Messages written so far
    pub fn messages_written(&self) -> usize {
        self.messages_written
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl JsonLinesWriter<std::io::Stdout> {
    /// Writer over the process's stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> OutputSink for JsonLinesWriter<W> {
    fn write_message(&mut self, message: Message) -> Result<()> {
        let line = serde_json::to_string(&message)?;
        writeln!(self.inner, "{line}")
            .map_err(|e| Error::output(format!("failed to write message: {e}")))?;
        if message.is_state() {
            self.inner
                .flush()
                .map_err(|e| Error::output(format!("failed to flush output: {e}")))?;
        }
        self.messages_written += 1;
        Ok(())
    }
}

/// Collects messages in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Messages in emission order
    pub messages: Vec<Message>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Record messages only, as `(stream, record)` pairs
    pub fn records(&self) -> Vec<(&str, &JsonObject)> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Record { stream, record, .. } => Some((stream.as_str(), record)),
                _ => None,
            })
            .collect()
    }

    /// Streams that had a schema declared, in order
    pub fn schema_streams(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|m| m.is_schema())
            .filter_map(Message::stream)
            .collect()
    }

    /// Number of state messages
    pub fn state_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_state()).count()
    }
}

impl OutputSink for MemorySink {
    fn write_message(&mut self, message: Message) -> Result<()> {
        self.messages.push(message);
        Ok(())
    }
}
