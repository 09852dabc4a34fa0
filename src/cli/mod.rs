//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Modes
//!
//! - `--discover` - print the catalog of available streams
//! - default - sync the streams selected in `--catalog`

mod commands;
mod runner;

pub use commands::Cli;
pub use runner::Runner;
