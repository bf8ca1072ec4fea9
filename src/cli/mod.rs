//! CLI layer for Omniroute.
//!
//! Provides the command-line interface using clap, with commands for
//! running queries, the interactive loop, and schema inspection.

pub mod commands;
pub mod parser;

pub use commands::execute;
pub use parser::{Cli, Commands};
