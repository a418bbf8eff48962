//! Command-line interface for songbook.
//!
//! This module provides CLI commands for importing, entering, searching, and
//! fetching songs into the catalog.

mod commands;

pub use commands::{Cli, Commands, run_command};
