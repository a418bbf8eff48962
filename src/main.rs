//! Songbook - song catalog for live-event request apps.
//!
//! Keeps one canonical catalog of artists, albums, and songs while the same
//! songs arrive from CSV imports, manual entry, and upstream search with
//! slightly different metadata.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod model;
pub mod queue;
pub mod search;
pub mod source;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log targets enabled at `info` on top of whatever `RUST_LOG` selects.
const LOG_TARGETS: [&str; 5] = ["songbook", "catalog", "import", "search", "upstream"];

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    let mut filter = EnvFilter::from_default_env();
    for target in LOG_TARGETS {
        filter = filter.add_directive(format!("{}=info", target).parse()?);
    }
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    cli::run_command(&args)
}
