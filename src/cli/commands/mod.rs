//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `import`: CSV preview and commit
//! - `catalog`: manual entry and listing
//! - `search`: catalog search and upstream fetch
//! - `settings`: show or initialize the config file

mod catalog;
mod import;
mod search;
mod settings;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::catalog::Catalog;
use crate::config::{self, Config};
use crate::db;

pub use catalog::{cmd_add, cmd_list, cmd_show};
pub use import::{cmd_commit, cmd_draft, cmd_import};
pub use search::{cmd_fetch, cmd_search};
pub use settings::cmd_config;

/// Songbook CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database path (overrides the config file)
    #[arg(long, global = true, env = "SONGBOOK_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Preview a CSV import (and optionally commit it right away)
    Import {
        /// Path to the CSV file
        file: PathBuf,
        /// Id of the importing user
        #[arg(short, long)]
        actor: String,
        /// Commit immediately instead of staging a draft
        #[arg(long)]
        commit: bool,
    },
    /// Show the rows staged in an import draft
    Draft {
        /// Draft id printed by `import`
        draft: String,
        /// Id of the importing user
        #[arg(short, long)]
        actor: String,
    },
    /// Commit a staged import draft
    Commit {
        /// Draft id printed by `import`
        draft: String,
        /// Id of the importing user
        #[arg(short, long)]
        actor: String,
    },
    /// Add a single song by hand
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        #[arg(long)]
        album: Option<String>,
        /// Seconds, M:SS, or XmYYs
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        /// Id of the user entering the song
        #[arg(short, long)]
        actor: String,
    },
    /// Search the catalog
    Search {
        query: String,
        /// Only songs by this artist id
        #[arg(long)]
        artist_id: Option<i64>,
        /// Only songs tagged with this genre
        #[arg(long)]
        genre: Option<String>,
        /// Maximum results (default from config, at most 100)
        #[arg(short, long)]
        limit: Option<u32>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Search MusicBrainz and add the results to the catalog
    Fetch {
        query: String,
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },
    /// Show one song with its sources
    Show {
        /// Song id or signature
        song: String,
    },
    /// List songs in the catalog
    List {
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },
    /// Show the effective configuration
    Config {
        /// Write the defaults to the config file if none exists yet
        #[arg(long)]
        init: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let config = config::load();

    match &cli.command {
        Commands::Import { file, actor, commit } => {
            cmd_import(&rt, &open_catalog(&rt, cli, &config)?, &config, file, actor, *commit)
        }
        Commands::Draft { draft, actor } => {
            cmd_draft(&rt, &open_catalog(&rt, cli, &config)?, &config, draft, actor)
        }
        Commands::Commit { draft, actor } => {
            cmd_commit(&rt, &open_catalog(&rt, cli, &config)?, &config, draft, actor)
        }
        Commands::Add {
            title,
            artist,
            album,
            duration,
            genre,
            actor,
        } => cmd_add(
            &rt,
            &open_catalog(&rt, cli, &config)?,
            catalog::ManualEntry {
                title,
                artist,
                album: album.as_deref(),
                duration: duration.as_deref(),
                genre: genre.as_deref(),
                actor,
            },
        ),
        Commands::Search {
            query,
            artist_id,
            genre,
            limit,
            json,
        } => {
            let filters = crate::search::SearchFilters {
                artist_id: *artist_id,
                genre: genre.clone(),
                limit: *limit,
            };
            cmd_search(&rt, &open_catalog(&rt, cli, &config)?, &config, query, &filters, *json)
        }
        Commands::Fetch { query, limit } => {
            cmd_fetch(&rt, &open_catalog(&rt, cli, &config)?, &config, query, *limit)
        }
        Commands::Show { song } => cmd_show(&rt, &open_catalog(&rt, cli, &config)?, song),
        Commands::List { limit } => cmd_list(&rt, &open_catalog(&rt, cli, &config)?, *limit),
        Commands::Config { init } => cmd_config(&config, *init),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Open (creating if needed) the catalog database.
///
/// `--db` wins over `[database] path` in the config file.
fn open_catalog(rt: &Runtime, cli: &Cli, config: &Config) -> anyhow::Result<Catalog> {
    let path = cli.db.as_deref().or(config.database.path.as_deref());
    let url = db::db_url(path);
    let pool = rt.block_on(db::init_db(&url))?;
    Ok(Catalog::new(pool, config.catalog.clone()))
}

/// Format seconds as `M:SS`.
pub(crate) fn format_duration(secs: Option<i64>) -> String {
    match secs {
        Some(s) => format!("{}:{:02}", s / 60, s % 60),
        None => "-".to_string(),
    }
}
