//! Catalog search and upstream fetch commands.

use tokio::runtime::Runtime;

use super::format_duration;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::search::{CatalogSearch, SearchFilters};
use crate::source::{self, MusicBrainzClient};

/// Search the local catalog.
pub fn cmd_search(
    rt: &Runtime,
    catalog: &Catalog,
    config: &Config,
    query: &str,
    filters: &SearchFilters,
    json: bool,
) -> anyhow::Result<()> {
    let search = CatalogSearch::new(catalog.pool().clone(), config.search.clone());

    rt.block_on(async {
        let response = search.search(query, filters).await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&response)?);
            return Ok(());
        }

        if response.songs.is_empty() {
            println!("No songs match {:?}", query);
            return Ok(());
        }
        for hit in &response.songs {
            let album = hit.album_title.as_deref().map(|a| format!(" ({})", a)).unwrap_or_default();
            println!(
                "{:>6}  {} - {}{} [{}]",
                hit.id,
                hit.artist_name,
                hit.title,
                album,
                format_duration(hit.duration_sec)
            );
        }
        Ok::<_, anyhow::Error>(())
    })
}

/// Search MusicBrainz and save every hit into the catalog.
pub fn cmd_fetch(rt: &Runtime, catalog: &Catalog, config: &Config, query: &str, limit: u32) -> anyhow::Result<()> {
    let client = MusicBrainzClient::new(&config.upstream)?;

    rt.block_on(async {
        println!("Searching MusicBrainz for {:?}...", query);
        let summary = source::ingest_search(catalog, &client, query, limit).await?;

        println!("  Fetched:  {}", summary.fetched);
        println!("  Inserted: {}", summary.inserted);
        println!("  Updated:  {}", summary.updated);
        for failure in &summary.failures {
            println!("  Skipped {}: {}", failure.source_id, failure.message);
        }
        Ok::<_, anyhow::Error>(())
    })
}
