//! CSV import commands.

use std::path::Path;
use tokio::runtime::Runtime;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::import::{ImportService, ImportSummary};

/// Preview a CSV file as a draft, or commit it directly with `commit`.
pub fn cmd_import(
    rt: &Runtime,
    catalog: &Catalog,
    config: &Config,
    file: &Path,
    actor: &str,
    commit: bool,
) -> anyhow::Result<()> {
    let service = ImportService::new(catalog.clone(), &config.import);

    rt.block_on(async {
        let preview = service.preview_file(actor, file).await?;

        println!("Parsed {:?}", file);
        println!("  Valid rows:   {}", preview.valid_rows);
        println!("  Invalid rows: {}", preview.invalid_rows);
        for error in &preview.errors {
            println!("    {}", error);
        }

        if commit {
            let summary = service.commit(actor, &preview.draft_id).await?;
            print_summary(&summary);
        } else {
            println!();
            println!("Draft {} staged (expires {})", preview.draft_id, preview.expires_at.format("%Y-%m-%d %H:%M UTC"));
            println!("Commit with: songbook commit {} --actor {}", preview.draft_id, actor);
        }
        Ok::<_, anyhow::Error>(())
    })
}

/// Show the rows of a staged draft.
pub fn cmd_draft(rt: &Runtime, catalog: &Catalog, config: &Config, draft: &str, actor: &str) -> anyhow::Result<()> {
    let service = ImportService::new(catalog.clone(), &config.import);

    rt.block_on(async {
        let draft = service.draft(actor, draft).await?;

        println!("Draft {} (expires {})", draft.id, draft.expires_at.format("%Y-%m-%d %H:%M UTC"));
        for row in &draft.rows {
            let status = if row.is_valid() {
                "ok".to_string()
            } else {
                row.errors.join("; ")
            };
            println!("  {:>4}  {} - {}  [{}]", row.row, row.artist, row.title, status);
        }
        Ok::<_, anyhow::Error>(())
    })
}

/// Commit a previously staged draft.
pub fn cmd_commit(rt: &Runtime, catalog: &Catalog, config: &Config, draft: &str, actor: &str) -> anyhow::Result<()> {
    let service = ImportService::new(catalog.clone(), &config.import);

    rt.block_on(async {
        let summary = service.commit(actor, draft).await?;
        print_summary(&summary);
        Ok::<_, anyhow::Error>(())
    })
}

fn print_summary(summary: &ImportSummary) {
    println!();
    println!("Import complete:");
    println!("  Inserted: {}", summary.inserted);
    println!("  Updated:  {}", summary.updated);
    if !summary.errors.is_empty() {
        println!("  Errors:   {}", summary.errors.len());
        for error in &summary.errors {
            println!("    Row {}: {}", error.row, error.message);
        }
    }
}
