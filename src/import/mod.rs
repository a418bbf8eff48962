//! CSV import pipeline.
//!
//! Two phases:
//!
//! 1. **Preview** - parse the text, stage every row in a draft, and report
//!    what would be committed.
//! 2. **Commit** - run each valid row through the same upsert as single-track
//!    ingestion (`source = "csv"`, `sourceId = actor`).
//!
//! Commit is not all-or-nothing: a bad row is reported in
//! [`ImportSummary::errors`] and the rest still land.

pub mod csv;
pub mod drafts;

pub use csv::{ParseResult, ParsedRow, Validation, parse_csv, parse_duration, validate_songs};
pub use drafts::{Draft, DraftStore};

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{Catalog, SaveStatus};
use crate::config::ImportConfig;
use crate::error::{Error, Result, ResultExt};
use crate::model::TrackRecord;

/// Source tag for rows that came from a CSV import.
pub const CSV_SOURCE: &str = "csv";

impl ParsedRow {
    /// Convert into a catalog record attributed to the importing actor.
    pub fn to_track_record(&self, actor_id: &str) -> TrackRecord {
        TrackRecord {
            source: CSV_SOURCE.to_string(),
            source_id: actor_id.to_string(),
            title: self.title.clone(),
            artists: vec![self.artist.clone()],
            album: self.album.clone(),
            duration_ms: self.duration.map(|secs| u64::from(secs) * 1000),
            genres: self.genre.iter().cloned().collect(),
            ..Default::default()
        }
    }
}

/// A row that could not be committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

/// Aggregate outcome of a commit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    /// Rows that created a new song
    pub inserted: usize,
    /// Rows that matched an existing song
    pub updated: usize,
    pub errors: Vec<RowError>,
}

/// What a preview staged.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPreview {
    pub draft_id: String,
    pub expires_at: DateTime<Utc>,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub songs: Vec<ParsedRow>,
    pub errors: Vec<String>,
}

/// Drives previews and commits against a catalog.
#[derive(Debug, Clone)]
pub struct ImportService {
    catalog: Catalog,
    drafts: DraftStore,
}

impl ImportService {
    pub fn new(catalog: Catalog, config: &ImportConfig) -> Self {
        let ttl = Duration::hours(i64::from(config.draft_ttl_hours));
        let drafts = DraftStore::new(catalog.pool().clone(), ttl);
        Self { catalog, drafts }
    }

    /// Parse `text` and stage the rows as a draft owned by `actor_id`.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the actor is blank, or the file is empty or
    ///   lacks a required column
    /// - [`Error::Database`] if the draft can't be stored
    pub async fn preview(&self, actor_id: &str, text: &str) -> Result<DraftPreview> {
        let actor_id = require_actor(actor_id)?;

        let parsed = parse_csv(text);
        if !parsed.success {
            return Err(Error::validation("csv", parsed.errors.join("; ")));
        }

        let draft = self.drafts.create(actor_id, parsed.songs.clone()).await?;
        info!(
            target: "import",
            draft = %draft.id,
            actor = %actor_id,
            valid = parsed.valid_rows,
            invalid = parsed.invalid_rows,
            "Import preview staged"
        );

        Ok(DraftPreview {
            draft_id: draft.id,
            expires_at: draft.expires_at,
            valid_rows: parsed.valid_rows,
            invalid_rows: parsed.invalid_rows,
            songs: parsed.songs,
            errors: parsed.errors,
        })
    }

    /// Read a CSV file and stage it like [`preview`](Self::preview).
    ///
    /// # Errors
    ///
    /// [`Error::WithContext`] wrapping [`Error::Io`] if the file can't be
    /// read, otherwise as [`preview`](Self::preview).
    pub async fn preview_file(&self, actor_id: &str, path: &Path) -> Result<DraftPreview> {
        let text = std::fs::read_to_string(path).with_context(format!("reading {}", path.display()))?;
        self.preview(actor_id, &text).await
    }

    /// Commit a staged draft. The draft is consumed even if some rows fail.
    ///
    /// # Errors
    ///
    /// [`Error::DraftNotFound`] if the draft doesn't exist, expired, or
    /// belongs to another actor.
    pub async fn commit(&self, actor_id: &str, draft_id: &str) -> Result<ImportSummary> {
        let actor_id = require_actor(actor_id)?;
        let draft = self.drafts.take(actor_id, draft_id).await?;
        self.commit_rows(actor_id, draft.rows).await
    }

    /// Fetch a live draft owned by `actor_id` without consuming it.
    pub async fn draft(&self, actor_id: &str, draft_id: &str) -> Result<Draft> {
        let actor_id = require_actor(actor_id)?;
        self.drafts.get(actor_id, draft_id).await
    }

    /// Validate and commit rows directly, without staging a draft.
    ///
    /// Only a blank actor fails the call; per-row problems are collected in
    /// the summary.
    pub async fn commit_rows(&self, actor_id: &str, rows: Vec<ParsedRow>) -> Result<ImportSummary> {
        let actor_id = require_actor(actor_id)?;
        let validation = validate_songs(rows);

        let mut summary = ImportSummary::default();
        for invalid in validation.invalid {
            summary.errors.push(RowError {
                row: invalid.row,
                message: invalid.reasons.join("; "),
            });
        }

        for row in &validation.valid {
            match self.catalog.save_track(&row.to_track_record(actor_id)).await {
                Ok(outcome) => match outcome.status {
                    SaveStatus::Created => summary.inserted += 1,
                    SaveStatus::SourceAdded | SaveStatus::SourceAlreadyPresent => summary.updated += 1,
                },
                Err(e) => {
                    warn!(target: "import", row = row.row, error = %e, "Row failed to save");
                    summary.errors.push(RowError {
                        row: row.row,
                        message: e.to_string(),
                    });
                }
            }
        }

        summary.errors.sort_by_key(|e| e.row);
        info!(
            target: "import",
            actor = %actor_id,
            inserted = summary.inserted,
            updated = summary.updated,
            failed = summary.errors.len(),
            "Import committed"
        );
        Ok(summary)
    }
}

fn require_actor(actor_id: &str) -> Result<&str> {
    let actor_id = actor_id.trim();
    if actor_id.is_empty() {
        return Err(Error::validation("actor", "importing actor id is empty"));
    }
    Ok(actor_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::temp_catalog;

    async fn service() -> (ImportService, tempfile::TempDir) {
        let (catalog, dir) = temp_catalog().await;
        (ImportService::new(catalog, &ImportConfig::default()), dir)
    }

    #[tokio::test]
    async fn test_missing_artist_row_does_not_block_others() {
        let (service, _dir) = service().await;
        let text = "title,artist\nFirst Song,Band A\nSecond Song,\nThird Song,Band C\n";

        let preview = service.preview("alice", text).await.unwrap();
        assert_eq!(preview.valid_rows, 2);
        assert_eq!(preview.invalid_rows, 1);

        let summary = service.commit("alice", &preview.draft_id).await.unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].row, 2);
        assert!(summary.errors[0].message.contains("artist"));

        assert_eq!(service.catalog.count_songs().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rows_carry_csv_provenance() {
        let (service, _dir) = service().await;
        let rows = parse_csv("title,artist,album,duration,genre\nSong,Band,Record,3:01,rock\n").songs;

        service.commit_rows("alice", rows).await.unwrap();

        let songs = service.catalog.list_songs(10).await.unwrap();
        assert_eq!(songs.len(), 1);
        let song = &songs[0];
        assert_eq!(song.sources.len(), 1);
        assert_eq!(song.sources[0].source, "csv");
        assert_eq!(song.sources[0].source_id, "alice");
        assert_eq!(song.duration_sec, Some(181));
        assert_eq!(song.album_title.as_deref(), Some("Record"));
        assert_eq!(song.genres, vec!["rock"]);
    }

    #[tokio::test]
    async fn test_reimport_counts_as_updated() {
        let (service, _dir) = service().await;
        let text = "title,artist\nSong,Band\n";

        let first = service.commit_rows("alice", parse_csv(text).songs).await.unwrap();
        assert_eq!(first.inserted, 1);

        // Same actor: source already present
        let again = service.commit_rows("alice", parse_csv(text).songs).await.unwrap();
        assert_eq!((again.inserted, again.updated), (0, 1));

        // Different actor: a second provenance entry on the same song
        let other = service.commit_rows("bob", parse_csv("title,artist\n song , BAND \n").songs).await.unwrap();
        assert_eq!((other.inserted, other.updated), (0, 1));

        let songs = service.catalog.list_songs(10).await.unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].sources.len(), 2);
    }

    #[tokio::test]
    async fn test_commit_consumes_draft() {
        let (service, _dir) = service().await;
        let preview = service.preview("alice", "title,artist\nSong,Band\n").await.unwrap();

        service.commit("alice", &preview.draft_id).await.unwrap();
        let err = service.commit("alice", &preview.draft_id).await.unwrap_err();
        assert!(matches!(err, Error::DraftNotFound(_)));
    }

    #[tokio::test]
    async fn test_draft_can_be_inspected_before_commit() {
        let (service, _dir) = service().await;
        let preview = service.preview("alice", "title,artist\nSong,Band\nNo Artist,\n").await.unwrap();

        let draft = service.draft("alice", &preview.draft_id).await.unwrap();
        assert_eq!(draft.rows.len(), 2);
        assert!(!draft.rows[1].is_valid());

        // Inspecting doesn't consume
        let summary = service.commit("alice", &preview.draft_id).await.unwrap();
        assert_eq!(summary.inserted, 1);
        assert!(matches!(
            service.draft("alice", &preview.draft_id).await.unwrap_err(),
            Error::DraftNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_other_actor_cannot_commit() {
        let (service, _dir) = service().await;
        let preview = service.preview("alice", "title,artist\nSong,Band\n").await.unwrap();

        let err = service.commit("mallory", &preview.draft_id).await.unwrap_err();
        assert!(matches!(err, Error::DraftNotFound(_)));
        assert_eq!(service.catalog.count_songs().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_preview_rejects_bad_files() {
        let (service, _dir) = service().await;

        let err = service.preview("alice", "").await.unwrap_err();
        assert!(err.is_validation());

        let err = service.preview("alice", "name,performer\nx,y\n").await.unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("title"));

        let err = service.preview("  ", "title,artist\nSong,Band\n").await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_preview_file() {
        let (service, dir) = service().await;
        let path = dir.path().join("songs.csv");
        std::fs::write(&path, "title,artist\nSong,Band\n").unwrap();

        let preview = service.preview_file("alice", &path).await.unwrap();
        assert_eq!(preview.valid_rows, 1);

        let err = service
            .preview_file("alice", &dir.path().join("missing.csv"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing.csv"));
        assert!(matches!(err, Error::WithContext { ref source, .. } if matches!(**source, Error::Io(_))));
    }

    #[test]
    fn test_row_to_track_record() {
        let row = ParsedRow {
            row: 1,
            title: "Song".to_string(),
            artist: "Band".to_string(),
            album: None,
            duration: Some(334),
            genre: None,
            errors: vec![],
        };
        let record = row.to_track_record("alice");
        assert_eq!(record.source, CSV_SOURCE);
        assert_eq!(record.source_id, "alice");
        assert_eq!(record.duration_secs(), Some(334));
        assert!(record.genres.is_empty());
    }
}
