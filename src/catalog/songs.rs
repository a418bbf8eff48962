//! Song catalog: signature-keyed upsert with provenance accrual.
//!
//! A song is created on the first sighting of its signature. Every later
//! sighting only appends its `(source, sourceId)` pair; the title, duration
//! and denormalized artist/album fields stay as the first writer left them.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::albums::find_or_create_album;
use super::artists::find_or_create_artist;
use super::signature::song_signature;
use crate::db::{self, NewSong};
use crate::error::{Error, Result};
use crate::model::{AlbumExtra, ArtistExtra, Song, SourceRef, TrackRecord, normalize};

/// What a save did to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    /// A new song was created
    Created,
    /// The song existed; this source was appended
    SourceAdded,
    /// The song existed and already carried this exact source
    SourceAlreadyPresent,
}

/// Result of [`save_track`]. "Already exists" is a normal outcome here,
/// never an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub inserted: bool,
    pub status: SaveStatus,
    pub song: Song,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_id: Option<i64>,
    pub message: &'static str,
}

impl SaveOutcome {
    fn new(status: SaveStatus, song: Song) -> Self {
        let (inserted, existing_id, message) = match status {
            SaveStatus::Created => (true, None, "Song added to catalog"),
            SaveStatus::SourceAdded => (false, Some(song.id), "Source added to existing song"),
            SaveStatus::SourceAlreadyPresent => {
                (false, Some(song.id), "Song already exists with this source")
            }
        };
        Self {
            inserted,
            status,
            song,
            existing_id,
            message,
        }
    }
}

/// Whether this exact `(source, source_id)` pair is attached to a song.
pub fn has_source(song: &Song, source: &str, source_id: &str) -> bool {
    song.sources
        .iter()
        .any(|s| s.source == source && s.source_id == source_id)
}

/// Save a track record into the catalog.
///
/// Resolves the artist (mandatory) and album (when named), computes the
/// signature, and either creates the song or merges this record's source into
/// the existing one. A duplicate-key race on the song insert falls through to
/// the merge branch.
///
/// # Errors
///
/// - [`Error::Validation`] if the record has no title, no artist, or no source
/// - [`Error::Database`] on storage failures
pub async fn save_track(pool: &SqlitePool, record: &TrackRecord, bucket_secs: u32) -> Result<SaveOutcome> {
    let title = record.title.trim();
    if title.is_empty() {
        return Err(Error::validation("title", "track record has no title"));
    }
    let Some(artist_name) = record.primary_artist() else {
        return Err(Error::validation("artist", "track record has no artist"));
    };
    let source = SourceRef::new(record.source.trim(), record.source_id.trim());
    if source.source.is_empty() || source.source_id.is_empty() {
        return Err(Error::validation("source", "track record has no source id"));
    }

    let artist_extra = ArtistExtra {
        image_url: None,
        genres: record.genres.clone(),
        popularity: None,
    };
    let artist = find_or_create_artist(
        pool,
        artist_name,
        Some(&source.source),
        record.artist_source_id.as_deref(),
        &artist_extra,
    )
    .await?;

    let album_title = record
        .album
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let album = match album_title {
        Some(album_title) => {
            let extra = AlbumExtra {
                cover_url: record.cover_url.clone(),
            };
            let album = find_or_create_album(
                pool,
                album_title,
                artist.id,
                record.release_year(),
                Some(&source.source),
                record.album_source_id.as_deref(),
                &extra,
            )
            .await?;
            Some(album)
        }
        None => None,
    };

    let title_norm = normalize(title);
    let duration = record.duration_secs();
    let signature = song_signature(&title_norm, artist.id, duration, bucket_secs);

    if let Some(existing) = db::find_song_by_signature(pool, &signature).await? {
        return merge_source(pool, existing, source).await;
    }

    let new_song = NewSong {
        title,
        title_norm: &title_norm,
        artist_id: artist.id,
        artist_name: &artist.name,
        artist_name_norm: &artist.name_norm,
        album_id: album.as_ref().map(|a| a.id),
        album_title: album.as_ref().map(|a| a.title.as_str()),
        album_title_norm: album.as_ref().map(|a| a.title_norm.as_str()),
        duration_sec: duration.map(i64::from),
        signature: &signature,
        genres: &record.genres,
        album_art: record.cover_url.as_deref(),
        popularity: record.popularity,
    };

    match db::insert_song(pool, &new_song, &source).await {
        Ok(id) => {
            let song = db::get_song(pool, id)
                .await?
                .ok_or(Error::Database(sqlx::Error::RowNotFound))?;
            info!(
                target: "catalog::song",
                id,
                title = %song.title,
                artist = %song.artist_name,
                source = %source.source,
                "Created song"
            );
            Ok(SaveOutcome::new(SaveStatus::Created, song))
        }
        Err(e) if db::is_unique_violation(&e) => {
            debug!(target: "catalog::song", signature = %signature, "Song created concurrently, merging source");
            let existing = db::find_song_by_signature(pool, &signature)
                .await?
                .ok_or(Error::Database(e))?;
            merge_source(pool, existing, source).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn merge_source(pool: &SqlitePool, mut song: Song, source: SourceRef) -> Result<SaveOutcome> {
    if has_source(&song, &source.source, &source.source_id) {
        return Ok(SaveOutcome::new(SaveStatus::SourceAlreadyPresent, song));
    }

    if db::add_song_source(pool, song.id, &source).await? {
        debug!(
            target: "catalog::song",
            id = song.id,
            source = %source.source,
            source_id = %source.source_id,
            "Source added to existing song"
        );
        song.sources.push(source);
        Ok(SaveOutcome::new(SaveStatus::SourceAdded, song))
    } else {
        // Another writer attached the same pair in between
        song.sources = db::get_song_sources(pool, song.id).await?;
        Ok(SaveOutcome::new(SaveStatus::SourceAlreadyPresent, song))
    }
}
