//! Artist registry: one canonical artist per normalized name.

use sqlx::SqlitePool;
use tracing::debug;

use crate::db;
use crate::error::{Error, Result};
use crate::model::{Artist, ArtistExtra, normalize};

/// Get or create an artist by name.
///
/// Looks the artist up by its normalized name (trimmed, lowercased). An
/// existing artist is returned as-is apart from filling in an image or
/// genres it does not have yet; its name and provenance are never touched.
/// Otherwise a new artist is created with the given provenance and metadata.
///
/// Concurrent creators of the same name are resolved by catching the
/// unique-index violation and re-reading the row the winner created.
///
/// # Errors
///
/// - [`Error::Validation`] if `name` is blank
/// - [`Error::Database`] on storage failures
pub async fn find_or_create_artist(
    pool: &SqlitePool,
    name: &str,
    source: Option<&str>,
    source_id: Option<&str>,
    extra: &ArtistExtra,
) -> Result<Artist> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("artist", "artist name is empty"));
    }
    let name_norm = normalize(name);

    if let Some(existing) = db::find_artist_by_norm(pool, &name_norm).await? {
        return attach_missing_metadata(pool, existing, extra).await;
    }

    match db::insert_artist(pool, name, &name_norm, source, source_id, extra).await {
        Ok(artist) => {
            debug!(target: "catalog::artist", id = artist.id, name = %artist.name, "Created artist");
            Ok(artist)
        }
        Err(e) if db::is_unique_violation(&e) => {
            debug!(target: "catalog::artist", name = %name_norm, "Artist created concurrently, re-reading");
            let existing = db::find_artist_by_norm(pool, &name_norm)
                .await?
                .ok_or(Error::Database(e))?;
            attach_missing_metadata(pool, existing, extra).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn attach_missing_metadata(pool: &SqlitePool, artist: Artist, extra: &ArtistExtra) -> Result<Artist> {
    let fills_image = artist.image_url.is_none() && extra.image_url.is_some();
    let fills_genres = artist.genres.is_empty() && !extra.genres.is_empty();
    if !fills_image && !fills_genres {
        return Ok(artist);
    }

    match db::fill_artist_metadata(pool, artist.id, extra).await? {
        Some(updated) => Ok(updated),
        None => Ok(artist),
    }
}
