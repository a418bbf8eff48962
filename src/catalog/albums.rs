//! Album registry: albums are scoped to their artist.
//!
//! Identity is `(artist_id, title_norm, release_year)`. An album without a
//! release year is its own bucket, so undated sightings of the same title
//! collapse together while differently dated editions stay apart.

use sqlx::SqlitePool;
use tracing::debug;

use crate::db;
use crate::error::{Error, Result};
use crate::model::{Album, AlbumExtra, normalize};

/// Get or create an album for an artist.
///
/// Same idempotent protocol as the artist registry: look up, create if
/// missing, and on a duplicate-key race re-read the existing row.
///
/// # Errors
///
/// - [`Error::Validation`] if `title` is blank
/// - [`Error::Database`] on storage failures (including an unknown artist)
pub async fn find_or_create_album(
    pool: &SqlitePool,
    title: &str,
    artist_id: i64,
    release_year: Option<i32>,
    source: Option<&str>,
    source_id: Option<&str>,
    extra: &AlbumExtra,
) -> Result<Album> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::validation("album", "album title is empty"));
    }
    let title_norm = normalize(title);

    if let Some(existing) = db::find_album(pool, artist_id, &title_norm, release_year).await? {
        return Ok(existing);
    }

    match db::insert_album(pool, title, &title_norm, artist_id, release_year, source, source_id, extra).await {
        Ok(album) => {
            debug!(
                target: "catalog::album",
                id = album.id,
                artist_id,
                title = %album.title,
                year = ?album.release_year,
                "Created album"
            );
            Ok(album)
        }
        Err(e) if db::is_unique_violation(&e) => {
            debug!(target: "catalog::album", artist_id, title = %title_norm, "Album created concurrently, re-reading");
            db::find_album(pool, artist_id, &title_norm, release_year)
                .await?
                .ok_or(Error::Database(e))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::artists::find_or_create_artist;
    use crate::model::ArtistExtra;
    use crate::test_utils::temp_db;

    async fn artist(pool: &SqlitePool, name: &str) -> i64 {
        find_or_create_artist(pool, name, None, None, &ArtistExtra::default())
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_same_album_is_reused() {
        let (pool, _dir) = temp_db().await;
        let queen = artist(&pool, "Queen").await;

        let first = find_or_create_album(&pool, "A Night at the Opera", queen, Some(1975), None, None, &AlbumExtra::default())
            .await
            .unwrap();
        let second = find_or_create_album(&pool, " a night at the opera", queen, Some(1975), None, None, &AlbumExtra::default())
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.title, "A Night at the Opera");
    }

    #[tokio::test]
    async fn test_release_year_separates_albums() {
        let (pool, _dir) = temp_db().await;
        let queen = artist(&pool, "Queen").await;

        let original = find_or_create_album(&pool, "Greatest Hits", queen, Some(1981), None, None, &AlbumExtra::default())
            .await
            .unwrap();
        let reissue = find_or_create_album(&pool, "Greatest Hits", queen, Some(2011), None, None, &AlbumExtra::default())
            .await
            .unwrap();
        let undated = find_or_create_album(&pool, "Greatest Hits", queen, None, None, None, &AlbumExtra::default())
            .await
            .unwrap();
        let undated_again = find_or_create_album(&pool, "GREATEST HITS", queen, None, None, None, &AlbumExtra::default())
            .await
            .unwrap();

        assert_ne!(original.id, reissue.id);
        assert_ne!(original.id, undated.id);
        assert_eq!(undated.id, undated_again.id);
    }

    #[tokio::test]
    async fn test_same_title_for_different_artists() {
        let (pool, _dir) = temp_db().await;
        let a = artist(&pool, "Weezer").await;
        let b = artist(&pool, "Peter Gabriel").await;

        let first = find_or_create_album(&pool, "Untitled", a, None, None, None, &AlbumExtra::default())
            .await
            .unwrap();
        let second = find_or_create_album(&pool, "Untitled", b, None, None, None, &AlbumExtra::default())
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(second.artist_id, b);
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let (pool, _dir) = temp_db().await;
        let queen = artist(&pool, "Queen").await;

        let err = find_or_create_album(&pool, " ", queen, None, None, None, &AlbumExtra::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
