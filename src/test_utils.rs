//! Test utilities and fixtures for songbook tests.
//!
//! This module provides common test helpers, mock factories, and
//! database utilities to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use songbook::test_utils::{temp_catalog, mock_track_record};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (catalog, _dir) = temp_catalog().await;
//!     let outcome = catalog.save_track(&mock_track_record()).await.unwrap();
//!     // ... test logic
//! }
//! ```

use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::catalog::Catalog;
use crate::config::CatalogConfig;
use crate::model::TrackRecord;

/// Creates a temporary database for testing.
///
/// The database is created in a temporary directory that is automatically
/// cleaned up when the returned `TempDir` is dropped. Migrations are run
/// automatically.
///
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = crate::db::db_url(Some(&db_path));

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// Creates a catalog over a temporary database with default settings.
pub async fn temp_catalog() -> (Catalog, TempDir) {
    let (pool, dir) = temp_db().await;
    (Catalog::new(pool, CatalogConfig::default()), dir)
}

/// Creates a mock TrackRecord with sensible defaults.
///
/// Customize using struct update syntax:
///
/// ```ignore
/// let custom = TrackRecord {
///     source_id: "other".to_string(),
///     ..mock_track_record()
/// };
/// ```
pub fn mock_track_record() -> TrackRecord {
    TrackRecord {
        source: "mock".to_string(),
        source_id: "mock-1".to_string(),
        title: "Test Track".to_string(),
        artists: vec!["Test Artist".to_string()],
        artist_source_id: Some("mock-artist-1".to_string()),
        album: Some("Test Album".to_string()),
        album_source_id: Some("mock-album-1".to_string()),
        release_date: Some("2023-05-01".to_string()),
        duration_ms: Some(181_000),
        cover_url: Some("https://example.test/cover.jpg".to_string()),
        popularity: Some(50),
        genres: vec!["rock".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (pool, _dir) = temp_db().await;

        let count = crate::db::count_songs(&pool).await.unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_mock_track_record_defaults() {
        let record = mock_track_record();
        assert_eq!(record.title, "Test Track");
        assert_eq!(record.primary_artist(), Some("Test Artist"));
        assert_eq!(record.duration_secs(), Some(181));
        assert_eq!(record.release_year(), Some(2023));
    }
}
