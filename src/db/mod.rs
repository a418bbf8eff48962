//! Database module for artist, album, and song persistence.
//!
//! Uses SQLx with SQLite as the document store behind the catalog. The
//! schema enforces every identity invariant with a unique index, and
//! [`is_unique_violation`] lets callers tell a duplicate-key failure apart
//! from any other write error. The functions here are single-statement
//! primitives; the find-or-create protocols built on them live in
//! [`crate::catalog`].
//!
//! # Example
//!
//! ```ignore
//! use songbook::db::{init_db, find_song_by_signature};
//!
//! let pool = init_db("sqlite:songbook.db").await?;
//! let song = find_song_by_signature(&pool, &signature).await?;
//! ```

use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::model::{Album, AlbumExtra, Artist, ArtistExtra, Song, SourceRef, Sources};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "songbook.db";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&std::path::Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a WAL-mode
/// pool with up to 5 connections, and runs all pending migrations.
///
/// # Errors
///
/// Returns an error if:
/// - The URL cannot be parsed
/// - Connection cannot be established
/// - Migration fails
pub async fn init_db(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Whether a write failed because it would have broken a unique index.
///
/// This is the duplicate-key signal the find-or-create protocols rely on;
/// every other failure must be propagated.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn encode_genres(genres: &[String]) -> Option<String> {
    if genres.is_empty() {
        None
    } else {
        serde_json::to_string(genres).ok()
    }
}

pub(crate) fn decode_genres(raw: Option<String>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

// ============================================================================
// Database Row Types
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ArtistRow {
    id: i64,
    name: String,
    name_norm: String,
    source: Option<String>,
    source_id: Option<String>,
    image_url: Option<String>,
    genres: Option<String>,
    popularity: Option<i64>,
    created_at: String,
}

impl From<ArtistRow> for Artist {
    fn from(row: ArtistRow) -> Self {
        Artist {
            id: row.id,
            name: row.name,
            name_norm: row.name_norm,
            source: row.source,
            source_id: row.source_id,
            image_url: row.image_url,
            genres: decode_genres(row.genres),
            popularity: row.popularity,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AlbumRow {
    id: i64,
    title: String,
    title_norm: String,
    artist_id: i64,
    release_year: Option<i64>,
    source: Option<String>,
    source_id: Option<String>,
    cover_url: Option<String>,
    created_at: String,
}

impl From<AlbumRow> for Album {
    fn from(row: AlbumRow) -> Self {
        Album {
            id: row.id,
            title: row.title,
            title_norm: row.title_norm,
            artist_id: row.artist_id,
            release_year: row.release_year.map(|y| y as i32),
            source: row.source,
            source_id: row.source_id,
            cover_url: row.cover_url,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SongRow {
    id: i64,
    title: String,
    title_norm: String,
    artist_id: i64,
    artist_name: String,
    album_id: Option<i64>,
    album_title: Option<String>,
    duration_sec: Option<i64>,
    signature: String,
    genres: Option<String>,
    album_art: Option<String>,
    popularity: Option<i64>,
    created_at: String,
}

impl SongRow {
    fn into_song(self, sources: Sources) -> Song {
        Song {
            id: self.id,
            title: self.title,
            title_norm: self.title_norm,
            artist_id: self.artist_id,
            artist_name: self.artist_name,
            album_id: self.album_id,
            album_title: self.album_title,
            duration_sec: self.duration_sec,
            signature: self.signature,
            sources,
            genres: decode_genres(self.genres),
            album_art: self.album_art,
            popularity: self.popularity,
            created_at: self.created_at,
        }
    }
}

// ============================================================================
// Artists
// ============================================================================

/// Look up an artist by its normalized name.
pub async fn find_artist_by_norm(pool: &SqlitePool, name_norm: &str) -> sqlx::Result<Option<Artist>> {
    let row: Option<ArtistRow> = sqlx::query_as("SELECT * FROM artists WHERE name_norm = ?")
        .bind(name_norm)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Artist::from))
}

/// Insert a new artist row.
///
/// Fails with a unique violation if another writer already created an
/// artist under the same `name_norm`.
pub async fn insert_artist(
    pool: &SqlitePool,
    name: &str,
    name_norm: &str,
    source: Option<&str>,
    source_id: Option<&str>,
    extra: &ArtistExtra,
) -> sqlx::Result<Artist> {
    let row: ArtistRow = sqlx::query_as(
        r#"
        INSERT INTO artists (name, name_norm, source, source_id, image_url, genres, popularity, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(name_norm)
    .bind(source)
    .bind(source_id)
    .bind(&extra.image_url)
    .bind(encode_genres(&extra.genres))
    .bind(extra.popularity)
    .bind(now())
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Fill in an artist's image and genres where they are still empty.
///
/// Values already present are never overwritten.
pub async fn fill_artist_metadata(
    pool: &SqlitePool,
    artist_id: i64,
    extra: &ArtistExtra,
) -> sqlx::Result<Option<Artist>> {
    let row: Option<ArtistRow> = sqlx::query_as(
        r#"
        UPDATE artists SET
            image_url = COALESCE(image_url, ?),
            genres = COALESCE(genres, ?)
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&extra.image_url)
    .bind(encode_genres(&extra.genres))
    .bind(artist_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Artist::from))
}

// ============================================================================
// Albums
// ============================================================================

/// Look up an album by its composite identity.
///
/// `release_year = None` only matches albums stored without a year.
pub async fn find_album(
    pool: &SqlitePool,
    artist_id: i64,
    title_norm: &str,
    release_year: Option<i32>,
) -> sqlx::Result<Option<Album>> {
    let row: Option<AlbumRow> = sqlx::query_as(
        "SELECT * FROM albums WHERE artist_id = ? AND title_norm = ? AND release_year IS ?",
    )
    .bind(artist_id)
    .bind(title_norm)
    .bind(release_year)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Album::from))
}

/// Insert a new album row.
///
/// Fails with a unique violation if the `(artist, title, year)` triple
/// already exists.
#[allow(clippy::too_many_arguments)]
pub async fn insert_album(
    pool: &SqlitePool,
    title: &str,
    title_norm: &str,
    artist_id: i64,
    release_year: Option<i32>,
    source: Option<&str>,
    source_id: Option<&str>,
    extra: &AlbumExtra,
) -> sqlx::Result<Album> {
    let row: AlbumRow = sqlx::query_as(
        r#"
        INSERT INTO albums (title, title_norm, artist_id, release_year, source, source_id, cover_url, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(title_norm)
    .bind(artist_id)
    .bind(release_year)
    .bind(source)
    .bind(source_id)
    .bind(&extra.cover_url)
    .bind(now())
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

// ============================================================================
// Songs
// ============================================================================

/// Fields of a song about to be created.
#[derive(Debug, Clone)]
pub struct NewSong<'a> {
    pub title: &'a str,
    pub title_norm: &'a str,
    pub artist_id: i64,
    pub artist_name: &'a str,
    pub artist_name_norm: &'a str,
    pub album_id: Option<i64>,
    pub album_title: Option<&'a str>,
    pub album_title_norm: Option<&'a str>,
    pub duration_sec: Option<i64>,
    pub signature: &'a str,
    pub genres: &'a [String],
    pub album_art: Option<&'a str>,
    pub popularity: Option<i64>,
}

/// Insert a new song row together with its first source and return its ID.
///
/// Both rows are written in one transaction, so a song is never visible
/// without provenance. Fails with a unique violation if the signature
/// already exists.
pub async fn insert_song(pool: &SqlitePool, song: &NewSong<'_>, source: &SourceRef) -> sqlx::Result<i64> {
    let mut tx = pool.begin().await?;

    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO songs (
            title, title_norm, artist_id, artist_name, artist_name_norm, album_id,
            album_title, album_title_norm, duration_sec, signature, genres,
            album_art, popularity, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(song.title)
    .bind(song.title_norm)
    .bind(song.artist_id)
    .bind(song.artist_name)
    .bind(song.artist_name_norm)
    .bind(song.album_id)
    .bind(song.album_title)
    .bind(song.album_title_norm)
    .bind(song.duration_sec)
    .bind(song.signature)
    .bind(encode_genres(song.genres))
    .bind(song.album_art)
    .bind(song.popularity)
    .bind(now())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO song_sources (song_id, source, source_id, added_at) VALUES (?, ?, ?, ?)")
        .bind(row.0)
        .bind(&source.source)
        .bind(&source.source_id)
        .bind(now())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(row.0)
}

/// Append a provenance pair to a song.
///
/// Returns `true` if the pair was added, `false` if it was already attached.
pub async fn add_song_source(
    pool: &SqlitePool,
    song_id: i64,
    source: &SourceRef,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO song_sources (song_id, source, source_id, added_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(song_id, source, source_id) DO NOTHING
        "#,
    )
    .bind(song_id)
    .bind(&source.source)
    .bind(&source.source_id)
    .bind(now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Provenance list of a song, in the order the sources were attached.
pub async fn get_song_sources(pool: &SqlitePool, song_id: i64) -> sqlx::Result<Sources> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT source, source_id FROM song_sources WHERE song_id = ? ORDER BY rowid",
    )
    .bind(song_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(source, source_id)| SourceRef { source, source_id })
        .collect())
}

async fn hydrate(pool: &SqlitePool, row: Option<SongRow>) -> sqlx::Result<Option<Song>> {
    match row {
        Some(row) => {
            let sources = get_song_sources(pool, row.id).await?;
            Ok(Some(row.into_song(sources)))
        }
        None => Ok(None),
    }
}

/// Get a song (with its sources) by database ID.
pub async fn get_song(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Song>> {
    let row: Option<SongRow> = sqlx::query_as("SELECT * FROM songs WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    hydrate(pool, row).await
}

/// Get a song (with its sources) by content signature.
pub async fn find_song_by_signature(pool: &SqlitePool, signature: &str) -> sqlx::Result<Option<Song>> {
    let row: Option<SongRow> = sqlx::query_as("SELECT * FROM songs WHERE signature = ?")
        .bind(signature)
        .fetch_optional(pool)
        .await?;

    hydrate(pool, row).await
}

/// List songs in creation order.
pub async fn list_songs(pool: &SqlitePool, limit: i64) -> sqlx::Result<Vec<Song>> {
    let rows: Vec<SongRow> = sqlx::query_as("SELECT * FROM songs ORDER BY id LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await?;

    let mut songs = Vec::with_capacity(rows.len());
    for row in rows {
        let sources = get_song_sources(pool, row.id).await?;
        songs.push(row.into_song(sources));
    }
    Ok(songs)
}

/// Total number of songs in the catalog.
pub async fn count_songs(pool: &SqlitePool) -> sqlx::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM songs")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

/// Total number of artists in the catalog.
pub async fn count_artists(pool: &SqlitePool) -> sqlx::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM artists")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
