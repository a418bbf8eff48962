//! Song catalog deduplication engine.
//!
//! Keeps a single canonical set of artists, albums, and songs while the same
//! songs keep arriving from different sources with slightly different
//! metadata.
//!
//! # Architecture
//!
//! - **Artist registry** (`artists.rs`) - identity by normalized name
//! - **Album registry** (`albums.rs`) - identity by `(artist, title, year)`
//! - **Signature engine** (`signature.rs`) - fuzzy content identity for songs
//! - **Song catalog** (`songs.rs`) - signature-keyed upsert, provenance accrual
//!
//! Every create path is "insert; on unique violation, re-read and merge".
//! Nothing holds a lock across calls, and each record touches at most one
//! artist, album, and song row, so a partially applied save is safe to retry.
//!
//! # Usage
//!
//! ```ignore
//! use songbook::catalog::Catalog;
//!
//! let catalog = Catalog::new(pool, CatalogConfig::default());
//! let outcome = catalog.save_track(&record).await?;
//! if outcome.inserted {
//!     println!("created {}", outcome.song.id);
//! }
//! ```

pub mod albums;
pub mod artists;
pub mod signature;
pub mod songs;

pub use songs::{SaveOutcome, SaveStatus, has_source};

use sqlx::SqlitePool;

use crate::config::CatalogConfig;
use crate::db;
use crate::error::Result;
use crate::model::{Song, TrackRecord};

/// Handle to the canonical catalog.
///
/// Cheap to clone; all clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct Catalog {
    pool: SqlitePool,
    config: CatalogConfig,
}

impl Catalog {
    pub fn new(pool: SqlitePool, config: CatalogConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// See [`songs::save_track`].
    pub async fn save_track(&self, record: &TrackRecord) -> Result<SaveOutcome> {
        songs::save_track(&self.pool, record, self.config.duration_bucket_secs).await
    }

    pub async fn get_song(&self, id: i64) -> Result<Option<Song>> {
        Ok(db::get_song(&self.pool, id).await?)
    }

    pub async fn find_song_by_signature(&self, signature: &str) -> Result<Option<Song>> {
        Ok(db::find_song_by_signature(&self.pool, signature).await?)
    }

    pub async fn list_songs(&self, limit: i64) -> Result<Vec<Song>> {
        Ok(db::list_songs(&self.pool, limit).await?)
    }

    pub async fn count_songs(&self) -> Result<i64> {
        Ok(db::count_songs(&self.pool).await?)
    }

    pub async fn count_artists(&self) -> Result<i64> {
        Ok(db::count_artists(&self.pool).await?)
    }
}
