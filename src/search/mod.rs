//! Catalog search.
//!
//! Cache-first lookup over the denormalized `title`, `artist_name` and
//! `album_title` song fields. On a cache miss the FTS5 index (`songs_fts`)
//! is queried with prefix terms; when full-text search is disabled, or the
//! index query fails, a case-insensitive substring scan ranked by popularity
//! answers instead.

pub mod cache;

pub use cache::SearchCache;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::db::decode_genres;
use crate::error::Result;
use crate::model::normalize;

/// Upper bound on results per query.
pub const MAX_LIMIT: u32 = 100;

/// Optional narrowing of a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub artist_id: Option<i64>,
    /// Exact genre tag, case-insensitive
    pub genre: Option<String>,
    /// Defaults to the configured limit; capped at [`MAX_LIMIT`]
    pub limit: Option<u32>,
}

/// One matching song.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: i64,
    pub title: String,
    pub artist_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_art: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<i64>,
    /// Relevance (higher is better); absent for substring matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Search result envelope.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub songs: Vec<SearchHit>,
    /// Whether the result came from the cache
    pub cached: bool,
}

#[derive(sqlx::FromRow)]
struct HitRow {
    id: i64,
    title: String,
    artist_name: String,
    album_title: Option<String>,
    duration_sec: Option<i64>,
    genres: Option<String>,
    album_art: Option<String>,
    popularity: Option<i64>,
    score: Option<f64>,
}

impl HitRow {
    fn into_hit(self) -> SearchHit {
        SearchHit {
            id: self.id,
            title: self.title,
            artist_name: self.artist_name,
            album_title: self.album_title,
            duration_sec: self.duration_sec,
            genres: decode_genres(self.genres),
            album_art: self.album_art,
            popularity: self.popularity,
            score: self.score,
        }
    }
}

const HIT_COLUMNS: &str = "s.id, s.title, s.artist_name, s.album_title, s.duration_sec, \
     s.genres, s.album_art, s.popularity";

const FILTER_CLAUSE: &str = "(? IS NULL OR s.artist_id = ?) \
     AND (? IS NULL OR EXISTS (SELECT 1 FROM json_each(s.genres) g WHERE lower(g.value) = lower(?)))";

/// Cached search over the song catalog.
#[derive(Debug, Clone)]
pub struct CatalogSearch {
    pool: SqlitePool,
    config: SearchConfig,
    cache: Arc<SearchCache>,
}

impl CatalogSearch {
    pub fn new(pool: SqlitePool, config: SearchConfig) -> Self {
        let cache = Arc::new(SearchCache::new(Duration::from_secs(config.cache_ttl_secs)));
        Self { pool, config, cache }
    }

    /// Search songs by free text.
    ///
    /// A blank query returns no songs without touching the cache.
    pub async fn search(&self, query: &str, filters: &SearchFilters) -> Result<SearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResponse {
                songs: Vec::new(),
                cached: false,
            });
        }

        let limit = effective_limit(filters.limit, self.config.default_limit);
        let key = cache_key(query, filters, limit);
        if let Some(hits) = self.cache.get(&key) {
            debug!(target: "search", query, results = hits.len(), "Cache hit");
            return Ok(SearchResponse {
                songs: (*hits).clone(),
                cached: true,
            });
        }

        let hits = if self.config.full_text {
            match fts_query(query) {
                Some(terms) => match self.full_text(&terms, filters, limit).await {
                    Ok(hits) => hits,
                    Err(e) => {
                        warn!(target: "search", query, error = %e, "Full-text query failed, scanning instead");
                        self.substring(query, filters, limit).await?
                    }
                },
                None => self.substring(query, filters, limit).await?,
            }
        } else {
            self.substring(query, filters, limit).await?
        };

        debug!(target: "search", query, results = hits.len(), cached_entries = self.cache.len(), "Cache miss");
        self.cache.insert(key, Arc::new(hits.clone()));
        Ok(SearchResponse {
            songs: hits,
            cached: false,
        })
    }

    /// Drop all cached results, e.g. after a bulk import.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    async fn full_text(&self, terms: &str, filters: &SearchFilters, limit: u32) -> sqlx::Result<Vec<SearchHit>> {
        let sql = format!(
            "SELECT {HIT_COLUMNS}, -bm25(songs_fts) AS score \
             FROM songs_fts JOIN songs s ON s.id = songs_fts.rowid \
             WHERE songs_fts MATCH ? AND {FILTER_CLAUSE} \
             ORDER BY score DESC, s.id \
             LIMIT ?"
        );

        let rows: Vec<HitRow> = sqlx::query_as(&sql)
            .bind(terms)
            .bind(filters.artist_id)
            .bind(filters.artist_id)
            .bind(filters.genre.as_deref())
            .bind(filters.genre.as_deref())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(HitRow::into_hit).collect())
    }

    /// Matches against the `*_norm` columns, which were lowercased in Rust
    /// when the song was created. SQLite's own `lower()` only folds ASCII.
    async fn substring(&self, query: &str, filters: &SearchFilters, limit: u32) -> sqlx::Result<Vec<SearchHit>> {
        let sql = format!(
            "SELECT {HIT_COLUMNS}, NULL AS score \
             FROM songs s \
             WHERE (instr(s.title_norm, ?) > 0 \
                 OR instr(s.artist_name_norm, ?) > 0 \
                 OR instr(COALESCE(s.album_title_norm, ''), ?) > 0) \
               AND {FILTER_CLAUSE} \
             ORDER BY COALESCE(s.popularity, 0) DESC, s.id \
             LIMIT ?"
        );
        let needle = normalize(query);

        let rows: Vec<HitRow> = sqlx::query_as(&sql)
            .bind(&needle)
            .bind(&needle)
            .bind(&needle)
            .bind(filters.artist_id)
            .bind(filters.artist_id)
            .bind(filters.genre.as_deref())
            .bind(filters.genre.as_deref())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(HitRow::into_hit).collect())
    }
}

fn effective_limit(requested: Option<u32>, default: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, MAX_LIMIT)
}

fn cache_key(query: &str, filters: &SearchFilters, limit: u32) -> String {
    format!(
        "{}|{}|{}|{}",
        query.to_lowercase(),
        filters.artist_id.map(|id| id.to_string()).unwrap_or_default(),
        filters.genre.as_deref().map(str::to_lowercase).unwrap_or_default(),
        limit
    )
}

/// Turn free text into an FTS5 prefix query (`foo* bar*`).
///
/// Punctuation is stripped so user input can't inject FTS5 syntax. Returns
/// `None` when nothing searchable is left.
fn fts_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|word| word.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|word| !word.is_empty())
        .map(|word| format!("{}*", word))
        .collect();

    (!terms.is_empty()).then(|| terms.join(" "))
}
