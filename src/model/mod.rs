//! Core data models for the song catalog.
//!
//! Defines the canonical entities: [`Artist`], [`Album`], and [`Song`],
//! plus the [`TrackRecord`] shape that every ingestion path (upstream search,
//! CSV rows, manual entry) is converted into before it reaches the catalog.
//!
//! # Identity
//!
//! - `artists` - unique by `name_norm`
//! - `albums` - unique by `(artist_id, title_norm, release_year)`
//! - `songs` - unique by `signature` (see [`crate::catalog::signature`])

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Source tag for hand-entered songs.
pub const MANUAL_SOURCE: &str = "manual";

/// Normalize a display name into its identity key (trimmed, lowercased).
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// A `(source, sourceId)` provenance pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    /// Contributing system, e.g. `musicbrainz`, `csv`, `manual`
    pub source: String,
    /// Identifier within that system (track id, importing actor id, ...)
    pub source_id: String,
}

impl SourceRef {
    pub fn new(source: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_id: source_id.into(),
        }
    }
}

/// Provenance list. Almost every song has one or two sources.
pub type Sources = SmallVec<[SourceRef; 2]>;

/// A canonical artist.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    /// Database ID (auto-generated)
    pub id: i64,
    /// Display name as first seen
    pub name: String,
    /// Identity key (unique)
    pub name_norm: String,
    pub source: Option<String>,
    pub source_id: Option<String>,
    pub image_url: Option<String>,
    pub genres: Vec<String>,
    pub popularity: Option<i64>,
    pub created_at: String,
}

/// A canonical album, owned by one artist.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub title_norm: String,
    pub artist_id: i64,
    /// `None` is its own identity bucket
    pub release_year: Option<i32>,
    pub source: Option<String>,
    pub source_id: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: String,
}

/// A canonical song: one row per signature, whatever the number of sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub title_norm: String,
    pub artist_id: i64,
    /// Denormalized copy of the artist's display name
    pub artist_name: String,
    pub album_id: Option<i64>,
    /// Denormalized copy of the album's title
    pub album_title: Option<String>,
    pub duration_sec: Option<i64>,
    /// SHA-1 hex content signature (unique)
    pub signature: String,
    /// Append-only provenance, deduplicated by pair
    pub sources: Sources,
    pub genres: Vec<String>,
    pub album_art: Option<String>,
    pub popularity: Option<i64>,
    pub created_at: String,
}

/// Optional descriptive metadata attached to an artist on creation.
#[derive(Debug, Clone, Default)]
pub struct ArtistExtra {
    pub image_url: Option<String>,
    pub genres: Vec<String>,
    pub popularity: Option<i64>,
}

/// Optional descriptive metadata attached to an album on creation.
#[derive(Debug, Clone, Default)]
pub struct AlbumExtra {
    pub cover_url: Option<String>,
}

/// A typed track record handed to the catalog by any ingestion path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRecord {
    /// Contributing system
    pub source: String,
    /// Identifier within the contributing system
    pub source_id: String,
    pub title: String,
    /// Artist names; the first one is the primary artist
    pub artists: Vec<String>,
    /// Primary artist identifier within the contributing system
    pub artist_source_id: Option<String>,
    pub album: Option<String>,
    /// Album identifier within the contributing system
    pub album_source_id: Option<String>,
    /// Release date as `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    pub release_date: Option<String>,
    pub duration_ms: Option<u64>,
    pub cover_url: Option<String>,
    pub popularity: Option<i64>,
    pub genres: Vec<String>,
}

impl TrackRecord {
    /// A hand-entered record attributed to the actor who typed it in.
    pub fn manual(actor_id: &str, title: &str, artist: &str) -> Self {
        Self {
            source: MANUAL_SOURCE.to_string(),
            source_id: actor_id.to_string(),
            title: title.to_string(),
            artists: vec![artist.to_string()],
            ..Default::default()
        }
    }

    /// The primary (first non-blank) artist name, if any.
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists
            .iter()
            .map(|a| a.trim())
            .find(|a| !a.is_empty())
    }

    /// Duration rounded to whole seconds.
    pub fn duration_secs(&self) -> Option<u32> {
        self.duration_ms
            .map(|ms| (ms as f64 / 1000.0).round() as u32)
    }

    /// Release year parsed from the leading `YYYY` of the release date.
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_ref()
            .and_then(|d| d.trim().split('-').next())
            .and_then(|y| y.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize("  The Beatles "), "the beatles");
        assert_eq!(normalize("ABBA"), "abba");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_primary_artist_skips_blank_entries() {
        let record = TrackRecord {
            artists: vec!["  ".to_string(), "Queen".to_string(), "Bowie".to_string()],
            ..Default::default()
        };
        assert_eq!(record.primary_artist(), Some("Queen"));

        let empty = TrackRecord::default();
        assert_eq!(empty.primary_artist(), None);
    }

    #[test]
    fn test_duration_secs_rounds_milliseconds() {
        let record = TrackRecord {
            duration_ms: Some(354_499),
            ..Default::default()
        };
        assert_eq!(record.duration_secs(), Some(354));

        let record = TrackRecord {
            duration_ms: Some(354_500),
            ..Default::default()
        };
        assert_eq!(record.duration_secs(), Some(355));
    }

    #[test]
    fn test_manual_record_is_attributed_to_actor() {
        let record = TrackRecord::manual("dj-7", "Song", "Band");
        assert_eq!(record.source, MANUAL_SOURCE);
        assert_eq!(record.source_id, "dj-7");
        assert_eq!(record.primary_artist(), Some("Band"));
        assert!(record.duration_ms.is_none());
    }

    #[test]
    fn test_release_year_from_partial_dates() {
        let year = |date: &str| {
            TrackRecord {
                release_date: Some(date.to_string()),
                ..Default::default()
            }
            .release_year()
        };
        assert_eq!(year("1975-10-31"), Some(1975));
        assert_eq!(year("1975-10"), Some(1975));
        assert_eq!(year("1975"), Some(1975));
        assert_eq!(year("unknown"), None);
    }
}
