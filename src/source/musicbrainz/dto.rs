//! MusicBrainz API Data Transfer Objects
//!
//! These types match what the `/recording?query=` search endpoint returns.
//! Don't use them outside the musicbrainz module; the adapter converts them
//! into [`TrackRecord`](crate::model::TrackRecord)s.
//!
//! API Reference: https://musicbrainz.org/doc/MusicBrainz_API/Search

use serde::Deserialize;

/// Recording search response
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Total matches on the server (not just this page)
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

/// A recording as returned by search
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Recording {
    /// MusicBrainz recording ID
    pub id: String,
    /// Search relevance, 0-100
    pub score: Option<u32>,
    pub title: String,
    /// Duration in milliseconds
    pub length: Option<u64>,
    #[serde(default)]
    pub artist_credit: Vec<ArtistCredit>,
    #[serde(default)]
    pub releases: Vec<Release>,
    /// Folksonomy tags
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Artist credit (can be multiple for collaborations)
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistCredit {
    pub artist: Artist,
    /// How this artist is credited (may differ from official name)
    pub name: Option<String>,
    /// Join phrase (e.g., " & ", " feat. ")
    pub joinphrase: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub sort_name: Option<String>,
}

/// Release (album/single/EP)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Release {
    pub id: String,
    pub title: String,
    /// Official, Bootleg, ...
    pub status: Option<String>,
    /// YYYY, YYYY-MM, or YYYY-MM-DD
    pub date: Option<String>,
    pub release_group: Option<ReleaseGroup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseGroup {
    pub id: String,
    pub title: Option<String>,
    /// Album, Single, EP, ...
    pub primary_type: Option<String>,
    pub first_release_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub count: i64,
}

/// Error response from MusicBrainz API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub help: Option<String>,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// If these fail, the API has changed and we need to update our DTOs.
// ============================================================================
