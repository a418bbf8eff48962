//! Adapter layer: Convert MusicBrainz DTOs to catalog track records
//!
//! This is the ONLY place where DTO types are converted to [`TrackRecord`].
//! If MusicBrainz changes its response format, only this file and dto.rs
//! need to change.

use super::dto;
use crate::model::TrackRecord;

/// Source tag for records that came from MusicBrainz.
pub const SOURCE: &str = "musicbrainz";

/// Tags kept per recording, most-voted first.
const MAX_GENRES: usize = 5;

/// Convert a search hit into a track record.
///
/// Returns `None` for recordings without any artist credit; the catalog
/// can't place those.
pub fn to_track_record(recording: dto::Recording) -> Option<TrackRecord> {
    let artists = credited_names(&recording.artist_credit);
    if artists.is_empty() {
        return None;
    }
    let artist_source_id = recording.artist_credit.first().map(|c| c.artist.id.clone());

    let release = pick_release(&recording.releases);
    let release_date = release.and_then(|r| {
        r.date.clone().filter(|d| !d.is_empty()).or_else(|| {
            r.release_group
                .as_ref()
                .and_then(|rg| rg.first_release_date.clone())
        })
    });

    Some(TrackRecord {
        source: SOURCE.to_string(),
        source_id: recording.id,
        title: recording.title,
        artists,
        artist_source_id,
        album: release.map(|r| r.title.clone()),
        album_source_id: release.map(|r| r.id.clone()),
        release_date,
        duration_ms: recording.length,
        cover_url: release.map(|r| cover_url(&r.id)),
        popularity: None,
        genres: extract_genres(&recording.tags),
    })
}

/// Names in credit order, using the credited name when it differs from the
/// official one.
fn credited_names(credits: &[dto::ArtistCredit]) -> Vec<String> {
    credits
        .iter()
        .map(|c| c.name.as_deref().unwrap_or(&c.artist.name).trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Prefer an official album, then any official release, then whatever is first.
fn pick_release(releases: &[dto::Release]) -> Option<&dto::Release> {
    let official = |r: &&dto::Release| r.status.as_deref() == Some("Official");

    releases
        .iter()
        .filter(official)
        .find(|r| {
            r.release_group
                .as_ref()
                .and_then(|rg| rg.primary_type.as_deref())
                == Some("Album")
        })
        .or_else(|| releases.iter().find(official))
        .or_else(|| releases.first())
}

fn cover_url(release_id: &str) -> String {
    format!("https://coverartarchive.org/release/{}/front-250", release_id)
}

/// Top tags by vote count, lowercased; tags without positive votes are noise.
fn extract_genres(tags: &[dto::Tag]) -> Vec<String> {
    let mut sorted: Vec<_> = tags.iter().filter(|t| t.count > 0).collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));

    sorted
        .into_iter()
        .take(MAX_GENRES)
        .map(|t| t.name.trim().to_lowercase())
        .collect()
}
