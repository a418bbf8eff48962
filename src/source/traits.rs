//! Trait definitions for external track sources.
//!
//! The catalog only depends on [`TrackSearchApi`], so tests can substitute a
//! mock for the real HTTP client.
//!
//! # Example
//!
//! ```ignore
//! use songbook::source::{TrackSearchApi, ingest_search};
//!
//! // In production code:
//! let client = MusicBrainzClient::new(&config.upstream)?;
//! ingest_search(&catalog, &client, "bohemian rhapsody", 10).await?;
//!
//! // In tests:
//! let mock = MockTrackSearch::with_records(vec![mock_track_record()]);
//! ingest_search(&catalog, &mock, "anything", 10).await?;
//! ```

use async_trait::async_trait;

use super::UpstreamError;
use crate::model::TrackRecord;

/// A searchable external catalog of tracks.
#[async_trait]
pub trait TrackSearchApi: Send + Sync {
    /// Search by free text, returning at most `limit` records.
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<TrackRecord>, UpstreamError>;
}

#[async_trait]
impl TrackSearchApi for super::musicbrainz::MusicBrainzClient {
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<TrackRecord>, UpstreamError> {
        self.search_tracks(query, limit).await
    }
}
