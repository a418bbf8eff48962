//! External track sources.
//!
//! An upstream catalog (MusicBrainz here) is searched by free text; every
//! hit is converted into a [`TrackRecord`](crate::model::TrackRecord) and
//! pushed through the same catalog upsert as CSV rows and manual entries.
//!
//! Upstream failures are reported as [`UpstreamError`] and never collapse
//! into an empty result: "the source is down" and "the source found
//! nothing" stay distinguishable.

pub mod musicbrainz;
pub mod traits;

pub use musicbrainz::MusicBrainzClient;
pub use traits::TrackSearchApi;

use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, SaveStatus};
use crate::error::Result;

/// Records saved at once while ingesting a search page.
const INGEST_CONCURRENCY: usize = 4;

/// Errors from an external track source.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited by upstream")]
    RateLimited,

    #[error("Upstream API error: {0}")]
    Api(String),

    #[error("Failed to parse upstream response: {0}")]
    Parse(String),
}

impl UpstreamError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// A fetched record the catalog refused.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestFailure {
    pub source_id: String,
    pub message: String,
}

/// Outcome of [`ingest_search`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestSummary {
    /// Records returned by the upstream
    pub fetched: usize,
    /// Songs created
    pub inserted: usize,
    /// Records merged into an existing song
    pub updated: usize,
    pub failures: Vec<IngestFailure>,
}

/// Search the upstream and save every hit into the catalog.
///
/// Records are saved concurrently; duplicate artists or songs within one
/// page are resolved by the catalog's upsert protocol.
///
/// # Errors
///
/// [`Error::Upstream`](crate::error::Error::Upstream) if the search itself
/// fails. Per-record save failures are collected in the summary.
pub async fn ingest_search<A>(catalog: &Catalog, api: &A, query: &str, limit: u32) -> Result<IngestSummary>
where
    A: TrackSearchApi + ?Sized,
{
    let records = api.search_tracks(query, limit).await.inspect_err(|e| {
        warn!(target: "upstream", query, error = %e, "Upstream search failed");
    })?;

    let mut summary = IngestSummary {
        fetched: records.len(),
        ..Default::default()
    };

    let results: Vec<_> = futures::stream::iter(records)
        .map(|record| async move {
            let outcome = catalog.save_track(&record).await;
            (record.source_id, outcome)
        })
        .buffer_unordered(INGEST_CONCURRENCY)
        .collect()
        .await;

    for (source_id, outcome) in results {
        match outcome {
            Ok(outcome) => match outcome.status {
                SaveStatus::Created => summary.inserted += 1,
                SaveStatus::SourceAdded | SaveStatus::SourceAlreadyPresent => summary.updated += 1,
            },
            Err(e) => {
                if e.is_validation() {
                    debug!(target: "upstream", source_id = %source_id, error = %e, "Skipping incomplete track");
                } else {
                    warn!(target: "upstream", source_id = %source_id, error = %e, "Failed to save fetched track");
                }
                summary.failures.push(IngestFailure {
                    source_id,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        target: "upstream",
        query,
        fetched = summary.fetched,
        inserted = summary.inserted,
        updated = summary.updated,
        failed = summary.failures.len(),
        "Ingested upstream search"
    );
    Ok(summary)
}
