//! MusicBrainz HTTP client
//!
//! Handles communication with the MusicBrainz web service.
//! See: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! IMPORTANT: MusicBrainz requires a User-Agent header and rate limits to 1 req/sec.

use std::time::Duration;

use tracing::debug;

use super::{adapter, dto};
use crate::config::UpstreamConfig;
use crate::model::TrackRecord;
use crate::source::UpstreamError;

/// The search endpoint returns at most this many recordings per page.
const MAX_PAGE: u32 = 100;

/// User agent string - MusicBrainz requires this
const USER_AGENT: &str = concat!(
    "Songbook/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/songbook/songbook)"
);

/// MusicBrainz API client
#[derive(Debug, Clone)]
pub struct MusicBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl MusicBrainzClient {
    /// Create a client from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Search recordings by free text and convert the hits to track records.
    pub async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<TrackRecord>, UpstreamError> {
        let response = self.send_search_request(query, limit.clamp(1, MAX_PAGE)).await?;
        debug!(
            target: "upstream",
            query,
            total = response.count,
            returned = response.recordings.len(),
            "MusicBrainz search"
        );

        Ok(response
            .recordings
            .into_iter()
            .filter_map(adapter::to_track_record)
            .collect())
    }

    fn search_url(&self, query: &str, limit: u32) -> String {
        format!(
            "{}/recording?query={}&limit={}&fmt=json",
            self.base_url,
            urlencoding::encode(query),
            limit
        )
    }

    /// Send the HTTP request and parse the response
    async fn send_search_request(&self, query: &str, limit: u32) -> Result<dto::SearchResponse, UpstreamError> {
        let url = self.search_url(query, limit);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(UpstreamError::from_reqwest)?;

        let status = response.status();

        // An empty search is not a failure
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(dto::SearchResponse {
                count: 0,
                offset: 0,
                recordings: Vec::new(),
            });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(UpstreamError::RateLimited);
        }

        if !status.is_success() {
            // Try to parse error response
            if let Ok(error) = response.json::<dto::ApiError>().await {
                return Err(UpstreamError::Api(error.error));
            }
            return Err(UpstreamError::Network(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<dto::SearchResponse>()
            .await
            .map_err(|e| UpstreamError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_from_default_config() {
        let client = MusicBrainzClient::new(&UpstreamConfig::default()).unwrap();
        assert_eq!(client.base_url, "https://musicbrainz.org/ws/2");
    }

    #[test]
    fn test_client_with_custom_url() {
        let config = UpstreamConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        };
        let client = MusicBrainzClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_search_url_encodes_query() {
        let client = MusicBrainzClient::new(&UpstreamConfig::default()).unwrap();
        let url = client.search_url("AC/DC & friends", 25);
        assert_eq!(
            url,
            "https://musicbrainz.org/ws/2/recording?query=AC%2FDC%20%26%20friends&limit=25&fmt=json"
        );
    }

    #[test]
    fn test_user_agent_format() {
        assert!(USER_AGENT.starts_with("Songbook/"));
    }
}
