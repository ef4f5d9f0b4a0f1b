//! Incident feed fetcher.
//!
//! Issues one bounded search request per run and returns the `hits` array.
//! There is no pagination and no retry: a region query asks for at most
//! `limit` incidents and anything past that is left for the next run.

use std::time::Duration;

use blotter_source_models::RawIncident;
use serde_json::Value;

use crate::region::RegionQuery;
use crate::{FeedError, IncidentBatch};

/// Search endpoint of the public incident feed.
pub const DEFAULT_FEED_URL: &str = "https://citizen.com/api/incident/search";

/// Per-request timeout applied when the caller does not choose one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum length of the response body preview included in errors.
const BODY_PREVIEW_LEN: usize = 500;

/// Top-level response field holding the incident array.
const HITS_FIELD: &str = "hits";

/// HTTP client for the incident feed's search endpoint.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    base_url: String,
}

impl FeedClient {
    /// Creates a client for `base_url` whose requests give up after
    /// `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Request`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("blotter/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Creates a client for `base_url` that sends requests through an
    /// already-configured [`reqwest::Client`].
    #[must_use]
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.to_owned(),
        }
    }

    /// Returns the full request URL for `query`.
    #[must_use]
    pub fn url_for(&self, query: &RegionQuery) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{}", self.base_url, query.query_string())
    }

    /// Fetches the incidents inside the query's bounding box.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Request`] or [`FeedError::Status`] if the feed
    /// cannot be reached or rejects the request, and a parse variant if the
    /// body is not a search result (see [`parse_hits`]).
    pub async fn fetch(&self, query: &RegionQuery) -> Result<IncidentBatch, FeedError> {
        let url = self.url_for(query);
        log::info!("[{}] Fetching incidents: {url}", query.region);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                status: status.as_u16(),
                url,
                body: preview(&body),
            });
        }

        let body = response.text().await?;
        let mut hits = parse_hits(&body)?;

        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        if hits.len() > limit {
            log::warn!(
                "[{}] Feed returned {} incidents for limit {limit}, truncating",
                query.region,
                hits.len()
            );
            hits.truncate(limit);
        }

        log::info!("[{}] Fetched {} incidents", query.region, hits.len());
        Ok(hits)
    }
}

/// Extracts the `hits` array from a feed response body.
///
/// # Errors
///
/// Returns [`FeedError::Parse`] if the body is not JSON,
/// [`FeedError::MissingHits`] if there is no top-level `hits` array, and
/// [`FeedError::MalformedHit`] if an element is not an object.
pub fn parse_hits(body: &str) -> Result<IncidentBatch, FeedError> {
    let mut json: Value = serde_json::from_str(body)?;

    let Some(Value::Array(hits)) = json.get_mut(HITS_FIELD).map(Value::take) else {
        return Err(FeedError::MissingHits);
    };

    hits.into_iter()
        .enumerate()
        .map(|(index, hit)| {
            RawIncident::try_from(hit).map_err(|_| FeedError::MalformedHit { index })
        })
        .collect()
}

fn preview(body: &str) -> String {
    if body.chars().count() > BODY_PREVIEW_LEN {
        format!("{}...", body.chars().take(BODY_PREVIEW_LEN).collect::<String>())
    } else {
        body.to_owned()
    }
}
