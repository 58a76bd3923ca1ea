//! Tavily search API client

use super::{ResearchError, ResearchProvider, SearchQuery, SearchResult};
use crate::config::ResearchSettings;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    search_depth: &'static str,
    max_results: usize,
    include_answer: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Debug, Deserialize)]
struct TavilyHit {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    published_date: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

impl From<TavilyHit> for SearchResult {
    fn from(hit: TavilyHit) -> Self {
        Self {
            title: hit.title,
            url: hit.url,
            snippet: hit.content,
            published_date: hit.published_date,
            score: hit.score,
        }
    }
}

fn decode(body: &str) -> Result<Vec<SearchResult>, ResearchError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| ResearchError::Decode(e.to_string()))?;
    Ok(response.results.into_iter().map(SearchResult::from).collect())
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body
}

/// Tavily client with per-minute rate limiting
#[derive(Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl fmt::Debug for TavilyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TavilyClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TavilyClient {
    /// Create a client from the research settings
    ///
    /// `timeout` bounds every HTTP request.
    pub fn new(settings: &ResearchSettings, timeout: Duration) -> Result<Self, ResearchError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or(ResearchError::MissingApiKey)?;

        let per_minute = NonZeroU32::new(settings.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            rate_limiter,
        })
    }
}

#[async_trait]
impl ResearchProvider for TavilyClient {
    #[instrument(skip(self), fields(query = %query.query, depth = %query.depth))]
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, ResearchError> {
        if query.query.trim().is_empty() {
            return Err(ResearchError::InvalidQuery("query is empty".to_string()));
        }

        self.rate_limiter.until_ready().await;

        let body = SearchRequest {
            query: query.query.trim(),
            search_depth: query.depth.as_str(),
            max_results: query.max_results,
            include_answer: false,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Tavily search failed");
            return Err(ResearchError::Status {
                status: status.as_u16(),
                body: truncate(text),
            });
        }

        let results = decode(&text)?;
        debug!(results = results.len(), "Tavily search finished");
        Ok(results)
    }
}
