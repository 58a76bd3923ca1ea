//! Web research collaborator
//!
//! The analyzer never talks to a search API directly. The model calls the
//! `web_search` tool, which forwards to a [`ResearchProvider`].

mod tavily;
mod tool;

pub use tavily::TavilyClient;
pub use tool::WebSearchTool;

use analyst_core::FailureKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How thoroughly the search API should look
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    /// Fast, fewer sources
    Basic,
    /// Slower, more sources and better snippets
    #[default]
    Advanced,
}

impl SearchDepth {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for SearchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!(
                "unknown search depth '{other}' (expected basic or advanced)"
            )),
        }
    }
}

/// One search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text query
    pub query: String,
    /// Upper bound on returned results
    pub max_results: usize,
    /// Search depth
    pub depth: SearchDepth,
}

impl SearchQuery {
    /// Query with default depth and result count
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: 10,
            depth: SearchDepth::default(),
        }
    }

    /// Set the result count
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the depth
    pub fn with_depth(mut self, depth: SearchDepth) -> Self {
        self.depth = depth;
        self
    }
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title
    pub title: String,
    /// Page URL
    pub url: String,
    /// Extracted content
    pub snippet: String,
    /// Publication date as reported by the search API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    /// Relevance score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Research failures
#[derive(Debug, Error)]
pub enum ResearchError {
    /// No API key configured
    #[error("search API key is not configured")]
    MissingApiKey,

    /// Transport failure
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("search API returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Rejected before sending
    #[error("invalid search query: {0}")]
    InvalidQuery(String),

    /// Response body did not match the expected shape
    #[error("could not decode search response: {0}")]
    Decode(String),
}

impl ResearchError {
    /// Classification shared with the rest of the pipeline
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingApiKey => FailureKind::Authentication,
            Self::Http(e) if e.is_timeout() => FailureKind::Timeout,
            Self::Http(e) if e.is_decode() => FailureKind::MalformedResponse,
            Self::Http(e) if e.is_builder() => FailureKind::InvalidRequest,
            Self::Http(e) => e
                .status()
                .map_or(FailureKind::Network, |s| FailureKind::from_status(s.as_u16())),
            Self::Status { status, .. } => FailureKind::from_status(*status),
            Self::InvalidQuery(_) => FailureKind::InvalidRequest,
            Self::Decode(_) => FailureKind::MalformedResponse,
        }
    }
}

impl From<ResearchError> for analyst_core::Error {
    fn from(err: ResearchError) -> Self {
        Self::upstream(err.kind(), err.to_string())
    }
}

/// A web search backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Run one search
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, ResearchError>;
}
