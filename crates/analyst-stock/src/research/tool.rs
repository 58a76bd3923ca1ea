//! `web_search` tool binding

use super::{ResearchProvider, SearchDepth, SearchQuery};
use analyst_core::{Error, Result};
use analyst_llm::tools::schema;
use analyst_tools::Tool;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

const MAX_RESULTS_CAP: usize = 20;

/// Exposes a [`ResearchProvider`] to the model
pub struct WebSearchTool {
    provider: Arc<dyn ResearchProvider>,
    default_max_results: usize,
    default_depth: SearchDepth,
}

impl WebSearchTool {
    /// Tool name the model calls
    pub const NAME: &'static str = "web_search";

    /// Wrap a provider with the configured defaults
    pub fn new(
        provider: Arc<dyn ResearchProvider>,
        default_max_results: usize,
        default_depth: SearchDepth,
    ) -> Self {
        Self {
            provider,
            default_max_results: default_max_results.clamp(1, MAX_RESULTS_CAP),
            default_depth,
        }
    }

    fn query_from(&self, params: &Value) -> Result<SearchQuery> {
        let query = params
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| Error::ToolFailed {
                name: Self::NAME.to_string(),
                message: "missing required string argument 'query'".to_string(),
            })?;

        let max_results = params
            .get("max_results")
            .and_then(Value::as_u64)
            .map_or(self.default_max_results, |n| {
                usize::try_from(n).unwrap_or(MAX_RESULTS_CAP).clamp(1, MAX_RESULTS_CAP)
            });

        let depth = match params.get("search_depth").and_then(Value::as_str) {
            Some(raw) => raw.parse().map_err(|message| Error::ToolFailed {
                name: Self::NAME.to_string(),
                message,
            })?,
            None => self.default_depth,
        };

        Ok(SearchQuery {
            query: query.to_string(),
            max_results,
            depth,
        })
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let query = self.query_from(&params)?;

        let results = self.provider.search(&query).await.map_err(|e| {
            warn!(query = %query.query, kind = %e.kind(), error = %e, "web search failed");
            Error::from(e)
        })?;

        debug!(query = %query.query, results = results.len(), "web search returned");
        Ok(json!({
            "query": query.query,
            "results": results,
        }))
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Search the web for current information about companies, stock prices, \
         financial metrics, market news and analyst opinions. Returns titles, \
         URLs, content snippets and publication dates."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "query": schema::string("Search query, e.g. 'AAPL stock price today'"),
                "max_results": schema::integer("Maximum number of results (1-20)"),
                "search_depth": schema::string_enum("Search depth", &["basic", "advanced"]),
            }),
            &["query"],
        )
    }
}
