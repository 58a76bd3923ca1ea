//! Configuration for stock analysis
//!
//! Read once at startup, then shared behind an `Arc` and never mutated.

use crate::error::{AnalysisError, Result};
use crate::research::SearchDepth;
use analyst_llm::providers::OpenAIConfig;
use analyst_runtime::RuntimeConfig;
use analyst_utils::{EnvError, EnvSource, LogFormat, LogSettings};
use std::fmt;
use std::time::Duration;

const DEFAULT_TAVILY_BASE_URL: &str = "https://api.tavily.com";
const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Web research settings
#[derive(Clone)]
pub struct ResearchSettings {
    /// Tavily API key
    pub api_key: Option<String>,
    /// Tavily endpoint
    pub base_url: String,
    /// Results per search
    pub max_results: usize,
    /// Search depth
    pub search_depth: SearchDepth,
    /// Search requests allowed per minute
    pub requests_per_minute: u32,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_TAVILY_BASE_URL.to_string(),
            max_results: 10,
            search_depth: SearchDepth::Advanced,
            requests_per_minute: 60,
        }
    }
}

impl fmt::Debug for ResearchSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResearchSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("max_results", &self.max_results)
            .field("search_depth", &self.search_depth)
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}

/// Model provider settings
#[derive(Clone)]
pub struct ModelSettings {
    /// Model identifier
    pub model: String,
    /// Sampling temperature, 0 to 2
    pub temperature: f32,
    /// Max tokens per completion
    pub max_tokens: usize,
    /// Max model calls per stage
    pub max_iterations: usize,
    /// Provider API key
    pub api_key: Option<String>,
    /// Provider base URL
    pub api_base: String,
    /// Whether the credentials point at a LiteLLM proxy
    pub via_proxy: bool,
    /// HTTP timeout of each provider request
    pub request_timeout: Duration,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4.1".to_string(),
            temperature: 0.1,
            max_tokens: 4096,
            max_iterations: 10,
            api_key: None,
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            via_proxy: false,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSettings")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_iterations", &self.max_iterations)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("via_proxy", &self.via_proxy)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    /// Deadline for each model stage, tool calls included
    pub stage_timeout: Duration,
    /// Symbols analyzed at once by the portfolio fan-out
    pub portfolio_concurrency: usize,
    /// Stop before the recommendation when research found nothing
    pub require_evidence: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(300),
            portfolio_concurrency: 1,
            require_evidence: true,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default)]
pub struct StockConfig {
    /// Web research
    pub research: ResearchSettings,
    /// Model provider
    pub model: ModelSettings,
    /// Pipeline
    pub analysis: AnalysisSettings,
    /// Logging
    pub logging: LogSettings,
}

impl StockConfig {
    /// Create a new configuration builder
    pub fn builder() -> StockConfigBuilder {
        StockConfigBuilder::default()
    }

    /// Read the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_source(&EnvSource::process())
    }

    /// Read variables from `lookup` instead of the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_source(&EnvSource::new(lookup))
    }

    fn from_source<F>(env: &EnvSource<F>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::read(env).map_err(|e| AnalysisError::Config(e.to_string()))
    }

    fn read<F>(env: &EnvSource<F>) -> std::result::Result<Self, EnvError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let research = ResearchSettings {
            api_key: env.var("TAVILY_API_KEY"),
            base_url: env
                .var("TAVILY_BASE_URL")
                .unwrap_or(defaults.research.base_url),
            max_results: env.parse_or("TAVILY_MAX_RESULTS", defaults.research.max_results)?,
            search_depth: env.parse_or("TAVILY_SEARCH_DEPTH", defaults.research.search_depth)?,
            requests_per_minute: env
                .parse_or("TAVILY_RATE_LIMIT", defaults.research.requests_per_minute)?,
        };

        // A LiteLLM proxy wins over direct OpenAI access.
        let (api_key, api_base, via_proxy) =
            match (env.var("LITELLM_BASE_URL"), env.var("LITELLM_API_KEY")) {
                (Some(base), Some(key)) => (Some(key), base, true),
                _ => (
                    env.var("OPENAI_API_KEY"),
                    env.var("OPENAI_API_BASE")
                        .unwrap_or(defaults.model.api_base),
                    false,
                ),
            };

        let model = ModelSettings {
            model: env.var("AGENT_MODEL").unwrap_or(defaults.model.model),
            temperature: env.parse_or("AGENT_TEMPERATURE", defaults.model.temperature)?,
            max_tokens: env.parse_or("AGENT_MAX_TOKENS", defaults.model.max_tokens)?,
            max_iterations: env.parse_or("AGENT_MAX_ITERATIONS", defaults.model.max_iterations)?,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            via_proxy,
            request_timeout: Duration::from_secs(
                env.parse_or("REQUEST_TIMEOUT_SECS", defaults.model.request_timeout.as_secs())?,
            ),
        };

        let analysis = AnalysisSettings {
            stage_timeout: Duration::from_secs(
                env.parse_or("STAGE_TIMEOUT_SECS", defaults.analysis.stage_timeout.as_secs())?,
            ),
            portfolio_concurrency: env
                .parse_or("PORTFOLIO_CONCURRENCY", defaults.analysis.portfolio_concurrency)?,
            require_evidence: env.flag("REQUIRE_EVIDENCE", defaults.analysis.require_evidence)?,
        };

        let logging = LogSettings {
            level: env.var("LOG_LEVEL").unwrap_or(defaults.logging.level),
            format: env.parse_or::<LogFormat>("LOG_FORMAT", defaults.logging.format)?,
            debug: env.flag("DEBUG", defaults.logging.debug)?,
        };

        Ok(Self {
            research,
            model,
            analysis,
            logging,
        })
    }

    /// Every problem with the configuration, empty when it is usable
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.research.api_key.is_none() {
            issues.push("TAVILY_API_KEY is required for web research".to_string());
        }
        if !(1..=20).contains(&self.research.max_results) {
            issues.push(format!(
                "TAVILY_MAX_RESULTS must be between 1 and 20, got {}",
                self.research.max_results
            ));
        }
        if self.research.requests_per_minute == 0 {
            issues.push("TAVILY_RATE_LIMIT must be at least 1".to_string());
        }
        if self.model.api_key.is_none() {
            issues.push(
                "no model credentials: set LITELLM_BASE_URL and LITELLM_API_KEY, or OPENAI_API_KEY"
                    .to_string(),
            );
        }
        if self.model.model.trim().is_empty() {
            issues.push("AGENT_MODEL must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            issues.push(format!(
                "AGENT_TEMPERATURE must be between 0 and 2, got {}",
                self.model.temperature
            ));
        }
        if self.model.max_tokens == 0 {
            issues.push("AGENT_MAX_TOKENS must be at least 1".to_string());
        }
        if self.model.max_iterations == 0 {
            issues.push("AGENT_MAX_ITERATIONS must be at least 1".to_string());
        }
        if self.model.request_timeout.is_zero() {
            issues.push("REQUEST_TIMEOUT_SECS must be at least 1".to_string());
        }
        if self.analysis.stage_timeout.is_zero() {
            issues.push("STAGE_TIMEOUT_SECS must be at least 1".to_string());
        }
        if self.analysis.portfolio_concurrency == 0 {
            issues.push("PORTFOLIO_CONCURRENCY must be at least 1".to_string());
        }

        issues
    }

    /// Fail with all issues at once
    pub fn validate(&self) -> Result<()> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(AnalysisError::Config(issues.join("; ")))
        }
    }

    /// Provider configuration for the model settings
    pub fn provider_config(&self) -> Result<OpenAIConfig> {
        let key = self.model.api_key.clone().ok_or_else(|| {
            AnalysisError::Config("no model credentials configured".to_string())
        })?;
        Ok(OpenAIConfig::new(key)
            .with_api_base(&self.model.api_base)
            .with_timeout(self.model.request_timeout.as_secs()))
    }

    /// Executor defaults for the model settings
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            model: self.model.model.clone(),
            max_iterations: self.model.max_iterations,
            max_tokens: self.model.max_tokens,
            temperature: self.model.temperature,
            call_timeout: Some(self.model.request_timeout),
            log_transcript: self.logging.debug,
        }
    }
}

/// Builder for StockConfig
#[derive(Debug, Default)]
pub struct StockConfigBuilder {
    tavily_api_key: Option<String>,
    max_results: Option<usize>,
    search_depth: Option<SearchDepth>,
    model: Option<String>,
    temperature: Option<f32>,
    model_api_key: Option<String>,
    model_api_base: Option<String>,
    stage_timeout: Option<Duration>,
    portfolio_concurrency: Option<usize>,
    require_evidence: Option<bool>,
    debug: Option<bool>,
}

impl StockConfigBuilder {
    /// Set the Tavily API key
    pub fn tavily_api_key(mut self, key: impl Into<String>) -> Self {
        self.tavily_api_key = Some(key.into());
        self
    }

    /// Set results per search
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Set the search depth
    pub fn search_depth(mut self, depth: SearchDepth) -> Self {
        self.search_depth = Some(depth);
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the provider API key
    pub fn model_api_key(mut self, key: impl Into<String>) -> Self {
        self.model_api_key = Some(key.into());
        self
    }

    /// Set the provider base URL
    pub fn model_api_base(mut self, base: impl Into<String>) -> Self {
        self.model_api_base = Some(base.into());
        self
    }

    /// Set the per-stage deadline
    pub fn stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    /// Set the portfolio concurrency
    pub fn portfolio_concurrency(mut self, concurrency: usize) -> Self {
        self.portfolio_concurrency = Some(concurrency);
        self
    }

    /// Require research evidence before recommending
    pub fn require_evidence(mut self, required: bool) -> Self {
        self.require_evidence = Some(required);
        self
    }

    /// Enable debug mode
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<StockConfig> {
        let mut config = StockConfig::default();

        config.research.api_key = self.tavily_api_key;
        if let Some(max_results) = self.max_results {
            config.research.max_results = max_results;
        }
        if let Some(depth) = self.search_depth {
            config.research.search_depth = depth;
        }
        if let Some(model) = self.model {
            config.model.model = model;
        }
        if let Some(temperature) = self.temperature {
            config.model.temperature = temperature;
        }
        config.model.api_key = self.model_api_key;
        if let Some(base) = self.model_api_base {
            config.model.api_base = base;
        }
        if let Some(timeout) = self.stage_timeout {
            config.analysis.stage_timeout = timeout;
        }
        if let Some(concurrency) = self.portfolio_concurrency {
            config.analysis.portfolio_concurrency = concurrency;
        }
        if let Some(required) = self.require_evidence {
            config.analysis.require_evidence = required;
        }
        if let Some(debug) = self.debug {
            config.logging.debug = debug;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_from_minimal_env() {
        let config = StockConfig::from_lookup(lookup(&[
            ("TAVILY_API_KEY", "tvly-test"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();

        assert_eq!(config.research.max_results, 10);
        assert_eq!(config.research.search_depth, SearchDepth::Advanced);
        assert_eq!(config.model.model, "gpt-4.1");
        assert!((config.model.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.analysis.stage_timeout, Duration::from_secs(300));
        assert_eq!(config.analysis.portfolio_concurrency, 1);
        assert!(config.analysis.require_evidence);
        assert!(!config.model.via_proxy);
        assert!(config.issues().is_empty());
    }

    #[test]
    fn test_overrides_and_proxy() {
        let config = StockConfig::from_lookup(lookup(&[
            ("TAVILY_API_KEY", "tvly-test"),
            ("TAVILY_SEARCH_DEPTH", "basic"),
            ("LITELLM_BASE_URL", "http://localhost:4000/"),
            ("LITELLM_API_KEY", "sk-proxy"),
            ("OPENAI_API_KEY", "sk-direct"),
            ("AGENT_MODEL", "claude-sonnet"),
            ("PORTFOLIO_CONCURRENCY", "4"),
            ("REQUIRE_EVIDENCE", "false"),
            ("DEBUG", "true"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.research.search_depth, SearchDepth::Basic);
        assert!(config.model.via_proxy);
        assert_eq!(config.model.api_base, "http://localhost:4000");
        assert_eq!(config.model.api_key.as_deref(), Some("sk-proxy"));
        assert_eq!(config.analysis.portfolio_concurrency, 4);
        assert!(!config.analysis.require_evidence);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.runtime_config().log_transcript);

        let provider = config.provider_config().unwrap();
        assert_eq!(provider.api_base, "http://localhost:4000");
    }

    #[test]
    fn test_unparsable_value_names_variable() {
        let err = StockConfig::from_lookup(lookup(&[("TAVILY_MAX_RESULTS", "lots")])).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(ref m) if m.contains("TAVILY_MAX_RESULTS")));
    }

    #[test]
    fn test_issues_are_collected() {
        let config = StockConfig {
            model: ModelSettings {
                temperature: 3.0,
                ..ModelSettings::default()
            },
            ..StockConfig::default()
        };
        let issues = config.issues();
        assert_eq!(issues.len(), 3, "{issues:?}");
        assert!(issues.iter().any(|i| i.contains("TAVILY_API_KEY")));
        assert!(issues.iter().any(|i| i.contains("AGENT_TEMPERATURE")));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let config = StockConfig::builder()
            .tavily_api_key("tvly")
            .model_api_key("sk")
            .model("gpt-4.1-mini")
            .portfolio_concurrency(3)
            .stage_timeout(Duration::from_secs(30))
            .build()
            .unwrap();
        assert_eq!(config.model.model, "gpt-4.1-mini");
        assert_eq!(config.analysis.stage_timeout, Duration::from_secs(30));

        assert!(StockConfig::builder().model_api_key("sk").build().is_err());
    }

    #[test]
    fn test_debug_hides_keys() {
        let config = StockConfig::builder()
            .tavily_api_key("tvly-secret")
            .model_api_key("sk-secret")
            .build()
            .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
    }
}
