//! Facade wiring configuration, collaborators and pipelines

use crate::analyzer::StockAnalyzer;
use crate::config::StockConfig;
use crate::delegation::{FinancialAssistant, ReportService, StockReportAgent};
use crate::error::{AnalysisError, Result};
use crate::model::{StockReport, StockSymbol};
use crate::portfolio::{PortfolioEntry, analyze_all};
use crate::prompts::Prompts;
use crate::recommender::Recommender;
use crate::research::{ResearchProvider, TavilyClient, WebSearchTool};
use crate::runner::{ExecutorModelRunner, ModelRunner};
use crate::workflow::StockReportWorkflow;
use analyst_llm::providers::OpenAIProvider;
use analyst_runtime::AgentRuntime;
use analyst_tools::{Tool, ToolRegistry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// How model calls are composed into a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Analysis, then a separate recommendation call, merged
    #[default]
    Workflow,
    /// One research run producing the whole report
    SingleStage,
}

impl AnalysisMode {
    /// Short name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Workflow => "workflow",
            Self::SingleStage => "single",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "workflow" | "two_stage" => Ok(Self::Workflow),
            "single" | "single_stage" => Ok(Self::SingleStage),
            other => Err(format!(
                "unknown analysis mode '{other}' (expected workflow or single)"
            )),
        }
    }
}

/// Stock analyst: every way of producing a report, behind one type
///
/// ```no_run
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// use analyst_stock::{StockAnalyst, StockConfig};
///
/// let analyst = StockAnalyst::from_config(StockConfig::from_env()?)?;
/// let report = analyst.analyze("AAPL").await?;
/// println!("{}", report.investment_recommendation().recommendation());
/// # Ok(())
/// # }
/// ```
pub struct StockAnalyst {
    config: Arc<StockConfig>,
    runtime: Arc<AgentRuntime>,
    web_search: Arc<dyn Tool>,
    analyzer: Arc<StockAnalyzer>,
    workflow: StockReportWorkflow,
}

impl StockAnalyst {
    /// Build the production stack: OpenAI-compatible model and Tavily
    pub fn from_config(config: StockConfig) -> Result<Self> {
        config.validate()?;

        let provider = OpenAIProvider::with_config(config.provider_config()?)
            .map_err(|e| AnalysisError::Config(format!("model provider: {e}")))?;
        let research = TavilyClient::new(&config.research, config.model.request_timeout)
            .map_err(|e| AnalysisError::Config(format!("research client: {e}")))?;
        let runtime = Arc::new(AgentRuntime::new(Arc::new(provider), config.runtime_config()));

        info!(
            model = %config.model.model,
            proxy = config.model.via_proxy,
            search_depth = %config.research.search_depth,
            "stock analyst ready"
        );
        let runner = Arc::new(ExecutorModelRunner::new(runtime.clone()));
        Self::from_parts(config, runtime, runner, Arc::new(research))
    }

    /// Build over explicit collaborators
    ///
    /// `runner` serves the report stages; `runtime` serves the assistant.
    pub fn from_parts(
        config: StockConfig,
        runtime: Arc<AgentRuntime>,
        runner: Arc<dyn ModelRunner>,
        research: Arc<dyn ResearchProvider>,
    ) -> Result<Self> {
        let prompts = Arc::new(Prompts::new()?);
        let web_search: Arc<dyn Tool> = Arc::new(WebSearchTool::new(
            research,
            config.research.max_results,
            config.research.search_depth,
        ));
        let research_tools = Arc::new(ToolRegistry::builder().tool(web_search.clone()).build());
        let timeout = config.analysis.stage_timeout;

        let analyzer = Arc::new(StockAnalyzer::new(
            runner.clone(),
            research_tools,
            prompts.clone(),
            timeout,
        ));
        let recommender = Arc::new(Recommender::new(runner, prompts, timeout));
        let workflow = StockReportWorkflow::new(
            analyzer.clone(),
            recommender,
            config.analysis.require_evidence,
        );

        Ok(Self {
            config: Arc::new(config),
            runtime,
            web_search,
            analyzer,
            workflow,
        })
    }

    /// Configuration in effect
    pub fn config(&self) -> &StockConfig {
        &self.config
    }

    /// Report in the default (workflow) mode
    pub async fn analyze(&self, symbol: &str) -> Result<StockReport> {
        self.analyze_with(symbol, AnalysisMode::default()).await
    }

    /// Report in the given mode
    pub async fn analyze_with(&self, symbol: &str, mode: AnalysisMode) -> Result<StockReport> {
        let parsed = StockSymbol::parse(symbol).map_err(|e| AnalysisError::InvalidSymbol {
            input: symbol.to_string(),
            reason: e.reason,
        })?;
        self.analyze_symbol(parsed, mode).await
    }

    async fn analyze_symbol(&self, symbol: StockSymbol, mode: AnalysisMode) -> Result<StockReport> {
        info!(%symbol, %mode, "analysis requested");
        match mode {
            AnalysisMode::Workflow => self.workflow.run(&symbol).await,
            AnalysisMode::SingleStage => self.analyzer.analyze_full(&symbol).await,
        }
    }

    /// Report for every symbol, in input order
    pub async fn analyze_portfolio<I, S>(&self, symbols: I, mode: AnalysisMode) -> Vec<PortfolioEntry>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        analyze_all(symbols, self.config.analysis.portfolio_concurrency, |symbol| {
            self.analyze_symbol(symbol, mode)
        })
        .await
    }

    /// Assistant with web search and this analyst as its report tool
    pub fn assistant(self: &Arc<Self>) -> Result<FinancialAssistant> {
        FinancialAssistant::new(&self.runtime, self.web_search.clone(), self.clone())
            .map_err(|e| AnalysisError::Config(e.to_string()))
    }

    /// This analyst as an [`Agent`](analyst_core::Agent)
    pub fn report_agent(self: &Arc<Self>) -> StockReportAgent {
        StockReportAgent::new(self.clone())
    }
}

#[async_trait]
impl ReportService for StockAnalyst {
    async fn report(&self, symbol: &str, mode: Option<AnalysisMode>) -> Result<StockReport> {
        self.analyze_with(symbol, mode.unwrap_or_default()).await
    }
}
