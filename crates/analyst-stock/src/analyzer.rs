//! Single-stage analyzer
//!
//! One model run with the research tool bound. Produces either the partial
//! report (first step of the workflow) or a whole report including the
//! recommendation.

use crate::error::{Result, Stage};
use crate::model::{PartialStockReport, StockReport, StockSymbol};
use crate::parse::{parse_full, parse_partial};
use crate::prompts::{self, Prompts};
use crate::runner::{ModelRequest, ModelRunner, run_stage};
use analyst_tools::ToolRegistry;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Researches a stock and structures the findings
pub struct StockAnalyzer {
    runner: Arc<dyn ModelRunner>,
    research: Arc<ToolRegistry>,
    prompts: Arc<Prompts>,
    stage_timeout: Duration,
}

impl StockAnalyzer {
    /// Create an analyzer
    ///
    /// `research` holds the tools the model may use while researching.
    pub fn new(
        runner: Arc<dyn ModelRunner>,
        research: Arc<ToolRegistry>,
        prompts: Arc<Prompts>,
        stage_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            research,
            prompts,
            stage_timeout,
        }
    }

    fn request(&self, symbol: &StockSymbol, instructions: String) -> Result<ModelRequest> {
        let input = self
            .prompts
            .analysis_request(symbol, Utc::now().date_naive())?;
        Ok(ModelRequest {
            stage: Stage::Analysis,
            instructions,
            input,
            tools: Some(self.research.clone()),
            json_output: true,
        })
    }

    /// Everything except the recommendation
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn analyze_partial(&self, symbol: &StockSymbol) -> Result<PartialStockReport> {
        let request = self.request(symbol, prompts::analysis_instructions())?;
        let reply = run_stage(self.runner.as_ref(), request, symbol.ticker(), self.stage_timeout).await?;

        let partial = parse_partial(symbol, &reply.text)?;
        info!(
            news = partial.recent_news().len(),
            sentiment = %partial.market_sentiment().overall_sentiment(),
            risk = %partial.risk_assessment().risk_level(),
            "analysis parsed"
        );
        Ok(partial)
    }

    /// Whole report from a single model run
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn analyze_full(&self, symbol: &StockSymbol) -> Result<StockReport> {
        let request = self.request(symbol, prompts::full_report_instructions())?;
        let reply = run_stage(self.runner.as_ref(), request, symbol.ticker(), self.stage_timeout).await?;

        let report = parse_full(symbol, &reply.text, Utc::now())?;
        info!(
            recommendation = %report.investment_recommendation().recommendation(),
            confidence = report.investment_recommendation().confidence(),
            "report parsed"
        );
        Ok(report)
    }
}
