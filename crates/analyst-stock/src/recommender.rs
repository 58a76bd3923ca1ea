//! Recommendation stage of the workflow

use crate::error::{AnalysisError, Result, Stage};
use crate::model::{InvestmentRecommendation, PartialStockReport};
use crate::parse::parse_recommendation;
use crate::prompts::{self, Prompts};
use crate::runner::{ModelRequest, ModelRunner, run_stage};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Turns a finished analysis into a recommendation
///
/// Sees only the analysis; no tools are bound.
pub struct Recommender {
    runner: Arc<dyn ModelRunner>,
    prompts: Arc<Prompts>,
    stage_timeout: Duration,
}

impl Recommender {
    /// Create a recommender
    pub fn new(runner: Arc<dyn ModelRunner>, prompts: Arc<Prompts>, stage_timeout: Duration) -> Self {
        Self {
            runner,
            prompts,
            stage_timeout,
        }
    }

    /// Recommend buy, hold or sell for an analyzed stock
    #[instrument(skip_all, fields(symbol = %partial.symbol()))]
    pub async fn recommend(&self, partial: &PartialStockReport) -> Result<InvestmentRecommendation> {
        let symbol = partial.symbol();
        let request = ModelRequest {
            stage: Stage::Recommendation,
            instructions: prompts::recommendation_instructions(),
            input: self.prompts.recommendation_request(partial)?,
            tools: None,
            json_output: true,
        };

        let reply = run_stage(self.runner.as_ref(), request, symbol.ticker(), self.stage_timeout)
            .await
            .map_err(|e| match e {
                AnalysisError::UpstreamCall {
                    symbol,
                    kind,
                    message,
                    ..
                } => AnalysisError::Recommendation {
                    symbol,
                    kind,
                    message,
                },
                other => other,
            })?;

        let recommendation = parse_recommendation(symbol, &reply.text)?;
        info!(
            recommendation = %recommendation.recommendation(),
            confidence = recommendation.confidence(),
            "recommendation parsed"
        );
        Ok(recommendation)
    }
}
