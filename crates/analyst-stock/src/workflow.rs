//! Two-stage report workflow
//!
//! Step 1 researches and structures the stock, step 2 recommends from the
//! structured analysis alone, and the halves are merged into one report.
//! Stages run strictly in order and a failure in either is final.

use crate::analyzer::StockAnalyzer;
use crate::error::{AnalysisError, Result};
use crate::model::{StockReport, StockSymbol};
use crate::recommender::Recommender;
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Where a workflow run is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Not started
    Pending,
    /// Step 1 running
    Analyzing,
    /// Step 1 failed or found too little; final
    AnalysisFailed,
    /// Step 1 produced a usable analysis
    Analyzed,
    /// Step 2 running
    Recommending,
    /// Step 2 failed; final
    RecommendationFailed,
    /// Report merged; final
    Composed,
}

/// Something that happened during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// Step 1 started
    Start,
    /// Step 1 returned a usable analysis
    AnalysisSucceeded,
    /// Step 1 failed
    AnalysisFailed,
    /// Step 2 started
    RecommendationStarted,
    /// Step 2 returned a recommendation and the report was merged
    Composed,
    /// Step 2 failed
    RecommendationFailed,
}

impl WorkflowState {
    /// Next state, or `None` if `event` cannot happen in this state
    pub fn advance(self, event: WorkflowEvent) -> Option<Self> {
        use WorkflowEvent as E;
        match (self, event) {
            (Self::Pending, E::Start) => Some(Self::Analyzing),
            (Self::Analyzing, E::AnalysisSucceeded) => Some(Self::Analyzed),
            (Self::Analyzing, E::AnalysisFailed) => Some(Self::AnalysisFailed),
            (Self::Analyzed, E::RecommendationStarted) => Some(Self::Recommending),
            (Self::Recommending, E::Composed) => Some(Self::Composed),
            (Self::Recommending, E::RecommendationFailed) => Some(Self::RecommendationFailed),
            _ => None,
        }
    }

    /// No further transitions
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::AnalysisFailed | Self::RecommendationFailed | Self::Composed
        )
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Analyzing => "analyzing",
            Self::AnalysisFailed => "analysis_failed",
            Self::Analyzed => "analyzed",
            Self::Recommending => "recommending",
            Self::RecommendationFailed => "recommendation_failed",
            Self::Composed => "composed",
        };
        f.write_str(name)
    }
}

/// States one run passed through
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowRun {
    symbol: String,
    trail: Vec<WorkflowState>,
}

impl WorkflowRun {
    fn new(symbol: &StockSymbol) -> Self {
        Self {
            symbol: symbol.to_string(),
            trail: vec![WorkflowState::Pending],
        }
    }

    fn record(&mut self, event: WorkflowEvent) {
        let current = self.state();
        match current.advance(event) {
            Some(next) => {
                debug!(symbol = %self.symbol, from = %current, to = %next, "workflow transition");
                self.trail.push(next);
            }
            None => warn!(symbol = %self.symbol, state = %current, ?event, "ignored workflow event"),
        }
    }

    /// Current state
    pub fn state(&self) -> WorkflowState {
        self.trail.last().copied().unwrap_or(WorkflowState::Pending)
    }

    /// Every state in order, starting with `Pending`
    pub fn trail(&self) -> &[WorkflowState] {
        &self.trail
    }
}

/// Runs analysis then recommendation and merges the results
pub struct StockReportWorkflow {
    analyzer: Arc<StockAnalyzer>,
    recommender: Arc<Recommender>,
    require_evidence: bool,
}

impl StockReportWorkflow {
    /// Create a workflow
    ///
    /// With `require_evidence`, an analysis without any metric, news,
    /// sentiment factor or risk factor stops the run before step 2.
    pub fn new(
        analyzer: Arc<StockAnalyzer>,
        recommender: Arc<Recommender>,
        require_evidence: bool,
    ) -> Self {
        Self {
            analyzer,
            recommender,
            require_evidence,
        }
    }

    /// Produce a report
    pub async fn run(&self, symbol: &StockSymbol) -> Result<StockReport> {
        self.run_traced(symbol).await.1
    }

    /// Produce a report along with the states the run passed through
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn run_traced(&self, symbol: &StockSymbol) -> (WorkflowRun, Result<StockReport>) {
        let mut run = WorkflowRun::new(symbol);
        let result = self.drive(symbol, &mut run).await;

        match &result {
            Ok(report) => info!(
                recommendation = %report.investment_recommendation().recommendation(),
                state = %run.state(),
                "workflow finished"
            ),
            Err(e) => warn!(state = %run.state(), error = %e, "workflow failed"),
        }
        (run, result)
    }

    async fn drive(&self, symbol: &StockSymbol, run: &mut WorkflowRun) -> Result<StockReport> {
        run.record(WorkflowEvent::Start);
        let partial = match self.analyzer.analyze_partial(symbol).await {
            Ok(partial) if self.require_evidence && !partial.has_evidence() => {
                run.record(WorkflowEvent::AnalysisFailed);
                return Err(AnalysisError::InsufficientData {
                    symbol: symbol.to_string(),
                    reason: "research found no metrics, news, sentiment or risk factors"
                        .to_string(),
                });
            }
            Ok(partial) => partial,
            Err(e) => {
                run.record(WorkflowEvent::AnalysisFailed);
                return Err(e);
            }
        };
        run.record(WorkflowEvent::AnalysisSucceeded);

        run.record(WorkflowEvent::RecommendationStarted);
        let recommendation = match self.recommender.recommend(&partial).await {
            Ok(recommendation) => recommendation,
            Err(e) => {
                run.record(WorkflowEvent::RecommendationFailed);
                return Err(e);
            }
        };

        let report = StockReport::merge(partial, recommendation, Utc::now());
        run.record(WorkflowEvent::Composed);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::model::RecommendationTag;
    use crate::model::fixtures::{aapl_partial_json, aapl_recommendation_json};
    use crate::prompts::Prompts;
    use crate::runner::{MockModelRunner, ModelReply, ModelRequest, ModelRunner};
    use analyst_core::FailureKind;
    use analyst_tools::ToolRegistry;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use WorkflowState as S;

    fn workflow_with(runner: Arc<dyn ModelRunner>, timeout: Duration) -> StockReportWorkflow {
        let prompts = Arc::new(Prompts::new().unwrap());
        let analyzer = StockAnalyzer::new(
            runner.clone(),
            Arc::new(ToolRegistry::default()),
            prompts.clone(),
            timeout,
        );
        let recommender = Recommender::new(runner, prompts, timeout);
        StockReportWorkflow::new(Arc::new(analyzer), Arc::new(recommender), true)
    }

    fn workflow(runner: MockModelRunner) -> StockReportWorkflow {
        workflow_with(Arc::new(runner), Duration::from_secs(300))
    }

    fn aapl() -> StockSymbol {
        "AAPL".parse().unwrap()
    }

    fn expect_stage(runner: &mut MockModelRunner, stage: Stage, times: usize, text: String) {
        runner
            .expect_run()
            .withf(move |r| r.stage == stage)
            .times(times)
            .returning(move |_| Ok(ModelReply::text(text.clone())));
    }

    #[test]
    fn test_transitions() {
        assert_eq!(S::Pending.advance(WorkflowEvent::Start), Some(S::Analyzing));
        assert_eq!(S::Analyzing.advance(WorkflowEvent::AnalysisFailed), Some(S::AnalysisFailed));
        assert_eq!(S::Pending.advance(WorkflowEvent::Composed), None);
        assert_eq!(S::AnalysisFailed.advance(WorkflowEvent::RecommendationStarted), None);
        assert_eq!(S::Composed.advance(WorkflowEvent::Start), None);
        assert!(S::RecommendationFailed.is_terminal());
        assert!(!S::Analyzed.is_terminal());
    }

    #[tokio::test]
    async fn test_aapl_report_is_composed() {
        let mut runner = MockModelRunner::new();
        expect_stage(&mut runner, Stage::Analysis, 1, aapl_partial_json().to_string());
        expect_stage(&mut runner, Stage::Recommendation, 1, aapl_recommendation_json().to_string());

        let before = Utc::now();
        let (run, result) = workflow(runner).run_traced(&aapl()).await;
        let report = result.unwrap();

        let rec = report.investment_recommendation();
        assert_eq!(rec.recommendation(), RecommendationTag::Buy);
        assert_eq!(rec.confidence(), 0.85);
        assert_eq!(report.financial_metrics().current_price(), Some(185.92));
        assert_eq!(report.recent_news().len(), 2);
        assert!(report.analysis_timestamp() >= before);
        assert_eq!(
            run.trail(),
            &[S::Pending, S::Analyzing, S::Analyzed, S::Recommending, S::Composed]
        );

        // Merge kept every analysis field.
        let expected: crate::model::PartialStockReport =
            serde_json::from_value(aapl_partial_json()).unwrap();
        assert_eq!(report.partial(), &expected);
    }

    #[tokio::test]
    async fn test_step_one_failure_skips_step_two() {
        let mut runner = MockModelRunner::new();
        runner
            .expect_run()
            .withf(|r| r.stage == Stage::Analysis)
            .times(1)
            .returning(|_| Ok(ModelReply::text("I could not find that company.")));
        runner
            .expect_run()
            .withf(|r| r.stage == Stage::Recommendation)
            .times(0);

        let (run, result) = workflow(runner).run_traced(&aapl()).await;
        let err = result.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Analysis));
        assert!(matches!(err, AnalysisError::OutputValidation { .. }));
        assert_eq!(run.state(), S::AnalysisFailed);
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_is_rejected() {
        let mut rec = aapl_recommendation_json();
        rec["confidence"] = json!(1.5);

        let mut runner = MockModelRunner::new();
        expect_stage(&mut runner, Stage::Analysis, 1, aapl_partial_json().to_string());
        expect_stage(&mut runner, Stage::Recommendation, 1, rec.to_string());

        let (run, result) = workflow(runner).run_traced(&aapl()).await;
        match result.unwrap_err() {
            AnalysisError::OutputValidation {
                symbol,
                stage,
                field,
                ..
            } => {
                assert_eq!(symbol, "AAPL");
                assert_eq!(stage, Stage::Recommendation);
                assert_eq!(field, "confidence");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(run.state(), S::RecommendationFailed);
    }

    #[tokio::test]
    async fn test_no_evidence_stops_before_recommendation() {
        let empty = json!({
            "symbol": "ZZZZ",
            "company_info": {"name": "Unknown Corp"},
            "market_sentiment": {"overall_sentiment": "neutral", "confidence": 0.1},
            "risk_assessment": {"risk_level": "high"}
        });

        let mut runner = MockModelRunner::new();
        expect_stage(&mut runner, Stage::Analysis, 1, empty.to_string());
        runner
            .expect_run()
            .withf(|r| r.stage == Stage::Recommendation)
            .times(0);

        let err = workflow(runner)
            .run(&"ZZZZ".parse().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { ref symbol, .. } if symbol == "ZZZZ"));
    }

    /// Never answers the analysis stage
    struct StalledRunner {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelRunner for StalledRunner {
        async fn run(&self, request: ModelRequest) -> analyst_core::Result<ModelReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.stage, Stage::Analysis, "step 2 must not run");
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ModelReply::text("{}"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_one_timeout() {
        let runner = Arc::new(StalledRunner {
            calls: AtomicUsize::new(0),
        });
        let workflow = workflow_with(runner.clone(), Duration::from_secs(300));

        let (run, result) = workflow.run_traced(&aapl()).await;
        let err = result.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Analysis));
        assert_eq!(err.failure_kind(), Some(FailureKind::Timeout));
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(run.state(), S::AnalysisFailed);
    }
}
