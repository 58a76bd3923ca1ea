//! Portfolio fan-out
//!
//! Each symbol is analyzed independently. A failure is recorded in that
//! symbol's entry and never aborts the batch; entries come back in input
//! order whatever the concurrency.

use crate::error::{AnalysisError, Result};
use crate::model::{StockReport, StockSymbol};
use futures::stream::{self, StreamExt};
use std::future::Future;
use tracing::{info, warn};

/// Outcome for one requested symbol
#[derive(Debug)]
pub struct PortfolioEntry {
    /// Symbol as the caller wrote it
    pub input: String,
    /// Report, or why there is none
    pub result: Result<StockReport>,
}

impl PortfolioEntry {
    /// Whether a report was produced
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Analyze every symbol with at most `concurrency` analyses in flight
pub async fn analyze_all<I, S, F, Fut>(symbols: I, concurrency: usize, analyze: F) -> Vec<PortfolioEntry>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: Fn(StockSymbol) -> Fut,
    Fut: Future<Output = Result<StockReport>>,
{
    let inputs: Vec<String> = symbols.into_iter().map(Into::into).collect();
    let total = inputs.len();
    info!(total, concurrency, "portfolio analysis started");

    let entries: Vec<PortfolioEntry> = stream::iter(inputs)
        .map(|input| {
            let parsed = StockSymbol::parse(&input);
            let pending = parsed.map(&analyze);
            async move {
                let result = match pending {
                    Ok(fut) => fut.await,
                    Err(e) => Err(AnalysisError::InvalidSymbol {
                        input: input.clone(),
                        reason: e.reason,
                    }),
                };
                if let Err(e) = &result {
                    warn!(symbol = %input, error = %e, "portfolio entry failed");
                }
                PortfolioEntry { input, result }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let succeeded = entries.iter().filter(|e| e.is_ok()).count();
    info!(total, succeeded, failed = total - succeeded, "portfolio analysis finished");
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{aapl_partial_json, aapl_recommendation_json};
    use crate::model::{InvestmentRecommendation, PartialStockReport};
    use analyst_core::FailureKind;
    use chrono::Utc;
    use std::time::Duration;

    fn report_for(symbol: &StockSymbol) -> StockReport {
        let mut raw = aapl_partial_json();
        raw["symbol"] = serde_json::json!(symbol.ticker());
        raw["company_info"]["symbol"] = serde_json::json!(symbol.ticker());
        let partial: PartialStockReport = serde_json::from_value(raw).unwrap();
        let rec: InvestmentRecommendation =
            serde_json::from_value(aapl_recommendation_json()).unwrap();
        StockReport::merge(partial, rec, Utc::now())
    }

    async fn fake_analysis(symbol: StockSymbol) -> Result<StockReport> {
        // Earlier symbols finish later, so completion order differs from input order.
        let delay = match symbol.ticker() {
            "A" => 30,
            "B" => 20,
            _ => 10,
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        if symbol.ticker() == "B" {
            return Err(AnalysisError::UpstreamCall {
                symbol: "B".to_string(),
                stage: crate::error::Stage::Analysis,
                kind: FailureKind::Unavailable,
                message: "503".to_string(),
            });
        }
        Ok(report_for(&symbol))
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_kept_and_failure_isolated() {
        for concurrency in [1, 3] {
            let entries = analyze_all(["A", "B", "C"], concurrency, fake_analysis).await;

            let inputs: Vec<&str> = entries.iter().map(|e| e.input.as_str()).collect();
            assert_eq!(inputs, ["A", "B", "C"]);
            assert!(entries[0].is_ok());
            assert!(matches!(
                entries[1].result,
                Err(AnalysisError::UpstreamCall { ref symbol, .. }) if symbol == "B"
            ));
            let c = entries[2].result.as_ref().unwrap();
            assert_eq!(c.symbol().ticker(), "C");
        }
    }

    #[tokio::test]
    async fn test_invalid_symbol_entry() {
        let entries = analyze_all(vec!["AAPL", "not a ticker!"], 2, |s| async move {
            Ok(report_for(&s))
        })
        .await;

        assert!(entries[0].is_ok());
        assert!(matches!(
            entries[1].result,
            Err(AnalysisError::InvalidSymbol { ref input, .. }) if input == "not a ticker!"
        ));
    }

    #[test]
    fn test_empty_portfolio() {
        let entries = tokio_test::block_on(analyze_all(Vec::<String>::new(), 0, fake_analysis));
        assert!(entries.is_empty());
    }
}
