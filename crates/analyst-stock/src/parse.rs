//! Turning model text into validated report parts
//!
//! Models wrap JSON in prose or code fences often enough that the object
//! is located before it is decoded. Parsing never consults the clock, so
//! the same text always yields the same value.

use crate::error::{AnalysisError, Result, Stage};
use crate::model::{
    InvestmentRecommendation, InvestmentRecommendationDraft, PartialStockReport,
    PartialStockReportDraft, StockReport, StockReportDraft, StockSymbol, ValidationError,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::LazyLock;

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```")
        .unwrap_or_else(|e| panic!("fenced JSON pattern is invalid: {e}"))
});

/// Locate and decode the JSON object in a model answer
///
/// Without a code fence, the first value starting at the first `{` is
/// decoded and whatever prose follows it is ignored.
fn extract_object(text: &str) -> std::result::Result<Value, ValidationError> {
    let malformed = |e: serde_json::Error| ValidationError::new("output", format!("malformed JSON: {e}"));

    let value: Value = match FENCED_JSON.captures(text).and_then(|c| c.get(1)) {
        Some(fenced) => serde_json::from_str(fenced.as_str()).map_err(malformed)?,
        None => {
            let start = text
                .find('{')
                .ok_or_else(|| ValidationError::new("output", "no JSON object in the model answer"))?;
            serde_json::Deserializer::from_str(&text[start..])
                .into_iter::<Value>()
                .next()
                .ok_or_else(|| ValidationError::new("output", "no JSON object in the model answer"))?
                .map_err(malformed)?
        }
    };
    if value.is_object() {
        Ok(value)
    } else {
        Err(ValidationError::new("output", "expected a JSON object"))
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> std::result::Result<T, ValidationError> {
    serde_json::from_value(value)
        .map_err(|e| ValidationError::new("output", format!("unexpected shape: {e}")))
}

fn partial_from(
    requested: &StockSymbol,
    mut draft: PartialStockReportDraft,
) -> std::result::Result<PartialStockReport, ValidationError> {
    if draft.symbol.trim().is_empty() {
        draft.symbol = requested.to_string();
    }
    let partial = PartialStockReport::try_from(draft)?;
    if partial.symbol().same_ticker(requested) {
        Ok(partial.with_symbol(requested.clone()))
    } else {
        Err(ValidationError::new(
            "symbol",
            format!("model analyzed '{}' instead of '{requested}'", partial.symbol()),
        ))
    }
}

/// Parse the analysis stage answer
pub fn parse_partial(requested: &StockSymbol, text: &str) -> Result<PartialStockReport> {
    extract_object(text)
        .and_then(decode::<PartialStockReportDraft>)
        .and_then(|draft| partial_from(requested, draft))
        .map_err(|e| AnalysisError::invalid_output(requested, Stage::Analysis, e))
}

/// Parse the recommendation stage answer
///
/// Accepts the bare recommendation or one wrapped in an
/// `investment_recommendation` key.
pub fn parse_recommendation(
    requested: &StockSymbol,
    text: &str,
) -> Result<InvestmentRecommendation> {
    extract_object(text)
        .and_then(|mut value| {
            let wrapped = value
                .get_mut("investment_recommendation")
                .filter(|v| v.is_object())
                .map(Value::take);
            decode::<InvestmentRecommendationDraft>(wrapped.unwrap_or(value))
        })
        .and_then(InvestmentRecommendation::try_from)
        .map_err(|e| AnalysisError::invalid_output(requested, Stage::Recommendation, e))
}

/// Parse a single-stage answer holding the whole report
///
/// Any timestamp the model supplied is ignored in favor of `analyzed_at`.
pub fn parse_full(
    requested: &StockSymbol,
    text: &str,
    analyzed_at: DateTime<Utc>,
) -> Result<StockReport> {
    extract_object(text)
        .and_then(decode::<StockReportDraft>)
        .and_then(|draft| {
            let partial = partial_from(requested, draft.partial)?;
            let recommendation =
                InvestmentRecommendation::try_from(draft.investment_recommendation)
                    .map_err(|e| e.within("investment_recommendation"))?;
            Ok(StockReport::merge(partial, recommendation, analyzed_at))
        })
        .map_err(|e| AnalysisError::invalid_output(requested, Stage::Analysis, e))
}
