//! Validated stock report data model
//!
//! Every value type here is immutable and valid by construction. Model
//! output is first deserialized into a `*Draft` (plain public fields,
//! lenient about nulls and missing keys), then converted with `TryFrom`,
//! which is the only way to build the validated type. The validated types
//! also deserialize directly, going through the same conversion.

mod parts;
mod report;
mod symbol;

pub use parts::{
    CompanyInfo, CompanyInfoDraft, FinancialMetrics, FinancialMetricsDraft,
    InvestmentRecommendation, InvestmentRecommendationDraft, MarketSentiment,
    MarketSentimentDraft, NewsItem, NewsItemDraft, RecommendationTag, RiskAssessment,
    RiskAssessmentDraft, RiskLevel, SentimentTag,
};
pub use report::{PartialStockReport, PartialStockReportDraft, StockReport, StockReportDraft};
pub use symbol::StockSymbol;

#[cfg(test)]
pub(crate) use report::fixtures;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// A field failed validation
///
/// `field` is a dotted path from the root of whatever was being validated,
/// e.g. `recent_news[1].url`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Path of the offending field
    pub field: String,
    /// What is wrong with it
    pub reason: String,
}

impl ValidationError {
    /// Create an error for `field`
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Prefix the path with the enclosing field
    pub fn within(mut self, parent: &str) -> Self {
        self.field = if self.field.is_empty() {
            parent.to_string()
        } else if self.field.starts_with('[') {
            format!("{parent}{}", self.field)
        } else {
            format!("{parent}.{}", self.field)
        };
        self
    }
}

/// Treats an explicit `null` like a missing key
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn require_text(field: &str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn finite(field: &str, value: Option<f64>) -> Result<Option<f64>, ValidationError> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::new(field, "must be a finite number")),
        other => Ok(other),
    }
}

pub(crate) fn non_negative(
    field: &str,
    value: Option<f64>,
) -> Result<Option<f64>, ValidationError> {
    match finite(field, value)? {
        Some(v) if v < 0.0 => Err(ValidationError::new(
            field,
            format!("must be non-negative, got {v}"),
        )),
        other => Ok(other),
    }
}

pub(crate) fn unit_interval(field: &str, value: Option<f64>) -> Result<f64, ValidationError> {
    let v = value.ok_or_else(|| ValidationError::new(field, "is required"))?;
    if !(0.0..=1.0).contains(&v) {
        return Err(ValidationError::new(
            field,
            format!("must be between 0 and 1, got {v}"),
        ));
    }
    Ok(v)
}

/// Parse a timestamp as models tend to write them
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS` (taken as
/// UTC), RFC 2822 as news feeds write it, and plain `YYYY-MM-DD` (midnight
/// UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("is required".to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("'{raw}' is not a recognised date or timestamp"))
}
