//! Partial and complete stock reports

use super::parts::{
    CompanyInfo, CompanyInfoDraft, FinancialMetrics, FinancialMetricsDraft,
    InvestmentRecommendation, InvestmentRecommendationDraft, MarketSentiment,
    MarketSentimentDraft, NewsItem, NewsItemDraft, RiskAssessment, RiskAssessmentDraft,
};
use super::{StockSymbol, ValidationError, null_as_default, parse_timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything about a stock except the recommendation
///
/// Output of the analysis stage. The company's symbol always has the same
/// ticker as the report's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PartialStockReportDraft")]
pub struct PartialStockReport {
    symbol: StockSymbol,
    company_info: CompanyInfo,
    financial_metrics: FinancialMetrics,
    recent_news: Vec<NewsItem>,
    market_sentiment: MarketSentiment,
    risk_assessment: RiskAssessment,
    executive_summary: String,
    data_sources: Vec<String>,
}

/// Unvalidated [`PartialStockReport`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialStockReportDraft {
    #[serde(default, deserialize_with = "null_as_default")]
    pub symbol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company_info: CompanyInfoDraft,
    #[serde(default, deserialize_with = "null_as_default")]
    pub financial_metrics: FinancialMetricsDraft,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recent_news: Vec<NewsItemDraft>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_sentiment: MarketSentimentDraft,
    #[serde(default, deserialize_with = "null_as_default")]
    pub risk_assessment: RiskAssessmentDraft,
    #[serde(default, deserialize_with = "null_as_default")]
    pub executive_summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_sources: Vec<String>,
}

impl TryFrom<PartialStockReportDraft> for PartialStockReport {
    type Error = ValidationError;

    fn try_from(mut draft: PartialStockReportDraft) -> Result<Self, Self::Error> {
        let symbol = StockSymbol::parse(&draft.symbol)?;

        // Models often leave the nested symbol out; it can only be this one.
        if draft.company_info.symbol.trim().is_empty() {
            draft.company_info.symbol = symbol.to_string();
        }
        let company_info =
            CompanyInfo::try_from(draft.company_info).map_err(|e| e.within("company_info"))?;
        if !company_info.symbol().same_ticker(&symbol) {
            return Err(ValidationError::new(
                "company_info.symbol",
                format!(
                    "'{}' does not match report symbol '{symbol}'",
                    company_info.symbol()
                ),
            ));
        }

        let recent_news = draft
            .recent_news
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                NewsItem::try_from(item).map_err(|e| e.within(&format!("recent_news[{i}]")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            symbol,
            company_info,
            financial_metrics: FinancialMetrics::try_from(draft.financial_metrics)
                .map_err(|e| e.within("financial_metrics"))?,
            recent_news,
            market_sentiment: MarketSentiment::try_from(draft.market_sentiment)
                .map_err(|e| e.within("market_sentiment"))?,
            risk_assessment: RiskAssessment::try_from(draft.risk_assessment)
                .map_err(|e| e.within("risk_assessment"))?,
            executive_summary: draft.executive_summary.trim().to_string(),
            data_sources: draft
                .data_sources
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }
}

impl PartialStockReport {
    /// Report symbol
    pub fn symbol(&self) -> &StockSymbol {
        &self.symbol
    }

    /// Company details
    pub fn company_info(&self) -> &CompanyInfo {
        &self.company_info
    }

    /// Market data
    pub fn financial_metrics(&self) -> &FinancialMetrics {
        &self.financial_metrics
    }

    /// News, in research order
    pub fn recent_news(&self) -> &[NewsItem] {
        &self.recent_news
    }

    /// Sentiment
    pub fn market_sentiment(&self) -> &MarketSentiment {
        &self.market_sentiment
    }

    /// Risk profile
    pub fn risk_assessment(&self) -> &RiskAssessment {
        &self.risk_assessment
    }

    /// Short overview written by the analyst
    pub fn executive_summary(&self) -> &str {
        &self.executive_summary
    }

    /// Sources cited by the analysis
    pub fn data_sources(&self) -> &[String] {
        &self.data_sources
    }

    /// Same report under a more specific listing of the same ticker
    pub(crate) fn with_symbol(mut self, symbol: StockSymbol) -> Self {
        debug_assert!(self.symbol.same_ticker(&symbol));
        self.symbol = symbol;
        self
    }

    /// Whether research found anything to base a recommendation on
    ///
    /// False when there is no metric, no news, no sentiment factor and no
    /// risk factor at all.
    pub fn has_evidence(&self) -> bool {
        !self.financial_metrics.is_empty()
            || !self.recent_news.is_empty()
            || !self.market_sentiment.key_factors().is_empty()
            || !self.risk_assessment.risk_factors().is_empty()
    }
}

/// Complete, validated stock report
///
/// Only [`StockReport::merge`] builds one, so a report without a
/// recommendation cannot exist. Serializes flat: the partial report's
/// fields plus `investment_recommendation` and `analysis_timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StockReportDraft")]
pub struct StockReport {
    #[serde(flatten)]
    partial: PartialStockReport,
    investment_recommendation: InvestmentRecommendation,
    analysis_timestamp: DateTime<Utc>,
}

/// Unvalidated [`StockReport`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockReportDraft {
    #[serde(flatten)]
    pub partial: PartialStockReportDraft,
    #[serde(default, deserialize_with = "null_as_default")]
    pub investment_recommendation: InvestmentRecommendationDraft,
    #[serde(default, deserialize_with = "null_as_default")]
    pub analysis_timestamp: String,
}

impl TryFrom<StockReportDraft> for StockReport {
    type Error = ValidationError;

    fn try_from(draft: StockReportDraft) -> Result<Self, Self::Error> {
        let partial = PartialStockReport::try_from(draft.partial)?;
        let recommendation = InvestmentRecommendation::try_from(draft.investment_recommendation)
            .map_err(|e| e.within("investment_recommendation"))?;
        let timestamp = parse_timestamp(&draft.analysis_timestamp)
            .map_err(|reason| ValidationError::new("analysis_timestamp", reason))?;
        Ok(Self::merge(partial, recommendation, timestamp))
    }
}

impl StockReport {
    /// Combine an analysis with its recommendation
    ///
    /// Pure and infallible: both halves are already valid.
    pub fn merge(
        partial: PartialStockReport,
        recommendation: InvestmentRecommendation,
        analysis_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            partial,
            investment_recommendation: recommendation,
            analysis_timestamp,
        }
    }

    /// The analysis half
    pub fn partial(&self) -> &PartialStockReport {
        &self.partial
    }

    /// Split back into its halves
    pub fn into_parts(self) -> (PartialStockReport, InvestmentRecommendation, DateTime<Utc>) {
        (
            self.partial,
            self.investment_recommendation,
            self.analysis_timestamp,
        )
    }

    /// Report symbol
    pub fn symbol(&self) -> &StockSymbol {
        self.partial.symbol()
    }

    /// Company details
    pub fn company_info(&self) -> &CompanyInfo {
        self.partial.company_info()
    }

    /// Market data
    pub fn financial_metrics(&self) -> &FinancialMetrics {
        self.partial.financial_metrics()
    }

    /// News, in research order
    pub fn recent_news(&self) -> &[NewsItem] {
        self.partial.recent_news()
    }

    /// Sentiment
    pub fn market_sentiment(&self) -> &MarketSentiment {
        self.partial.market_sentiment()
    }

    /// Risk profile
    pub fn risk_assessment(&self) -> &RiskAssessment {
        self.partial.risk_assessment()
    }

    /// Recommendation
    pub fn investment_recommendation(&self) -> &InvestmentRecommendation {
        &self.investment_recommendation
    }

    /// When the report was composed
    pub fn analysis_timestamp(&self) -> DateTime<Utc> {
        self.analysis_timestamp
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{aapl_partial_json, aapl_recommendation_json};
    use super::*;
    use crate::model::RecommendationTag;
    use chrono::TimeZone;
    use serde_json::json;

    fn partial() -> PartialStockReport {
        serde_json::from_value(aapl_partial_json()).unwrap()
    }

    fn recommendation() -> InvestmentRecommendation {
        serde_json::from_value(aapl_recommendation_json()).unwrap()
    }

    #[test]
    fn test_partial_fills_company_symbol() {
        let report = partial();
        assert_eq!(report.company_info().symbol().ticker(), "AAPL");
        assert_eq!(report.recent_news().len(), 2);
        assert_eq!(report.recent_news()[1].title(), "iPhone sales slip in China");
        assert!(report.has_evidence());
    }

    #[test]
    fn test_company_symbol_must_match() {
        let mut raw = aapl_partial_json();
        raw["company_info"]["symbol"] = json!("MSFT");
        let err = PartialStockReport::try_from(
            serde_json::from_value::<PartialStockReportDraft>(raw).unwrap(),
        )
        .unwrap_err();
        assert_eq!(err.field, "company_info.symbol");
    }

    #[test]
    fn test_nested_error_paths() {
        let mut raw = aapl_partial_json();
        raw["recent_news"][1]["url"] = json!("not a url");
        let draft: PartialStockReportDraft = serde_json::from_value(raw).unwrap();
        assert_eq!(
            PartialStockReport::try_from(draft).unwrap_err().field,
            "recent_news[1].url"
        );

        let mut raw = aapl_partial_json();
        raw["market_sentiment"]["confidence"] = json!(1.2);
        let draft: PartialStockReportDraft = serde_json::from_value(raw).unwrap();
        assert_eq!(
            PartialStockReport::try_from(draft).unwrap_err().field,
            "market_sentiment.confidence"
        );
    }

    #[test]
    fn test_no_evidence() {
        let raw = json!({
            "symbol": "ZZZZ",
            "company_info": {"name": "Unknown Corp"},
            "market_sentiment": {"overall_sentiment": "neutral", "confidence": 0.1},
            "risk_assessment": {"risk_level": "high"}
        });
        let report: PartialStockReport = serde_json::from_value(raw).unwrap();
        assert!(!report.has_evidence());
    }

    #[test]
    fn test_merge_preserves_everything() {
        let at = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        let report = StockReport::merge(partial(), recommendation(), at);

        assert_eq!(report.partial(), &partial());
        assert_eq!(report.financial_metrics().current_price(), Some(185.92));
        assert_eq!(
            report.investment_recommendation().recommendation(),
            RecommendationTag::Buy
        );
        assert_eq!(report.analysis_timestamp(), at);

        let (p, r, t) = report.into_parts();
        assert_eq!((p, r, t), (partial(), recommendation(), at));
    }

    #[test]
    fn test_report_serializes_flat_and_reads_back() {
        let at = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        let report = StockReport::merge(partial(), recommendation(), at);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["symbol"], "AAPL");
        assert_eq!(value["investment_recommendation"]["recommendation"], "buy");
        assert_eq!(value["market_sentiment"]["overall_sentiment"], "positive");
        assert!(value.get("partial").is_none());

        let back: StockReport = serde_json::from_value(value).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_report_requires_recommendation() {
        let raw = aapl_partial_json();
        let err = serde_json::from_value::<StockReport>(raw).unwrap_err();
        assert!(err.to_string().contains("investment_recommendation"));
    }
}
