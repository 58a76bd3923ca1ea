//! Report components and their drafts

use super::{
    StockSymbol, ValidationError, finite, non_negative, null_as_default, parse_timestamp,
    require_text, unit_interval,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Closed tag sets. Parsing ignores case and surrounding whitespace but
/// otherwise wants the exact name; "strong buy" is not a `buy`.
macro_rules! closed_tag {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $name {
            $(
                #[doc = $text]
                $variant,
            )+
        }

        impl $name {
            /// Lowercase name
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    "" => Err(format!("{} is required", $label)),
                    other => Err(format!(
                        "unknown {} '{other}' (expected one of: {})",
                        $label,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for &'static str {
            fn from(tag: $name) -> Self {
                tag.as_str()
            }
        }
    };
}

closed_tag!(
    /// Direction of sentiment
    SentimentTag, "sentiment" {
        Positive => "positive",
        Negative => "negative",
        Neutral => "neutral",
    }
);

closed_tag!(
    /// Overall risk level
    RiskLevel, "risk level" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

closed_tag!(
    /// Investment action
    RecommendationTag, "recommendation" {
        Buy => "buy",
        Hold => "hold",
        Sell => "sell",
    }
);

fn tag<T: FromStr<Err = String>>(field: &str, raw: &str) -> Result<T, ValidationError> {
    raw.parse().map_err(|reason| ValidationError::new(field, reason))
}

// ---------------------------------------------------------------------------
// CompanyInfo
// ---------------------------------------------------------------------------

/// Who the company is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CompanyInfoDraft")]
pub struct CompanyInfo {
    name: String,
    symbol: StockSymbol,
    sector: String,
    industry: String,
    market_cap: Option<f64>,
    description: String,
}

/// Unvalidated [`CompanyInfo`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfoDraft {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub symbol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sector: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub industry: String,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

impl TryFrom<CompanyInfoDraft> for CompanyInfo {
    type Error = ValidationError;

    fn try_from(draft: CompanyInfoDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            name: require_text("name", draft.name)?,
            symbol: StockSymbol::parse(&draft.symbol)?,
            sector: draft.sector.trim().to_string(),
            industry: draft.industry.trim().to_string(),
            market_cap: non_negative("market_cap", draft.market_cap)?,
            description: draft.description.trim().to_string(),
        })
    }
}

impl CompanyInfo {
    /// Company name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticker the company trades under
    pub fn symbol(&self) -> &StockSymbol {
        &self.symbol
    }

    /// Sector
    pub fn sector(&self) -> &str {
        &self.sector
    }

    /// Industry
    pub fn industry(&self) -> &str {
        &self.industry
    }

    /// Market capitalization in the quote currency
    pub fn market_cap(&self) -> Option<f64> {
        self.market_cap
    }

    /// Business description
    pub fn description(&self) -> &str {
        &self.description
    }
}

// ---------------------------------------------------------------------------
// FinancialMetrics
// ---------------------------------------------------------------------------

/// Market data; every figure is optional since research may not find it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FinancialMetricsDraft")]
pub struct FinancialMetrics {
    current_price: Option<f64>,
    price_change: Option<f64>,
    price_change_percent: Option<f64>,
    volume: Option<f64>,
    pe_ratio: Option<f64>,
    dividend_yield: Option<f64>,
}

/// Unvalidated [`FinancialMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetricsDraft {
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub price_change: Option<f64>,
    #[serde(default)]
    pub price_change_percent: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    /// Percent, 0 to 100
    #[serde(default)]
    pub dividend_yield: Option<f64>,
}

impl TryFrom<FinancialMetricsDraft> for FinancialMetrics {
    type Error = ValidationError;

    fn try_from(draft: FinancialMetricsDraft) -> Result<Self, Self::Error> {
        let dividend_yield = non_negative("dividend_yield", draft.dividend_yield)?;
        if let Some(y) = dividend_yield.filter(|y| *y > 100.0) {
            return Err(ValidationError::new(
                "dividend_yield",
                format!("must be a percentage between 0 and 100, got {y}"),
            ));
        }

        Ok(Self {
            current_price: non_negative("current_price", draft.current_price)?,
            price_change: finite("price_change", draft.price_change)?,
            price_change_percent: finite("price_change_percent", draft.price_change_percent)?,
            volume: non_negative("volume", draft.volume)?,
            pe_ratio: finite("pe_ratio", draft.pe_ratio)?,
            dividend_yield,
        })
    }
}

impl FinancialMetrics {
    /// Last traded price
    pub fn current_price(&self) -> Option<f64> {
        self.current_price
    }

    /// Change since previous close
    pub fn price_change(&self) -> Option<f64> {
        self.price_change
    }

    /// Change since previous close, percent
    pub fn price_change_percent(&self) -> Option<f64> {
        self.price_change_percent
    }

    /// Traded volume
    pub fn volume(&self) -> Option<f64> {
        self.volume
    }

    /// Price to earnings
    pub fn pe_ratio(&self) -> Option<f64> {
        self.pe_ratio
    }

    /// Dividend yield, percent
    pub fn dividend_yield(&self) -> Option<f64> {
        self.dividend_yield
    }

    /// No figure is known
    pub fn is_empty(&self) -> bool {
        [
            self.current_price,
            self.price_change,
            self.price_change_percent,
            self.volume,
            self.pe_ratio,
            self.dividend_yield,
        ]
        .iter()
        .all(Option::is_none)
    }
}

// ---------------------------------------------------------------------------
// NewsItem
// ---------------------------------------------------------------------------

/// One news article found by research
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NewsItemDraft")]
pub struct NewsItem {
    title: String,
    summary: String,
    url: Url,
    published_at: DateTime<Utc>,
    sentiment: Option<SentimentTag>,
}

/// Unvalidated [`NewsItem`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsItemDraft {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, alias = "published_date", deserialize_with = "null_as_default")]
    pub published_at: String,
    #[serde(default)]
    pub sentiment: Option<String>,
}

impl TryFrom<NewsItemDraft> for NewsItem {
    type Error = ValidationError;

    fn try_from(draft: NewsItemDraft) -> Result<Self, Self::Error> {
        let url = Url::parse(draft.url.trim())
            .map_err(|e| ValidationError::new("url", format!("'{}' is not a URL: {e}", draft.url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ValidationError::new(
                "url",
                format!("scheme '{}' is not http or https", url.scheme()),
            ));
        }

        let sentiment = match draft.sentiment.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(tag("sentiment", raw)?),
        };

        Ok(Self {
            title: require_text("title", draft.title)?,
            summary: draft.summary.trim().to_string(),
            url,
            published_at: parse_timestamp(&draft.published_at)
                .map_err(|reason| ValidationError::new("published_at", reason))?,
            sentiment,
        })
    }
}

impl NewsItem {
    /// Headline
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Short summary
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Article link
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Publication time
    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    /// Sentiment of the article toward the stock
    pub fn sentiment(&self) -> Option<SentimentTag> {
        self.sentiment
    }
}

// ---------------------------------------------------------------------------
// MarketSentiment
// ---------------------------------------------------------------------------

/// How the market feels about the stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MarketSentimentDraft")]
pub struct MarketSentiment {
    overall_sentiment: SentimentTag,
    confidence: f64,
    key_factors: Vec<String>,
}

/// Unvalidated [`MarketSentiment`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSentimentDraft {
    #[serde(default, deserialize_with = "null_as_default")]
    pub overall_sentiment: String,
    #[serde(default, alias = "confidence_score")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_factors: Vec<String>,
}

impl TryFrom<MarketSentimentDraft> for MarketSentiment {
    type Error = ValidationError;

    fn try_from(draft: MarketSentimentDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            overall_sentiment: tag("overall_sentiment", &draft.overall_sentiment)?,
            confidence: unit_interval("confidence", draft.confidence)?,
            key_factors: clean_list(draft.key_factors),
        })
    }
}

impl MarketSentiment {
    /// Overall direction
    pub fn overall_sentiment(&self) -> SentimentTag {
        self.overall_sentiment
    }

    /// Confidence in [0, 1]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// What drives the sentiment
    pub fn key_factors(&self) -> &[String] {
        &self.key_factors
    }
}

// ---------------------------------------------------------------------------
// RiskAssessment
// ---------------------------------------------------------------------------

/// Risk profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RiskAssessmentDraft")]
pub struct RiskAssessment {
    risk_level: RiskLevel,
    risk_factors: Vec<String>,
    volatility: String,
}

/// Unvalidated [`RiskAssessment`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessmentDraft {
    #[serde(default, deserialize_with = "null_as_default")]
    pub risk_level: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub risk_factors: Vec<String>,
    #[serde(default, alias = "volatility_assessment", deserialize_with = "null_as_default")]
    pub volatility: String,
}

impl TryFrom<RiskAssessmentDraft> for RiskAssessment {
    type Error = ValidationError;

    fn try_from(draft: RiskAssessmentDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            risk_level: tag("risk_level", &draft.risk_level)?,
            risk_factors: clean_list(draft.risk_factors),
            volatility: draft.volatility.trim().to_string(),
        })
    }
}

impl RiskAssessment {
    /// Overall level
    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    /// Individual risks
    pub fn risk_factors(&self) -> &[String] {
        &self.risk_factors
    }

    /// Volatility narrative
    pub fn volatility(&self) -> &str {
        &self.volatility
    }
}

// ---------------------------------------------------------------------------
// InvestmentRecommendation
// ---------------------------------------------------------------------------

/// What to do with the stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InvestmentRecommendationDraft")]
pub struct InvestmentRecommendation {
    recommendation: RecommendationTag,
    confidence: f64,
    reasoning: String,
    target_price: Option<f64>,
    time_horizon: String,
}

/// Unvalidated [`InvestmentRecommendation`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRecommendationDraft {
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendation: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reasoning: String,
    #[serde(default)]
    pub target_price: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_horizon: String,
}

impl TryFrom<InvestmentRecommendationDraft> for InvestmentRecommendation {
    type Error = ValidationError;

    fn try_from(draft: InvestmentRecommendationDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            recommendation: tag("recommendation", &draft.recommendation)?,
            confidence: unit_interval("confidence", draft.confidence)?,
            reasoning: require_text("reasoning", draft.reasoning)?,
            target_price: non_negative("target_price", draft.target_price)?,
            time_horizon: draft.time_horizon.trim().to_string(),
        })
    }
}

impl InvestmentRecommendation {
    /// Buy, hold or sell
    pub fn recommendation(&self) -> RecommendationTag {
        self.recommendation
    }

    /// Confidence in [0, 1]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Why
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    /// Price target
    pub fn target_price(&self) -> Option<f64> {
        self.target_price
    }

    /// Holding period the recommendation assumes
    pub fn time_horizon(&self) -> &str {
        &self.time_horizon
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tags_are_closed() {
        assert_eq!("BUY".parse::<RecommendationTag>(), Ok(RecommendationTag::Buy));
        assert_eq!(" Neutral ".parse::<SentimentTag>(), Ok(SentimentTag::Neutral));

        let err = "strong buy".parse::<RecommendationTag>().unwrap_err();
        assert!(err.contains("unknown recommendation 'strong buy'"));
        assert!("bullish".parse::<SentimentTag>().is_err());
        assert!("".parse::<RiskLevel>().unwrap_err().contains("required"));

        assert_eq!(serde_json::to_value(RiskLevel::High).unwrap(), json!("high"));
        assert_eq!(serde_json::from_value::<RiskLevel>(json!("Medium")).unwrap(), RiskLevel::Medium);
    }

    #[test]
    fn test_company_rules() {
        let draft = CompanyInfoDraft {
            name: "Apple Inc.".into(),
            symbol: "aapl".into(),
            market_cap: Some(2.9e12),
            ..CompanyInfoDraft::default()
        };
        let info = CompanyInfo::try_from(draft.clone()).unwrap();
        assert_eq!(info.symbol().ticker(), "AAPL");

        let err = CompanyInfo::try_from(CompanyInfoDraft {
            name: "  ".into(),
            ..draft.clone()
        })
        .unwrap_err();
        assert_eq!(err.field, "name");

        let err = CompanyInfo::try_from(CompanyInfoDraft {
            market_cap: Some(-1.0),
            ..draft
        })
        .unwrap_err();
        assert_eq!(err.field, "market_cap");
    }

    #[test]
    fn test_metric_rules() {
        let ok = FinancialMetrics::try_from(FinancialMetricsDraft {
            current_price: Some(185.92),
            price_change: Some(-2.1),
            dividend_yield: Some(0.5),
            ..FinancialMetricsDraft::default()
        })
        .unwrap();
        assert!(!ok.is_empty());
        assert!(FinancialMetrics::default().is_empty());

        for (draft, field) in [
            (FinancialMetricsDraft { current_price: Some(-1.0), ..Default::default() }, "current_price"),
            (FinancialMetricsDraft { volume: Some(-10.0), ..Default::default() }, "volume"),
            (FinancialMetricsDraft { dividend_yield: Some(150.0), ..Default::default() }, "dividend_yield"),
            (FinancialMetricsDraft { pe_ratio: Some(f64::INFINITY), ..Default::default() }, "pe_ratio"),
        ] {
            assert_eq!(FinancialMetrics::try_from(draft).unwrap_err().field, field);
        }
    }

    #[test]
    fn test_news_rules() {
        let item: NewsItem = serde_json::from_value(json!({
            "title": "Apple beats estimates",
            "summary": null,
            "url": "https://example.com/a",
            "published_date": "2024-05-02",
            "sentiment": "Positive"
        }))
        .unwrap();
        assert_eq!(item.sentiment(), Some(SentimentTag::Positive));
        assert_eq!(item.summary(), "");

        let bad_scheme = NewsItemDraft {
            title: "t".into(),
            url: "ftp://example.com/a".into(),
            published_at: "2024-05-02".into(),
            ..NewsItemDraft::default()
        };
        assert_eq!(NewsItem::try_from(bad_scheme.clone()).unwrap_err().field, "url");

        let no_date = NewsItemDraft {
            url: "https://example.com".into(),
            published_at: String::new(),
            ..bad_scheme
        };
        assert_eq!(NewsItem::try_from(no_date).unwrap_err().field, "published_at");
    }

    #[test]
    fn test_recommendation_rules() {
        let draft = InvestmentRecommendationDraft {
            recommendation: "hold".into(),
            confidence: Some(0.6),
            reasoning: "Fairly valued".into(),
            ..InvestmentRecommendationDraft::default()
        };
        assert!(InvestmentRecommendation::try_from(draft.clone()).is_ok());

        let over = InvestmentRecommendationDraft {
            confidence: Some(1.5),
            ..draft.clone()
        };
        assert_eq!(InvestmentRecommendation::try_from(over).unwrap_err().field, "confidence");

        let bounds = InvestmentRecommendationDraft {
            confidence: Some(0.0),
            ..draft.clone()
        };
        assert!(InvestmentRecommendation::try_from(bounds).is_ok());

        let no_reason = InvestmentRecommendationDraft {
            reasoning: String::new(),
            ..draft
        };
        assert_eq!(InvestmentRecommendation::try_from(no_reason).unwrap_err().field, "reasoning");
    }

    #[test]
    fn test_sentiment_and_risk_lists_are_cleaned() {
        let sentiment = MarketSentiment::try_from(MarketSentimentDraft {
            overall_sentiment: "positive".into(),
            confidence: Some(0.7),
            key_factors: vec!["  iPhone demand ".into(), String::new()],
        })
        .unwrap();
        assert_eq!(sentiment.key_factors(), ["iPhone demand"]);

        let risk = RiskAssessment::try_from(RiskAssessmentDraft {
            risk_level: "severe".into(),
            ..RiskAssessmentDraft::default()
        });
        assert_eq!(risk.unwrap_err().field, "risk_level");
    }
}
