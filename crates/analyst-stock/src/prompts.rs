//! Prompt templates and stage instructions
//!
//! Instructions are fixed text. User messages are rendered with MiniJinja
//! so the recommendation stage sees a readable digest of the analysis
//! rather than raw JSON.

use crate::model::{PartialStockReport, StockSymbol};
use chrono::NaiveDate;
use minijinja::{Environment, Value, context};

/// JSON layout shared by the analysis and full-report instructions
const PARTIAL_LAYOUT: &str = r#"{
  "symbol": "TICKER",
  "company_info": {
    "name": "string", "symbol": "TICKER", "sector": "string",
    "industry": "string", "market_cap": number or null, "description": "string"
  },
  "financial_metrics": {
    "current_price": number or null, "price_change": number or null,
    "price_change_percent": number or null, "volume": number or null,
    "pe_ratio": number or null, "dividend_yield": percent number or null
  },
  "recent_news": [
    {"title": "string", "summary": "string", "url": "https://...",
     "published_at": "YYYY-MM-DD or RFC 3339 (required)", "sentiment": "positive|negative|neutral"}
  ],
  "market_sentiment": {
    "overall_sentiment": "positive|negative|neutral", "confidence": 0.0-1.0,
    "key_factors": ["string"]
  },
  "risk_assessment": {
    "risk_level": "low|medium|high", "risk_factors": ["string"], "volatility": "string"
  },
  "executive_summary": "string",
  "data_sources": ["string"]"#;

const RECOMMENDATION_LAYOUT: &str = r#"{
  "recommendation": "buy|hold|sell",
  "confidence": 0.0-1.0,
  "reasoning": "string",
  "target_price": number or null,
  "time_horizon": "string"
}"#;

const RESEARCH_METHOD: &str = "\
You are a professional equity research analyst with a web_search tool.

Work in cycles: reason about what you still need, search for it, read the
results, and repeat until you can fill every field from evidence.

Search for company fundamentals, the current stock price and trading data,
news from the last three to six months, analyst opinions, and risks. Look
for positive and negative information alike. Prefer reputable financial
sources and company communications.

Never invent numbers. If a value cannot be found, use null. Only list news
items you actually found, with their real URLs and publication dates; leave
out any item whose date you cannot establish.";

/// Instructions for the analysis stage (everything but the recommendation)
pub fn analysis_instructions() -> String {
    format!(
        "{RESEARCH_METHOD}\n\n\
         Do NOT make an investment recommendation; a separate specialist does that.\n\n\
         Answer with one JSON object and nothing else, in this layout:\n\
         {PARTIAL_LAYOUT}\n}}"
    )
}

/// Instructions for the single-stage run producing a whole report
pub fn full_report_instructions() -> String {
    format!(
        "{RESEARCH_METHOD}\n\n\
         Finish with a clear investment recommendation based on what you found.\n\n\
         Answer with one JSON object and nothing else, in this layout:\n\
         {PARTIAL_LAYOUT},\n  \"investment_recommendation\": {RECOMMENDATION_LAYOUT}\n}}"
    )
}

/// Instructions for the recommendation stage
pub fn recommendation_instructions() -> String {
    format!(
        "You are an investment advisor. A research team has analyzed a stock for you.\n\n\
         Review the analysis, weigh financial performance, sentiment, risks and news,\n\
         and decide on exactly one of buy, hold or sell. Explain your reasoning in\n\
         three to five sentences, mention the time horizon, and acknowledge both\n\
         opportunities and risks. Base everything on the analysis provided; you have\n\
         no tools.\n\n\
         Answer with one JSON object and nothing else, in this layout:\n\
         {RECOMMENDATION_LAYOUT}"
    )
}

/// Instructions for the free-form financial assistant
pub const ASSISTANT_INSTRUCTIONS: &str = "\
You are a helpful financial assistant.

Use web_search for current market information, news and general financial
questions. When the user asks for an analysis of a specific stock, call
stock_report with its ticker symbol and summarize the report: company,
price, recent news, sentiment, risks and the recommendation with its
confidence.

Be concise and factual. Say so when information is unavailable. Remind the
user that this is not personalized investment advice when you give a
recommendation.";

const ANALYSIS_REQUEST: &str = "\
Analyze the stock {{ symbol }}{% if exchange %} listed on {{ exchange }}{% endif %}.
Today is {{ date }}. Research it now and return the JSON object.";

const RECOMMENDATION_REQUEST: &str = "\
Provide an investment recommendation for {{ r.symbol }} based on this analysis.

Company: {{ r.company_info.name }}{% if r.company_info.sector %} ({{ r.company_info.sector }}{% if r.company_info.industry %}, {{ r.company_info.industry }}{% endif %}){% endif %}
{%- if r.company_info.description %}
{{ r.company_info.description }}
{%- endif %}

Financial metrics:
{%- for label, key in metrics %}
{%- if r.financial_metrics[key] is number %}
- {{ label }}: {{ r.financial_metrics[key] }}
{%- endif %}
{%- endfor %}
{%- if not has_metrics %}
- none found
{%- endif %}

Recent news:
{%- for item in r.recent_news %}
- {{ item.published_at[:10] }} {{ item.title }}{% if item.sentiment %} [{{ item.sentiment }}]{% endif %}
{%- if item.summary %}: {{ item.summary }}{% endif %}
{%- else %}
- none found
{%- endfor %}

Market sentiment: {{ r.market_sentiment.overall_sentiment }} (confidence {{ r.market_sentiment.confidence }})
{%- for factor in r.market_sentiment.key_factors %}
- {{ factor }}
{%- endfor %}

Risk level: {{ r.risk_assessment.risk_level }}
{%- for factor in r.risk_assessment.risk_factors %}
- {{ factor }}
{%- endfor %}
{%- if r.risk_assessment.volatility %}
Volatility: {{ r.risk_assessment.volatility }}
{%- endif %}
{%- if r.executive_summary %}

Summary: {{ r.executive_summary }}
{%- endif %}";

const METRIC_LABELS: [(&str, &str); 6] = [
    ("Current price", "current_price"),
    ("Price change", "price_change"),
    ("Price change %", "price_change_percent"),
    ("Volume", "volume"),
    ("P/E ratio", "pe_ratio"),
    ("Dividend yield %", "dividend_yield"),
];

/// Compiled user-message templates
#[derive(Debug)]
pub struct Prompts {
    env: Environment<'static>,
}

impl Prompts {
    /// Compile all templates
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("analysis_request", ANALYSIS_REQUEST)?;
        env.add_template("recommendation_request", RECOMMENDATION_REQUEST)?;
        Ok(Self { env })
    }

    /// User message asking for research on `symbol`
    pub fn analysis_request(
        &self,
        symbol: &StockSymbol,
        date: NaiveDate,
    ) -> Result<String, minijinja::Error> {
        self.env.get_template("analysis_request")?.render(context! {
            symbol => symbol.ticker(),
            exchange => symbol.exchange(),
            date => date.format("%Y-%m-%d").to_string(),
        })
    }

    /// User message carrying a digest of the analysis
    pub fn recommendation_request(
        &self,
        partial: &PartialStockReport,
    ) -> Result<String, minijinja::Error> {
        self.env.get_template("recommendation_request")?.render(context! {
            r => Value::from_serialize(partial),
            metrics => METRIC_LABELS,
            has_metrics => !partial.financial_metrics().is_empty(),
        })
    }
}
