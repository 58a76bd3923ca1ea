//! Terminal rendering of reports

use analyst_stock::portfolio::PortfolioEntry;
use analyst_stock::{StockConfig, StockReport};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde_json::{Value, json};

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn number(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}{suffix}"))
}

fn text_or_na(value: &str) -> String {
    if value.is_empty() {
        "n/a".to_string()
    } else {
        value.to_string()
    }
}

/// One report as tables plus the recommendation reasoning
pub fn report(report: &StockReport) -> String {
    let company = report.company_info();
    let metrics = report.financial_metrics();
    let sentiment = report.market_sentiment();
    let risk = report.risk_assessment();
    let rec = report.investment_recommendation();

    let mut overview = table();
    overview.set_header(vec![format!("{} ({})", company.name(), report.symbol()), String::new()]);
    overview.add_row(vec!["Sector".to_string(), text_or_na(company.sector())]);
    overview.add_row(vec!["Industry".to_string(), text_or_na(company.industry())]);
    overview.add_row(vec!["Price".to_string(), number(metrics.current_price(), "")]);
    overview.add_row(vec![
        "Change".to_string(),
        format!(
            "{} ({})",
            number(metrics.price_change(), ""),
            number(metrics.price_change_percent(), "%")
        ),
    ]);
    overview.add_row(vec!["Volume".to_string(), number(metrics.volume(), "")]);
    overview.add_row(vec!["P/E".to_string(), number(metrics.pe_ratio(), "")]);
    overview.add_row(vec!["Dividend yield".to_string(), number(metrics.dividend_yield(), "%")]);
    overview.add_row(vec![
        "Sentiment".to_string(),
        format!("{} ({:.0}%)", sentiment.overall_sentiment(), sentiment.confidence() * 100.0),
    ]);
    overview.add_row(vec!["Risk".to_string(), risk.risk_level().to_string()]);
    overview.add_row(vec![
        "Recommendation".to_string(),
        format!(
            "{} ({:.0}% confidence)",
            rec.recommendation().as_str().to_uppercase(),
            rec.confidence() * 100.0
        ),
    ]);
    overview.add_row(vec!["Target price".to_string(), number(rec.target_price(), "")]);
    overview.add_row(vec!["Horizon".to_string(), text_or_na(rec.time_horizon())]);

    let mut out = overview.to_string();

    if !report.recent_news().is_empty() {
        let mut news = table();
        news.set_header(vec!["Date", "Headline", "Sentiment"]);
        for item in report.recent_news() {
            news.add_row(vec![
                item.published_at().format("%Y-%m-%d").to_string(),
                item.title().to_string(),
                item.sentiment().map_or_else(|| "-".to_string(), |s| s.to_string()),
            ]);
        }
        out.push('\n');
        out.push_str(&news.to_string());
    }

    out.push_str(&format!("\n\nReasoning: {}", rec.reasoning()));
    if !risk.risk_factors().is_empty() {
        out.push_str(&format!("\nRisks: {}", risk.risk_factors().join("; ")));
    }
    out.push_str(&format!(
        "\nAnalyzed at {}",
        report.analysis_timestamp().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out
}

/// Portfolio summary, one row per requested symbol
pub fn portfolio(entries: &[PortfolioEntry]) -> String {
    let mut summary = table();
    summary.set_header(vec!["Symbol", "Recommendation", "Confidence", "Price", "Risk", "Error"]);
    for entry in entries {
        match &entry.result {
            Ok(report) => {
                let rec = report.investment_recommendation();
                summary.add_row(vec![
                    report.symbol().to_string(),
                    rec.recommendation().as_str().to_uppercase(),
                    format!("{:.0}%", rec.confidence() * 100.0),
                    number(report.financial_metrics().current_price(), ""),
                    report.risk_assessment().risk_level().to_string(),
                    String::new(),
                ]);
            }
            Err(e) => {
                summary.add_row(vec![
                    entry.input.clone(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    e.to_string(),
                ]);
            }
        }
    }
    summary.to_string()
}

/// Portfolio as JSON, failures included
pub fn portfolio_json(entries: &[PortfolioEntry]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|entry| match &entry.result {
                Ok(report) => json!({ "input": entry.input, "report": report }),
                Err(e) => json!({
                    "input": entry.input,
                    "error": {
                        "message": e.to_string(),
                        "stage": e.stage(),
                        "kind": e.failure_kind(),
                    }
                }),
            })
            .collect(),
    )
}

/// Effective settings, secrets reduced to set / missing
pub fn settings(config: &StockConfig) -> String {
    let present = |v: &Option<String>| if v.is_some() { "set" } else { "missing" }.to_string();

    let mut table = table();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["Model".to_string(), config.model.model.clone()]);
    table.add_row(vec!["Model API base".to_string(), config.model.api_base.clone()]);
    table.add_row(vec!["Via LiteLLM proxy".to_string(), config.model.via_proxy.to_string()]);
    table.add_row(vec!["Model API key".to_string(), present(&config.model.api_key)]);
    table.add_row(vec!["Tavily API key".to_string(), present(&config.research.api_key)]);
    table.add_row(vec!["Search depth".to_string(), config.research.search_depth.to_string()]);
    table.add_row(vec!["Results per search".to_string(), config.research.max_results.to_string()]);
    table.add_row(vec![
        "Stage timeout".to_string(),
        format!("{}s", config.analysis.stage_timeout.as_secs()),
    ]);
    table.add_row(vec![
        "Portfolio concurrency".to_string(),
        config.analysis.portfolio_concurrency.to_string(),
    ]);
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_stock::AnalysisError;

    fn sample() -> StockReport {
        serde_json::from_value(json!({
            "symbol": "NVDA",
            "company_info": {"name": "NVIDIA Corporation", "sector": "Technology"},
            "financial_metrics": {"current_price": 875.4, "pe_ratio": 72.3},
            "recent_news": [{
                "title": "Data center demand surges",
                "url": "https://example.com/nvda",
                "published_at": "2024-05-01",
                "sentiment": "positive"
            }],
            "market_sentiment": {"overall_sentiment": "positive", "confidence": 0.8},
            "risk_assessment": {"risk_level": "high", "risk_factors": ["Valuation"]},
            "investment_recommendation": {
                "recommendation": "hold",
                "confidence": 0.6,
                "reasoning": "Growth is priced in."
            },
            "analysis_timestamp": "2024-05-02T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_report_rendering() {
        let out = report(&sample());
        assert!(out.contains("NVIDIA Corporation (NVDA)"));
        assert!(out.contains("875.40"));
        assert!(out.contains("HOLD (60% confidence)"));
        assert!(out.contains("Data center demand surges"));
        assert!(out.contains("Reasoning: Growth is priced in."));
        assert!(out.contains("Risks: Valuation"));
    }

    #[test]
    fn test_portfolio_json_keeps_failures() {
        let entries = vec![
            PortfolioEntry {
                input: "NVDA".to_string(),
                result: Ok(sample()),
            },
            PortfolioEntry {
                input: "??".to_string(),
                result: Err(AnalysisError::InvalidSymbol {
                    input: "??".to_string(),
                    reason: "bad".to_string(),
                }),
            },
        ];

        let value = portfolio_json(&entries);
        assert_eq!(value[0]["report"]["symbol"], "NVDA");
        assert_eq!(value[1]["input"], "??");
        assert!(value[1]["error"]["stage"].is_null());

        let table = portfolio(&entries);
        assert!(table.contains("HOLD"));
        assert!(table.contains("invalid symbol"));
    }
}
