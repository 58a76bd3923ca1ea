//! The report pipeline behind framework seams
//!
//! [`StockReportTool`] lets another model call the pipeline as a tool,
//! [`StockReportAgent`] is the entry point a transport adapter drives, and
//! [`FinancialAssistant`] answers free-form questions with both web search
//! and full reports at hand.

use crate::analyst::AnalysisMode;
use crate::error::{AnalysisError, Result};
use crate::model::{StockReport, StockSymbol};
use crate::prompts::ASSISTANT_INSTRUCTIONS;
use analyst_core::{Agent, Context, Error};
use analyst_llm::tools::schema;
use analyst_runtime::{AgentRuntime, ToolAgent};
use analyst_tools::{Tool, ToolRegistry};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Anything that can produce a report for a symbol
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportService: Send + Sync {
    /// Produce a report; `None` uses the service's default mode
    async fn report(&self, symbol: &str, mode: Option<AnalysisMode>) -> Result<StockReport>;
}

/// `stock_report` tool
pub struct StockReportTool {
    service: Arc<dyn ReportService>,
}

impl StockReportTool {
    /// Tool name the model calls
    pub const NAME: &'static str = "stock_report";

    /// Wrap a report service
    pub fn new(service: Arc<dyn ReportService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for StockReportTool {
    async fn execute(&self, params: Value) -> analyst_core::Result<Value> {
        let symbol = params
            .get("symbol")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::ToolFailed {
                name: Self::NAME.to_string(),
                message: "missing required string argument 'symbol'".to_string(),
            })?;

        let report = self.service.report(symbol, None).await?;
        serde_json::to_value(&report)
            .map_err(|e| Error::ProcessingFailed(format!("report is not serializable: {e}")))
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Produce a full stock analysis report for a ticker symbol: company \
         information, financial metrics, recent news, market sentiment, risk \
         assessment and an investment recommendation. Takes a minute or two."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({ "symbol": schema::string("Stock ticker symbol, e.g. AAPL") }),
            &["symbol"],
        )
    }
}

/// Agent answering a symbol with the report JSON
///
/// Reads the analysis mode from the context and writes back the request id
/// (generated when missing) and the normalized symbol.
pub struct StockReportAgent {
    service: Arc<dyn ReportService>,
}

impl StockReportAgent {
    /// Wrap a report service
    pub fn new(service: Arc<dyn ReportService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Agent for StockReportAgent {
    async fn process(&self, input: String, context: &mut Context) -> analyst_core::Result<String> {
        if context.request_id().is_none() {
            context.insert(
                analyst_core::context::keys::REQUEST_ID,
                json!(Uuid::new_v4().to_string()),
            );
        }
        let request_id = context.request_id().unwrap_or_default().to_string();

        let mode = context
            .analysis_mode()
            .map(str::parse::<AnalysisMode>)
            .transpose()
            .map_err(Error::ProcessingFailed)?;

        let symbol = StockSymbol::parse(&input).map_err(|e| AnalysisError::InvalidSymbol {
            input: input.clone(),
            reason: e.reason,
        })?;
        context.set_symbol(symbol.to_string());
        info!(%request_id, %symbol, ?mode, "report requested");

        let report = self.service.report(&symbol.to_string(), mode).await?;
        serde_json::to_string_pretty(&report)
            .map_err(|e| Error::ProcessingFailed(format!("report is not serializable: {e}")))
    }

    fn name(&self) -> &str {
        "stock_report_agent"
    }

    fn description(&self) -> &str {
        "Analyzes a stock symbol and returns a JSON report with a recommendation"
    }
}

/// Free-form financial Q&A with web search and stock reports
pub struct FinancialAssistant {
    agent: ToolAgent,
}

impl FinancialAssistant {
    /// Assemble the assistant over the shared runtime
    pub fn new(
        runtime: &AgentRuntime,
        web_search: Arc<dyn Tool>,
        service: Arc<dyn ReportService>,
    ) -> analyst_core::Result<Self> {
        let tools = ToolRegistry::builder()
            .try_tool(web_search)?
            .try_tool(Arc::new(StockReportTool::new(service)))?
            .build();
        let config = runtime
            .executor_config()
            .with_system_prompt(ASSISTANT_INSTRUCTIONS);
        let agent = runtime
            .create_tool_agent(Arc::new(tools), config, "financial_assistant")
            .with_description("Answers financial questions using web search and stock reports");
        Ok(Self { agent })
    }

    /// Answer one question; nothing is remembered between questions
    pub async fn ask(&self, question: &str) -> analyst_core::Result<String> {
        let mut context = Context::new().with_request_id(Uuid::new_v4().to_string());
        self.agent.process(question.to_string(), &mut context).await
    }

    /// The assistant as a plain agent
    pub fn agent(&self) -> &ToolAgent {
        &self.agent
    }
}
