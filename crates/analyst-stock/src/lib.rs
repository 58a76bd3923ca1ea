//! LLM stock analyst
//!
//! Produces validated stock reports by composing model calls with a web
//! research tool:
//!
//! - **Single stage**: one research run returns the whole report.
//! - **Workflow**: an analysis run (research bound, no recommendation) is
//!   followed by a recommendation run that sees only the structured
//!   analysis; the halves are merged into one report.
//! - **Delegation**: the pipeline as a `stock_report` tool, as an
//!   [`Agent`](analyst_core::Agent), and inside a free-form
//!   [`FinancialAssistant`].
//!
//! Every report that leaves this crate has passed validation; anything
//! else is a typed [`AnalysisError`] naming the symbol, stage and cause.
//!
//! # Example
//!
//! ```rust,no_run
//! use analyst_stock::{AnalysisMode, StockAnalyst, StockConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let analyst = StockAnalyst::from_config(StockConfig::from_env()?)?;
//!
//!     let report = analyst.analyze_with("MSFT", AnalysisMode::SingleStage).await?;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!     Ok(())
//! }
//! ```

pub mod analyst;
pub mod analyzer;
pub mod config;
pub mod delegation;
pub mod error;
pub mod model;
pub mod parse;
pub mod portfolio;
pub mod prompts;
pub mod recommender;
pub mod research;
pub mod runner;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use analyst::{AnalysisMode, StockAnalyst};
pub use analyzer::StockAnalyzer;
pub use config::{AnalysisSettings, ModelSettings, ResearchSettings, StockConfig, StockConfigBuilder};
pub use delegation::{FinancialAssistant, ReportService, StockReportAgent, StockReportTool};
pub use error::{AnalysisError, Result, Stage};
pub use model::{StockReport, StockSymbol, ValidationError};
pub use portfolio::PortfolioEntry;
pub use recommender::Recommender;
pub use research::{ResearchProvider, SearchDepth, TavilyClient, WebSearchTool};
pub use runner::{ExecutorModelRunner, ModelReply, ModelRequest, ModelRunner};
pub use workflow::{StockReportWorkflow, WorkflowRun, WorkflowState};
