//! Command-line interface for the stock analyst

mod render;

use analyst_stock::{AnalysisMode, StockAnalyst, StockConfig};
use analyst_utils::{LogFormat, init_tracing};
use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "stock-analyst")]
#[command(version, about = "LLM stock analyst with web research", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging and full model transcripts
    #[arg(long, global = true)]
    debug: bool,

    /// Log output format (pretty or json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// How model calls are composed (workflow or single)
    #[arg(long, default_value = "workflow")]
    mode: AnalysisMode,

    /// Print the raw report JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze one stock
    Analyze {
        /// Ticker symbol, e.g. AAPL or BRK.B
        symbol: String,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Analyze several stocks, one report each
    Portfolio {
        /// Ticker symbols
        #[arg(required = true)]
        symbols: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Ask the financial assistant a question
    Ask {
        /// Free-form question
        question: String,
    },
    /// Check that the environment is configured
    CheckEnv,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = StockConfig::from_env();
    let mut logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    logging.debug |= cli.debug;
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    init_tracing(&logging);

    let mut config = config.context("reading configuration from the environment")?;
    config.logging = logging;
    debug!(?config, "configuration loaded");

    if let Commands::CheckEnv = cli.command {
        return Ok(check_env(&config));
    }

    let analyst = Arc::new(StockAnalyst::from_config(config)?);

    match cli.command {
        Commands::Analyze { symbol, output } => {
            info!(%symbol, mode = %output.mode, "analyzing");
            let report = analyst.analyze_with(&symbol, output.mode).await?;
            if output.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", render::report(&report));
            }
        }
        Commands::Portfolio { symbols, output } => {
            let entries = analyst.analyze_portfolio(symbols, output.mode).await;
            if output.json {
                println!("{}", serde_json::to_string_pretty(&render::portfolio_json(&entries))?);
            } else {
                println!("{}", render::portfolio(&entries));
            }
            if entries.iter().any(|e| !e.is_ok()) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Ask { question } => {
            let answer = analyst.assistant()?.ask(&question).await?;
            println!("{answer}");
        }
        Commands::CheckEnv => {}
    }

    Ok(ExitCode::SUCCESS)
}

fn check_env(config: &StockConfig) -> ExitCode {
    let issues = config.issues();
    println!("{}", render::settings(config));
    if issues.is_empty() {
        println!("Environment is ready.");
        ExitCode::SUCCESS
    } else {
        for issue in &issues {
            println!("  x {issue}");
        }
        ExitCode::FAILURE
    }
}
