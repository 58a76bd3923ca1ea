//! Logging and tracing utilities

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of the log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, colored when attached to a terminal
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected pretty or json)")),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Default level directive, e.g. "info"
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Debug mode keeps HTTP client internals visible
    pub debug: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            debug: false,
        }
    }
}

impl LogSettings {
    /// Filter directives derived from the settings
    ///
    /// Debug mode raises the level to `debug` unless a more verbose one
    /// was configured.
    pub fn directives(&self) -> String {
        let level = if self.debug && !self.level.eq_ignore_ascii_case("trace") {
            "debug"
        } else {
            self.level.as_str()
        };
        if self.debug {
            level.to_string()
        } else {
            format!("{level},hyper=warn,hyper_util=warn,reqwest=warn,h2=warn")
        }
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG`, when set, replaces the configured directives entirely.
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_tracing(settings: &LogSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(settings.directives()));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match settings.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(settings.debug))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
