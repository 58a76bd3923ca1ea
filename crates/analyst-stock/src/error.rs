//! Error types for stock analysis

use crate::model::ValidationError;
use analyst_core::FailureKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Where in the pipeline a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Web research on behalf of the analysis
    Research,
    /// Gathering and structuring the report (workflow step 1, or the
    /// whole single-stage run)
    Analysis,
    /// Producing the recommendation (workflow step 2)
    Recommendation,
}

impl Stage {
    /// Lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Analysis => "analysis",
            Self::Recommendation => "recommendation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an analysis did not produce a report
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The requested symbol is malformed
    #[error("invalid symbol '{input}': {reason}")]
    InvalidSymbol {
        /// Raw input
        input: String,
        /// What is wrong with it
        reason: String,
    },

    /// A model or research call failed
    #[error("{symbol}: {stage} call failed ({kind}): {message}")]
    UpstreamCall {
        /// Symbol under analysis
        symbol: String,
        /// Failing stage
        stage: Stage,
        /// Failure classification
        kind: FailureKind,
        /// Provider message
        message: String,
    },

    /// The model answered with something that is not a valid report part
    #[error("{symbol}: {stage} output invalid at '{field}': {reason}")]
    OutputValidation {
        /// Symbol under analysis
        symbol: String,
        /// Stage whose output was rejected
        stage: Stage,
        /// Dotted path of the offending field
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Research found too little to recommend anything
    #[error("{symbol}: insufficient data: {reason}")]
    InsufficientData {
        /// Symbol under analysis
        symbol: String,
        /// What was missing
        reason: String,
    },

    /// The recommendation call failed after a successful analysis
    #[error("{symbol}: recommendation failed ({kind}): {message}")]
    Recommendation {
        /// Symbol under analysis
        symbol: String,
        /// Failure classification
        kind: FailureKind,
        /// Provider message
        message: String,
    },

    /// A prompt template failed to render
    #[error("prompt rendering failed: {0}")]
    Prompt(#[from] minijinja::Error),

    /// Invalid or incomplete configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    pub(crate) fn upstream(
        symbol: impl fmt::Display,
        stage: Stage,
        err: &analyst_core::Error,
    ) -> Self {
        Self::UpstreamCall {
            symbol: symbol.to_string(),
            stage,
            kind: err.failure_kind(),
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_output(
        symbol: impl fmt::Display,
        stage: Stage,
        err: ValidationError,
    ) -> Self {
        Self::OutputValidation {
            symbol: symbol.to_string(),
            stage,
            field: err.field,
            reason: err.reason,
        }
    }

    /// Symbol the error concerns, when there is one
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::InvalidSymbol { input, .. } => Some(input),
            Self::UpstreamCall { symbol, .. }
            | Self::OutputValidation { symbol, .. }
            | Self::InsufficientData { symbol, .. }
            | Self::Recommendation { symbol, .. } => Some(symbol),
            Self::Prompt(_) | Self::Config(_) => None,
        }
    }

    /// Stage the error happened in, when it happened in one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::UpstreamCall { stage, .. } | Self::OutputValidation { stage, .. } => Some(*stage),
            Self::InsufficientData { .. } => Some(Stage::Analysis),
            Self::Recommendation { .. } => Some(Stage::Recommendation),
            Self::InvalidSymbol { .. } | Self::Prompt(_) | Self::Config(_) => None,
        }
    }

    /// Failure classification of upstream errors
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::UpstreamCall { kind, .. } | Self::Recommendation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Errors crossing into the agent framework (tool and agent adapters)
impl From<AnalysisError> for analyst_core::Error {
    fn from(err: AnalysisError) -> Self {
        match err.failure_kind() {
            Some(kind) => analyst_core::Error::upstream(kind, err.to_string()),
            None => analyst_core::Error::ProcessingFailed(err.to_string()),
        }
    }
}
