//! Error types for analyst-core

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for analyst-core
pub type Result<T> = std::result::Result<T, Error>;

/// Why an outbound call (model provider, search API, tool) failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection refused, reset, DNS, TLS
    Network,
    /// Missing or rejected credentials
    Authentication,
    /// Provider asked us to slow down
    RateLimited,
    /// The call did not finish within its deadline
    Timeout,
    /// The provider rejected the request as malformed
    InvalidRequest,
    /// Provider-side outage (5xx)
    Unavailable,
    /// The provider answered with something we could not decode
    MalformedResponse,
    /// Anything else
    Other,
}

impl FailureKind {
    /// Short lowercase label used in diagnostics and log fields
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Authentication => "authentication",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::InvalidRequest => "invalid_request",
            Self::Unavailable => "unavailable",
            Self::MalformedResponse => "malformed_response",
            Self::Other => "other",
        }
    }

    /// Whether re-issuing the same request later could plausibly succeed
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Network | Self::RateLimited | Self::Timeout | Self::Unavailable
        )
    }

    /// Classify an HTTP status code returned by a provider
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            429 => Self::RateLimited,
            408 | 504 => Self::Timeout,
            400..=499 => Self::InvalidRequest,
            500..=599 => Self::Unavailable,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Agent or runtime could not be assembled
    #[error("Agent initialization failed: {0}")]
    InitializationFailed(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),

    /// An outbound call to a model provider or external API failed
    #[error("Upstream call failed ({kind}): {message}")]
    Upstream {
        /// Failure classification
        kind: FailureKind,
        /// Provider message
        message: String,
    },

    /// A bounded call exceeded its deadline
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// A tool invocation failed
    #[error("Tool '{name}' failed: {message}")]
    ToolFailed {
        /// Tool name
        name: String,
        /// Failure description
        message: String,
    },

    /// The model kept requesting tools past the configured limit
    #[error("Iteration limit of {0} reached without a final answer")]
    IterationLimit(usize),
}

impl Error {
    /// Build an [`Error::Upstream`]
    pub fn upstream(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Upstream {
            kind,
            message: message.into(),
        }
    }

    /// Classify this error for callers that map it into their own taxonomy
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Upstream { kind, .. } => *kind,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::IterationLimit(_) => FailureKind::MalformedResponse,
            Self::InitializationFailed(_) => FailureKind::InvalidRequest,
            Self::Generic(_) | Self::ProcessingFailed(_) | Self::ToolFailed { .. } => {
                FailureKind::Other
            }
        }
    }
}
