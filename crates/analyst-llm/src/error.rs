//! Error types for LLM operations

use analyst_core::FailureKind;
use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed with an unclassified status
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Provider-side outage
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// Classify the failure
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::AuthenticationFailed => FailureKind::Authentication,
            Self::RateLimitExceeded(_) => FailureKind::RateLimited,
            Self::InvalidRequest(_) | Self::ModelNotFound(_) | Self::ConfigurationError(_) => {
                FailureKind::InvalidRequest
            }
            Self::ServiceUnavailable(_) => FailureKind::Unavailable,
            Self::SerializationError(_) | Self::UnexpectedResponse(_) => {
                FailureKind::MalformedResponse
            }
            Self::HttpError(e) if e.is_timeout() => FailureKind::Timeout,
            Self::HttpError(e) if e.is_decode() => FailureKind::MalformedResponse,
            Self::HttpError(_) => FailureKind::Network,
            Self::RequestFailed(_) => FailureKind::Other,
        }
    }
}

impl From<LLMError> for analyst_core::Error {
    fn from(err: LLMError) -> Self {
        analyst_core::Error::upstream(err.kind(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(LLMError::AuthenticationFailed.kind(), FailureKind::Authentication);
        assert_eq!(
            LLMError::RateLimitExceeded("retry later".into()).kind(),
            FailureKind::RateLimited
        );
        assert_eq!(
            LLMError::ModelNotFound("gpt-x".into()).kind(),
            FailureKind::InvalidRequest
        );
        assert_eq!(
            LLMError::UnexpectedResponse("no choices".into()).kind(),
            FailureKind::MalformedResponse
        );
    }

    #[test]
    fn test_conversion_keeps_kind() {
        let core: analyst_core::Error = LLMError::ServiceUnavailable("502".into()).into();
        assert_eq!(core.failure_kind(), FailureKind::Unavailable);
        assert!(core.to_string().contains("Service unavailable"));
    }
}
