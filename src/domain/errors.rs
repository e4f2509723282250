//! Domain errors for the Glimpse engine.

use std::time::Duration;

use thiserror::Error;

/// Domain-level errors that can occur while glimpsing.
///
/// Redial, cancellation, staleness and clarifier blocks are *not* errors;
/// they are reported through [`GlimpseStatus`](crate::domain::models::GlimpseStatus).
#[derive(Debug, Error)]
pub enum GlimpseError {
    #[error("Sampler failed: {0}")]
    SamplerFailed(String),

    #[error("Sampler timed out after {0:?}")]
    SamplerTimeout(Duration),

    #[error("Sampler task aborted: {0}")]
    SamplerAborted(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GlimpseError {
    /// Whether this error is a timeout-class failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::SamplerTimeout(_))
    }

    /// Variant name without its payload. Payloads may echo draft content, so
    /// logs on the glimpse path record this instead of the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SamplerFailed(_) => "sampler_failed",
            Self::SamplerTimeout(_) => "sampler_timeout",
            Self::SamplerAborted(_) => "sampler_aborted",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Serialization(_) => "serialization",
        }
    }
}

pub type DomainResult<T> = Result<T, GlimpseError>;

impl From<serde_json::Error> for GlimpseError {
    fn from(err: serde_json::Error) -> Self {
        GlimpseError::Serialization(err.to_string())
    }
}

impl From<tokio::task::JoinError> for GlimpseError {
    fn from(err: tokio::task::JoinError) -> Self {
        GlimpseError::SamplerAborted(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_omits_payload() {
        let err = GlimpseError::SamplerFailed("Drop the users table".to_string());
        assert_eq!(err.kind(), "sampler_failed");
        assert!(!err.kind().contains("users"));
        assert_eq!(
            GlimpseError::SamplerTimeout(Duration::from_secs(2)).kind(),
            "sampler_timeout"
        );
    }

    #[test]
    fn test_only_timeouts_are_timeout_class() {
        assert!(GlimpseError::SamplerTimeout(Duration::ZERO).is_timeout());
        assert!(!GlimpseError::SamplerAborted("panic".to_string()).is_timeout());
    }
}
