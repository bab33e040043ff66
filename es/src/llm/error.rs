//! Upstream (completion service) error types

use std::time::Duration;
use thiserror::Error;

use super::http::is_retryable_status;

/// Errors that can occur while talking to the completion service
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Completion service returned no text")]
    EmptyResponse,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Client configuration error: {0}")]
    Config(String),
}

impl UpstreamError {
    /// Whether another attempt at the same request might succeed
    ///
    /// 429 is not retried here; it reaches the caller as `RateLimited`.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::ApiError { status, .. } => is_retryable_status(*status),
            UpstreamError::Network(_) => true,
            UpstreamError::Timeout(_) => true,
            UpstreamError::RateLimited { .. }
            | UpstreamError::InvalidResponse(_)
            | UpstreamError::EmptyResponse
            | UpstreamError::Config(_) => false,
        }
    }
}
