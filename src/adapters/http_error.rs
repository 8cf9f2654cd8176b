//! HTTP status classification shared by the remote adapters.

use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::infrastructure::logging::scrub_secrets;

/// Longest upstream body kept in an error message
const MAX_BODY_CHARS: usize = 500;

/// Errors that can occur when calling a remote model API
#[derive(Error, Debug)]
pub enum HttpApiError {
    /// Invalid request parameters (HTTP 400, 422)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid or missing API key (HTTP 401)
    #[error("Invalid API key - authentication failed")]
    InvalidApiKey,

    /// Permission denied (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown model or endpoint (HTTP 404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limit or quota exceeded (HTTP 429)
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Server error (HTTP 5xx, 529)
    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// Request timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not match the expected envelope
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Missing API key
    #[error("API key not set: configure api_key or set {0}")]
    MissingApiKey(&'static str),

    /// Unknown or unexpected status
    #[error("Unexpected status ({0}): {1}")]
    Unexpected(StatusCode, String),
}

impl HttpApiError {
    /// Classify a non-success response
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = truncate_body(&scrub_secrets(body));
        match status.as_u16() {
            400 | 422 => Self::InvalidRequest(body),
            401 => Self::InvalidApiKey,
            403 => Self::Forbidden(body),
            404 => Self::NotFound(body),
            429 => Self::RateLimitExceeded(body),
            500..=599 => Self::ServerError(status, body),
            _ => Self::Unexpected(status, body),
        }
    }

    /// Classify a transport failure
    pub fn from_reqwest(err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs)
        } else if err.is_decode() {
            Self::MalformedResponse(scrub_secrets(&err.to_string()))
        } else {
            Self::Network(scrub_secrets(&err.to_string()))
        }
    }

    /// Returns true if a later retry could succeed
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded(_) | Self::ServerError(_, _) | Self::Timeout(_) | Self::Network(_)
        )
    }

    pub fn into_embedding_error(self) -> DomainError {
        DomainError::EmbeddingProviderUnavailable(self.to_string())
    }

    pub fn into_generation_error(self) -> DomainError {
        DomainError::GenerationFailed(self.to_string())
    }
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
