//! Error taxonomy for every failure the connector can surface.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, timeout, DNS).
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// HTTP 401 or 403.
    #[error("Authentication failed (HTTP {}): {message}", .status.as_u16())]
    Auth { status: StatusCode, message: String },

    /// HTTP 400 or 422.
    #[error("Request rejected (HTTP {}): {message}", .status.as_u16())]
    Validation { status: StatusCode, message: String },

    /// HTTP 404.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Any other 4xx except 429.
    #[error("Request error (HTTP {}): {message}", .status.as_u16())]
    Client { status: StatusCode, message: String },

    /// HTTP 429, with the server's requested wait when it sent one.
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        retry_after: Option<Duration>,
        message: String,
    },

    /// HTTP 5xx.
    #[error("Server error (HTTP {}): {message}", .status.as_u16())]
    Server { status: StatusCode, message: String },

    /// A response body that does not match the expected shape.
    #[error("Failed to decode response: {message}")]
    Decoding {
        status: Option<StatusCode>,
        message: String,
    },

    #[error("No active session for {path}. Log in first.")]
    MissingCredential { path: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ApiError>,
    },
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network {
            message: message.into(),
            source: None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ApiError::Config {
            message: message.into(),
        }
    }

    pub fn decoding(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        ApiError::Decoding {
            status,
            message: message.into(),
        }
    }

    /// Transient failures that may succeed when re-attempted.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network { .. } | ApiError::RateLimit { .. } | ApiError::Server { .. }
        )
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Auth { status, .. }
            | ApiError::Validation { status, .. }
            | ApiError::Client { status, .. }
            | ApiError::Server { status, .. } => Some(*status),
            ApiError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            ApiError::RateLimit { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            ApiError::Decoding { status, .. } => *status,
            ApiError::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// The classified failure behind a `RetriesExhausted` wrapper.
    pub fn root_cause(&self) -> &ApiError {
        match self {
            ApiError::RetriesExhausted { last, .. } => last.root_cause(),
            other => other,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            return ApiError::config(error.to_string());
        }
        if error.is_decode() {
            return ApiError::decoding(error.status(), error.to_string());
        }

        let message = if error.is_timeout() {
            format!("request timed out ({})", error)
        } else if error.is_connect() {
            format!("connection failed ({})", error)
        } else {
            error.to_string()
        };
        ApiError::Network {
            message,
            source: Some(error),
        }
    }
}
