//! Error types surfaced by the API client.
//!
//! Every failure that leaves the client is an [`ApiError`]. Errors are `Clone`
//! because a single in-flight call can settle many deduplicated callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::schema::RetryableErrors;

/// Network-level failure classes reported by a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorCode {
    ConnectionAborted,
    ConnectionReset,
    ConnectionRefused,
    HostNotFound,
    TimedOut,
    Other,
}

impl TransportErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorCode::ConnectionAborted => "connection_aborted",
            TransportErrorCode::ConnectionReset => "connection_reset",
            TransportErrorCode::ConnectionRefused => "connection_refused",
            TransportErrorCode::HostNotFound => "host_not_found",
            TransportErrorCode::TimedOut => "timed_out",
            TransportErrorCode::Other => "other",
        }
    }
}

impl std::fmt::Display for TransportErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`crate::ApiService`] and its building blocks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The breaker for this endpoint is open; no call was attempted.
    #[error("Circuit open for endpoint '{endpoint}'")]
    CircuitOpen { endpoint: String },

    /// The request never produced an HTTP response.
    #[error("Transport error ({code}): {message}")]
    Transport {
        code: TransportErrorCode,
        message: String,
    },

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Deserialization(String),

    /// The backend envelope reported a failure (`success: false`).
    #[error("Request rejected by backend: {0}")]
    Rejected(String),

    /// The client was built with an unusable configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Coarse classification used by callers to pick a user-visible behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CircuitOpen,
    Transient,
    Permanent,
    Deserialization,
}

impl ApiError {
    pub fn transport(code: TransportErrorCode, message: impl Into<String>) -> Self {
        ApiError::Transport {
            code,
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify against the default retryable set.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            ApiError::Deserialization(_) => ErrorKind::Deserialization,
            other if RetryableErrors::default().matches(other) => ErrorKind::Transient,
            _ => ErrorKind::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

/// Result type for API client operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::CircuitOpen {
            endpoint: "GET /api/plans".into(),
        };
        assert_eq!(err.to_string(), "Circuit open for endpoint 'GET /api/plans'");

        let err = ApiError::transport(TransportErrorCode::ConnectionReset, "socket hang up");
        assert_eq!(
            err.to_string(),
            "Transport error (connection_reset): socket hang up"
        );
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            ApiError::transport(TransportErrorCode::TimedOut, "deadline").kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            ApiError::Http { status: 503, message: "Service Unavailable".into() }.kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            ApiError::Http { status: 429, message: "Too Many Requests".into() }.kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            ApiError::Http { status: 404, message: "Not Found".into() }.kind(),
            ErrorKind::Permanent
        );
        assert_eq!(
            ApiError::Deserialization("expected value".into()).kind(),
            ErrorKind::Deserialization
        );
        assert_eq!(
            ApiError::CircuitOpen { endpoint: "x".into() }.kind(),
            ErrorKind::CircuitOpen
        );
    }

    #[test]
    fn test_transport_code_serde_names() {
        let code: TransportErrorCode = serde_json::from_str("\"host_not_found\"").unwrap();
        assert_eq!(code, TransportErrorCode::HostNotFound);
        assert_eq!(code.to_string(), "host_not_found");
    }
}
