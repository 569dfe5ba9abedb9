//! Inbound response handling.
//!
//! # Responsibilities
//! - Decode success bodies as JSON
//! - Extract a human-readable message from error bodies

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Fields checked, in order, for an error message in a JSON error body.
const MESSAGE_FIELDS: [&str; 3] = ["message", "erro", "error"];

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn json(status: StatusCode, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body; an empty body decodes to `null`.
    pub fn decode_value(&self) -> ApiResult<Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Message for an error response: the body's message field, else the status reason.
    pub fn error_message(&self) -> String {
        let from_body = serde_json::from_slice::<Value>(&self.body).ok().and_then(|body| {
            MESSAGE_FIELDS
                .iter()
                .find_map(|field| body.get(*field).and_then(Value::as_str).map(str::to_string))
        });

        from_body.unwrap_or_else(|| {
            self.status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", self.status.as_u16()))
        })
    }

    /// Map a non-success response to [`ApiError::Http`].
    pub fn into_error(self) -> ApiError {
        ApiError::Http {
            status: self.status.as_u16(),
            message: self.error_message(),
        }
    }
}
