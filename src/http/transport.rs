//! Network transport.
//!
//! # Responsibilities
//! - Send a prepared request and return status, headers and body
//! - Classify network failures into [`TransportErrorCode`]s
//!
//! # Design Decisions
//! - HTTP error statuses are not failures here; the client interprets them
//! - The reqwest client is built once and shared by every attempt

use std::error::Error as StdError;
use std::io;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult, TransportErrorCode};
use crate::http::request::TransportRequest;
use crate::http::response::TransportResponse;

/// Sends one request attempt.
pub trait Transport: Send + Sync {
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, ApiResult<TransportResponse>>;
}

/// Production transport over a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("resilient-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, ApiResult<TransportResponse>> {
        async move {
            let mut builder = self
                .client
                .request(request.method, request.url)
                .headers(request.headers);
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(map_reqwest_error)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(map_reqwest_error)?;

            Ok(TransportResponse {
                status,
                headers,
                body: body.to_vec(),
            })
        }
        .boxed()
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    ApiError::transport(classify(&err), err.to_string())
}

/// Walk the error chain looking for a recognizable network failure.
fn classify(err: &reqwest::Error) -> TransportErrorCode {
    if err.is_timeout() {
        return TransportErrorCode::TimedOut;
    }

    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if let Some(code) = classify_io(io_err.kind()) {
                return code;
            }
        }
        let text = cause.to_string().to_ascii_lowercase();
        if text.contains("dns") || text.contains("failed to lookup") || text.contains("resolve") {
            return TransportErrorCode::HostNotFound;
        }
        source = cause.source();
    }

    if err.is_connect() {
        TransportErrorCode::ConnectionRefused
    } else {
        TransportErrorCode::Other
    }
}

fn classify_io(kind: io::ErrorKind) -> Option<TransportErrorCode> {
    match kind {
        io::ErrorKind::ConnectionReset => Some(TransportErrorCode::ConnectionReset),
        io::ErrorKind::ConnectionAborted | io::ErrorKind::UnexpectedEof | io::ErrorKind::BrokenPipe => {
            Some(TransportErrorCode::ConnectionAborted)
        }
        io::ErrorKind::ConnectionRefused => Some(TransportErrorCode::ConnectionRefused),
        io::ErrorKind::TimedOut => Some(TransportErrorCode::TimedOut),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_kinds_map_to_codes() {
        assert_eq!(
            classify_io(io::ErrorKind::ConnectionReset),
            Some(TransportErrorCode::ConnectionReset)
        );
        assert_eq!(
            classify_io(io::ErrorKind::ConnectionRefused),
            Some(TransportErrorCode::ConnectionRefused)
        );
        assert_eq!(
            classify_io(io::ErrorKind::BrokenPipe),
            Some(TransportErrorCode::ConnectionAborted)
        );
        assert_eq!(classify_io(io::ErrorKind::NotFound), None);
    }

    #[test]
    fn test_transport_builds_from_config() {
        assert!(ReqwestTransport::new(&ApiConfig::default()).is_ok());
    }
}
