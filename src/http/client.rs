//! Single-attempt HTTP client.
//!
//! # Responsibilities
//! - Build the target URL from base URL, path and query params
//! - Attach default headers and a fresh request ID per attempt
//! - Bound every attempt with the configured timeout
//! - Turn error statuses into [`ApiError::Http`] and success bodies into JSON

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::http::hooks::RequestHooks;
use crate::http::request::{TransportRequest, X_REQUEST_ID};
use crate::http::transport::Transport;
use crate::resilience::timeouts::with_deadline;

#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    hooks: Arc<dyn RequestHooks>,
    base_url: String,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        hooks: Arc<dyn RequestHooks>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            hooks,
            base_url: base_url.into(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str, params: &BTreeMap<String, String>) -> ApiResult<Url> {
        let base = self.base_url.trim_end_matches('/');
        let joined = if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        };

        let mut url = Url::parse(&joined)
            .map_err(|e| ApiError::Configuration(format!("invalid URL '{}': {}", joined, e)))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        Ok(url)
    }

    /// Perform one attempt and decode the JSON body.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        params: &BTreeMap<String, String>,
        body: Option<&Value>,
    ) -> ApiResult<Value> {
        let url = self.build_url(path, params)?;
        let request_id = Uuid::new_v4().to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert(X_REQUEST_ID, value);
        }
        self.hooks.on_before_request(&mut headers);

        tracing::debug!(
            method = %method,
            url = %url,
            request_id = %request_id,
            "Sending request"
        );

        let request = TransportRequest {
            method,
            url,
            headers,
            body: body.cloned(),
        };
        let response = with_deadline(self.timeout, self.transport.send(request)).await?;

        if response.status == StatusCode::UNAUTHORIZED {
            self.hooks.on_auth_expired();
        }
        if !response.is_success() {
            tracing::debug!(
                request_id = %request_id,
                status = response.status.as_u16(),
                "Request failed with error status"
            );
            return Err(response.into_error());
        }

        response.decode_value()
    }
}
