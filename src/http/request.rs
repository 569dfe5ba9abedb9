//! Outbound request representation.

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use url::Url;

/// Header carrying the per-attempt request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// A fully prepared request handed to a [`crate::http::Transport`].
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl TransportRequest {
    pub fn request_id(&self) -> Option<&str> {
        self.headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
