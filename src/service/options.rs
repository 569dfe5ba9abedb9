//! Per-call request options.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use crate::config::RetryConfig;

/// Options for a single logical request.
///
/// Defaults: not cached, deduplicated, service-wide retry policy, endpoint
/// key `"METHOD path"`.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub body: Option<Value>,
    pub params: BTreeMap<String, String>,
    /// Only honored for GET and HEAD.
    pub cacheable: bool,
    /// `None` uses the cache's default TTL.
    pub cache_ttl: Option<Duration>,
    /// `None` uses the service-wide retry policy.
    pub retry: Option<RetryConfig>,
    /// Circuit breaker key; `None` derives it from method and path.
    pub endpoint: Option<String>,
    pub dedupe: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            body: None,
            params: BTreeMap::new(),
            cacheable: false,
            cache_ttl: None,
            retry: None,
            endpoint: None,
            dedupe: true,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn cached(mut self) -> Self {
        self.cacheable = true;
        self
    }

    /// Cache with an explicit TTL.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cacheable = true;
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn no_dedupe(mut self) -> Self {
        self.dedupe = false;
        self
    }
}
