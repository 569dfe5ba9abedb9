//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, TransportErrorCode};

/// Root configuration for the API client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend endpoint settings.
    pub api: ApiConfig,

    /// Default retry policy (overridable per call).
    pub retries: RetryConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Circuit breaker settings.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Deployment environment the client runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "preview" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Deployment environment.
    pub environment: Environment,

    /// Base address every request path is appended to.
    pub base_url: String,

    /// Per-attempt request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            base_url: "http://localhost:5000".to_string(),
            timeout_ms: 30_000,
            connect_timeout_ms: 5_000,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts beyond the first.
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound for any single delay in milliseconds.
    pub max_delay_ms: u64,

    /// Growth factor applied to the delay after each retry.
    pub backoff_multiplier: f64,

    /// Add up to 10% random jitter to each delay.
    pub jitter: bool,

    /// Failures that are worth retrying.
    pub retryable: RetryableErrors,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter: false,
            retryable: RetryableErrors::default(),
        }
    }
}

/// Classifiers marking a failure as transient.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryableErrors {
    /// Transport failure codes.
    pub error_codes: Vec<TransportErrorCode>,

    /// HTTP response statuses.
    pub statuses: Vec<u16>,

    /// Case-insensitive substrings of a transport error message.
    pub message_keywords: Vec<String>,
}

impl RetryableErrors {
    /// Whether `error` should be retried under this policy.
    ///
    /// An HTTP status is authoritative: message keywords are only consulted for
    /// failures that never reached the backend.
    pub fn matches(&self, error: &ApiError) -> bool {
        match error {
            ApiError::Transport { code, message } => {
                self.error_codes.contains(code) || self.message_matches(message)
            }
            ApiError::Http { status, .. } => self.statuses.contains(status),
            ApiError::CircuitOpen { .. }
            | ApiError::Deserialization(_)
            | ApiError::Rejected(_)
            | ApiError::Configuration(_) => false,
        }
    }

    fn message_matches(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.message_keywords
            .iter()
            .any(|keyword| message.contains(&keyword.to_lowercase()))
    }
}

impl Default for RetryableErrors {
    fn default() -> Self {
        Self {
            error_codes: vec![
                TransportErrorCode::ConnectionAborted,
                TransportErrorCode::ConnectionReset,
                TransportErrorCode::ConnectionRefused,
                TransportErrorCode::HostNotFound,
                TransportErrorCode::TimedOut,
            ],
            statuses: vec![408, 429, 500, 502, 503, 504],
            message_keywords: vec![
                "timeout".to_string(),
                "network error".to_string(),
                "connection".to_string(),
                "econnreset".to_string(),
            ],
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied when a call does not specify one, in milliseconds.
    pub default_ttl_ms: u64,

    /// Interval of the background sweep in milliseconds.
    pub sweep_interval_ms: u64,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 300_000,
            sweep_interval_ms: 60_000,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the breaker.
    pub threshold: u32,

    /// How long an open breaker rejects calls, in milliseconds.
    pub open_timeout_ms: u64,

    /// Per-endpoint settings keyed by endpoint key.
    pub overrides: HashMap<String, BreakerSettings>,
}

impl CircuitBreakerConfig {
    /// Effective settings for one endpoint key.
    pub fn settings_for(&self, endpoint: &str) -> BreakerSettings {
        self.overrides
            .get(endpoint)
            .copied()
            .unwrap_or(BreakerSettings {
                threshold: self.threshold,
                open_timeout_ms: self.open_timeout_ms,
            })
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            open_timeout_ms: 60_000,
            overrides: HashMap::new(),
        }
    }
}

/// Threshold and open timeout for a single breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct BreakerSettings {
    pub threshold: u32,
    pub open_timeout_ms: u64,
}

impl BreakerSettings {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.retries.max_retries, 3);
        assert_eq!(config.retries.base_delay(), Duration::from_secs(1));
        assert_eq!(config.retries.max_delay(), Duration::from_secs(10));
        assert_eq!(config.circuit_breaker.threshold, 5);
        assert_eq!(config.cache.default_ttl(), Duration::from_secs(300));
        assert_eq!(config.cache.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://backend.internal"

            [retries]
            max_retries = 5
            retryable = { statuses = [503] }
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://backend.internal");
        assert_eq!(config.api.timeout_ms, 30_000);
        assert_eq!(config.retries.max_retries, 5);
        assert_eq!(config.retries.retryable.statuses, vec![503]);
        assert_eq!(
            config.retries.retryable.error_codes,
            RetryableErrors::default().error_codes
        );
    }

    #[test]
    fn test_breaker_overrides() {
        let config: ClientConfig = toml::from_str(
            r#"
            [circuit_breaker]
            threshold = 5

            [circuit_breaker.overrides."POST /api/questoes/gerar"]
            threshold = 2
            open_timeout_ms = 1000
            "#,
        )
        .unwrap();

        let cb = &config.circuit_breaker;
        assert_eq!(cb.settings_for("GET /api/plans").threshold, 5);
        assert_eq!(cb.settings_for("POST /api/questoes/gerar").threshold, 2);
        assert_eq!(
            cb.settings_for("POST /api/questoes/gerar").open_timeout(),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_retryable_classification() {
        let policy = RetryableErrors::default();

        assert!(policy.matches(&ApiError::transport(TransportErrorCode::ConnectionReset, "reset")));
        assert!(policy.matches(&ApiError::transport(TransportErrorCode::Other, "Network Error")));
        assert!(!policy.matches(&ApiError::transport(TransportErrorCode::Other, "certificate rejected")));

        for status in [408, 429, 500, 502, 503, 504] {
            assert!(policy.matches(&ApiError::Http { status, message: String::new() }));
        }
        for status in [400, 401, 404, 422] {
            assert!(!policy.matches(&ApiError::Http { status, message: "connection field invalid".into() }));
        }
        assert!(!policy.matches(&ApiError::Deserialization("timeout".into())));
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("Preview".parse::<Environment>().unwrap(), Environment::Staging);
        assert!("qa".parse::<Environment>().is_err());
    }
}
