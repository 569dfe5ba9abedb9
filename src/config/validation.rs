//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field rules.
//! Validation collects every problem instead of stopping at the first.

use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning all problems found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.api.base_url.trim().is_empty() {
        errors.push(ValidationError::new("api.base_url", "base URL is required"));
    } else {
        match Url::parse(&config.api.base_url) {
            Ok(url) => {
                if !config.api.environment.is_development() && url.scheme() != "https" {
                    errors.push(ValidationError::new(
                        "api.base_url",
                        "https is required outside development",
                    ));
                }
            }
            Err(e) => errors.push(ValidationError::new(
                "api.base_url",
                format!("invalid URL '{}': {}", config.api.base_url, e),
            )),
        }
    }

    if config.api.timeout_ms == 0 {
        errors.push(ValidationError::new("api.timeout_ms", "must be greater than 0"));
    }

    let retries = &config.retries;
    if !(retries.backoff_multiplier >= 1.0) {
        errors.push(ValidationError::new(
            "retries.backoff_multiplier",
            "must be at least 1.0",
        ));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }

    if config.circuit_breaker.threshold == 0 {
        errors.push(ValidationError::new(
            "circuit_breaker.threshold",
            "must be at least 1",
        ));
    }
    if config
        .circuit_breaker
        .overrides
        .values()
        .any(|settings| settings.threshold == 0)
    {
        errors.push(ValidationError::new(
            "circuit_breaker.overrides",
            "every override threshold must be at least 1",
        ));
    }

    if config.cache.sweep_interval_ms == 0 {
        errors.push(ValidationError::new(
            "cache.sweep_interval_ms",
            "must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
