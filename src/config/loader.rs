//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { key: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { key, value } => {
                write!(f, "Invalid value '{}' for environment variable {}", value, key)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load a TOML file, apply environment overrides and validate.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: ClientConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build a configuration from defaults and environment variables only.
pub fn load_from_env() -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts the environment so callers can supply a fixed map.
pub fn apply_env_overrides<F>(config: &mut ClientConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("APP_ENV") {
        config.api.environment = value.parse().map_err(|_| ConfigError::Env {
            key: "APP_ENV",
            value,
        })?;
    }
    if let Some(value) = lookup("API_BASE_URL") {
        config.api.base_url = value;
    }

    override_number(&lookup, "API_TIMEOUT_MS", &mut config.api.timeout_ms)?;
    override_number(&lookup, "API_RETRY_ATTEMPTS", &mut config.retries.max_retries)?;
    override_number(&lookup, "API_RETRY_DELAY_MS", &mut config.retries.base_delay_ms)?;
    override_number(&lookup, "API_MAX_RETRY_DELAY_MS", &mut config.retries.max_delay_ms)?;
    override_number(
        &lookup,
        "CIRCUIT_BREAKER_THRESHOLD",
        &mut config.circuit_breaker.threshold,
    )?;
    override_number(
        &lookup,
        "CIRCUIT_BREAKER_TIMEOUT_MS",
        &mut config.circuit_breaker.open_timeout_ms,
    )?;
    override_number(&lookup, "CACHE_DEFAULT_TTL_MS", &mut config.cache.default_ttl_ms)?;

    Ok(())
}

fn override_number<F, N>(lookup: &F, key: &'static str, target: &mut N) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    N: std::str::FromStr,
{
    if let Some(value) = lookup(key) {
        *target = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Env { key, value })?;
    }
    Ok(())
}
