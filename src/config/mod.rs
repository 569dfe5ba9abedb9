//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: API_BASE_URL, API_TIMEOUT_MS, ...)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → handed to ApiService at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the service is built
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    ApiConfig, BreakerSettings, CacheConfig, CircuitBreakerConfig, ClientConfig, Environment,
    ObservabilityConfig, RetryConfig, RetryableErrors,
};
