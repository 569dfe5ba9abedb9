//! Resilient client for the exam-prep backend API.
//!
//! Wraps HTTP calls with per-endpoint circuit breakers, a TTL response cache,
//! in-flight request deduplication and exponential-backoff retries.

// Core subsystems
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod service;

// Cross-cutting concerns
pub mod observability;
pub mod resilience;

pub use config::schema::ClientConfig;
pub use error::{ApiError, ApiResult, ErrorKind};
pub use http::{RequestHooks, Session, Transport};
pub use service::{ApiService, RequestOptions, SystemHealth};
