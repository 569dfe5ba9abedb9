//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Logical request:
//!     → dedup.rs (join an identical pending request, or start one)
//!     → retries.rs (breaker gate, then attempt series)
//!         → circuit_breaker.rs (fail fast while open, record every outcome)
//!         → timeouts.rs (each attempt has a deadline)
//!         → backoff.rs (delay before the next transient retry)
//! ```
//!
//! # Design Decisions
//! - Every transport attempt has a deadline
//! - Only transient failures are retried; permanent ones surface at once
//! - Breakers are per endpoint key so one failing endpoint does not block others

pub mod backoff;
pub mod circuit_breaker;
pub mod dedup;
pub mod retries;
pub mod timeouts;
