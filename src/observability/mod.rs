//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (retries, breaker transitions, evictions, preload failures)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! The binary installs the subscriber via logging.rs; library users bring their own.
//! ```

pub mod logging;
pub mod metrics;
