//! Diagnostic counters.
//!
//! # Metrics
//! - `api_requests_total` (counter): completed logical requests by endpoint, outcome
//! - `api_request_duration_seconds` (histogram): end-to-end latency incl. retries
//! - `api_retries_total` (counter): retry sleeps by endpoint
//! - `api_circuit_rejections_total` (counter): fail-fast rejections by endpoint
//! - `api_circuit_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `api_cache_lookups_total` (counter): cache lookups by result (hit/miss)
//! - `api_cache_entries` (gauge): current cache size
//! - `api_dedup_joins_total` (counter): callers served by an in-flight request
//!
//! Updates go through the `metrics` facade and are no-ops until the host
//! application installs a recorder.

use std::time::Instant;

use metrics::{counter, gauge, histogram};

use crate::resilience::circuit_breaker::CircuitState;

pub fn record_request(endpoint: &str, outcome: &'static str, start: Instant) {
    counter!("api_requests_total", "endpoint" => endpoint.to_string(), "outcome" => outcome)
        .increment(1);
    histogram!("api_request_duration_seconds", "endpoint" => endpoint.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_retry(endpoint: &str) {
    counter!("api_retries_total", "endpoint" => endpoint.to_string()).increment(1);
}

pub fn record_circuit_rejection(endpoint: &str) {
    counter!("api_circuit_rejections_total", "endpoint" => endpoint.to_string()).increment(1);
}

pub fn record_circuit_state(endpoint: &str, state: CircuitState) {
    gauge!("api_circuit_state", "endpoint" => endpoint.to_string()).set(state as u8 as f64);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("api_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_size(size: usize) {
    gauge!("api_cache_entries").set(size as f64);
}

pub fn record_dedup_join() {
    counter!("api_dedup_joins_total").increment(1);
}
