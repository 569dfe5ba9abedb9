//! Circuit breaker registry.
//!
//! One breaker per endpoint key, created lazily on first use.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: endpoint assumed down, requests fail fast
//! - Half-Open: recovery probes allowed
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= threshold
//! Open → Half-Open: open timeout elapsed since last failure (checked in can_attempt)
//! Half-Open → Closed: any success
//! Half-Open → Open: probe fails
//! ```
//!
//! A single success fully closes a breaker regardless of its prior state.

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Breaker state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

#[derive(Debug, Clone)]
struct Breaker {
    failure_count: u32,
    last_failure: Option<Instant>,
    state: CircuitState,
}

impl Default for Breaker {
    fn default() -> Self {
        Self {
            failure_count: 0,
            last_failure: None,
            state: CircuitState::Closed,
        }
    }
}

/// Read-only view of one breaker, as reported by system health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    /// Milliseconds since the most recent failure, if any.
    pub last_failure_ms_ago: Option<u64>,
}

/// Registry of per-endpoint circuit breakers.
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Breaker>,
    config: CircuitBreakerConfig,
}

impl CircuitBreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            config,
        }
    }

    /// Whether a call to `endpoint` may proceed right now.
    ///
    /// An open breaker whose timeout has elapsed moves to half-open here.
    pub fn can_attempt(&self, endpoint: &str) -> bool {
        let settings = self.config.settings_for(endpoint);
        let mut breaker = self.breakers.entry(endpoint.to_string()).or_default();
        let state = breaker.state;

        match state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed = breaker
                    .last_failure
                    .map(|at| Instant::now().saturating_duration_since(at));
                match elapsed {
                    Some(elapsed) if elapsed < settings.open_timeout() => false,
                    _ => {
                        breaker.state = CircuitState::HalfOpen;
                        drop(breaker);
                        tracing::info!(endpoint = %endpoint, "Circuit half-open, allowing probe");
                        metrics::record_circuit_state(endpoint, CircuitState::HalfOpen);
                        true
                    }
                }
            }
        }
    }

    /// Record a successful call: reset failures and close the breaker.
    pub fn record_success(&self, endpoint: &str) {
        let mut breaker = self.breakers.entry(endpoint.to_string()).or_default();
        let previous = breaker.state;
        breaker.failure_count = 0;
        breaker.state = CircuitState::Closed;
        drop(breaker);

        if previous != CircuitState::Closed {
            tracing::info!(endpoint = %endpoint, from = ?previous, "Circuit closed");
            metrics::record_circuit_state(endpoint, CircuitState::Closed);
        }
    }

    /// Record a failed call; opens the breaker once the threshold is reached.
    pub fn record_failure(&self, endpoint: &str) {
        let settings = self.config.settings_for(endpoint);
        let mut breaker = self.breakers.entry(endpoint.to_string()).or_default();
        breaker.failure_count = breaker.failure_count.saturating_add(1);
        breaker.last_failure = Some(Instant::now());

        let failures = breaker.failure_count;
        let previous = breaker.state;
        if failures >= settings.threshold {
            breaker.state = CircuitState::Open;
        }
        let current = breaker.state;
        drop(breaker);

        if current == CircuitState::Open && previous != CircuitState::Open {
            tracing::warn!(
                endpoint = %endpoint,
                failures,
                threshold = settings.threshold,
                open_timeout = ?settings.open_timeout(),
                "Circuit opened"
            );
            metrics::record_circuit_state(endpoint, CircuitState::Open);
        } else {
            tracing::debug!(endpoint = %endpoint, failures, "Failure recorded");
        }
    }

    /// Restore one breaker, or all of them, to closed with zero failures.
    pub fn reset(&self, endpoint: Option<&str>) {
        match endpoint {
            Some(endpoint) => {
                if let Some(mut breaker) = self.breakers.get_mut(endpoint) {
                    *breaker = Breaker::default();
                }
                tracing::info!(endpoint = %endpoint, "Circuit breaker reset");
                metrics::record_circuit_state(endpoint, CircuitState::Closed);
            }
            None => {
                for mut entry in self.breakers.iter_mut() {
                    *entry.value_mut() = Breaker::default();
                }
                tracing::info!("All circuit breakers reset");
            }
        }
    }

    /// Current state; unknown endpoints are closed.
    pub fn state(&self, endpoint: &str) -> CircuitState {
        self.breakers
            .get(endpoint)
            .map(|b| b.state)
            .unwrap_or(CircuitState::Closed)
    }

    /// Consecutive failures since the last success or reset.
    pub fn failure_count(&self, endpoint: &str) -> u32 {
        self.breakers
            .get(endpoint)
            .map(|b| b.failure_count)
            .unwrap_or(0)
    }

    /// Snapshot of every known breaker, ordered by endpoint key.
    pub fn snapshot(&self) -> BTreeMap<String, BreakerSnapshot> {
        let now = Instant::now();
        self.breakers
            .iter()
            .map(|entry| {
                let breaker = entry.value();
                let snapshot = BreakerSnapshot {
                    state: breaker.state,
                    failure_count: breaker.failure_count,
                    last_failure_ms_ago: breaker
                        .last_failure
                        .map(|at| {
                            let elapsed = now.saturating_duration_since(at).as_millis();
                            u64::try_from(elapsed).unwrap_or(u64::MAX)
                        }),
                };
                (entry.key().clone(), snapshot)
            })
            .collect()
    }
}
