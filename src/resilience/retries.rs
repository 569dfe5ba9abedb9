//! Retry orchestration.
//!
//! # Responsibilities
//! - Fail fast when the endpoint's circuit is open
//! - Run an attempt, recording every outcome on the breaker
//! - Retry transient failures with exponential backoff
//! - Surface permanent failures immediately
//!
//! # Design Decisions
//! - The breaker is consulted once, before the attempt series
//! - A failed attempt always updates the breaker before the retry decision
//! - Retryability is part of `RetryConfig` so callers can widen or narrow it per call

use std::future::Future;
use std::sync::Arc;

use crate::config::RetryConfig;
use crate::error::{ApiError, ApiResult};
use crate::observability::metrics;
use crate::resilience::backoff::{Backoff, Sleeper, TokioSleeper};
use crate::resilience::circuit_breaker::CircuitBreakerRegistry;

/// Wraps single logical calls with breaker-aware retry.
#[derive(Clone)]
pub struct RetryExecutor {
    breakers: Arc<CircuitBreakerRegistry>,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryExecutor {
    pub fn new(breakers: Arc<CircuitBreakerRegistry>) -> Self {
        Self::with_sleeper(breakers, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(breakers: Arc<CircuitBreakerRegistry>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { breakers, sleeper }
    }

    pub fn breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.breakers
    }

    /// Run `attempt` up to `max_retries + 1` times.
    ///
    /// Returns the first success, the first non-retryable error, or the last
    /// error once attempts are exhausted.
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        endpoint: &str,
        config: &RetryConfig,
        mut attempt: F,
    ) -> ApiResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        if !self.breakers.can_attempt(endpoint) {
            tracing::warn!(endpoint = %endpoint, "Circuit open, failing fast");
            metrics::record_circuit_rejection(endpoint);
            return Err(ApiError::CircuitOpen {
                endpoint: endpoint.to_string(),
            });
        }

        let max_attempts = config.max_retries.saturating_add(1);
        let mut backoff = Backoff::from_config(config);
        let mut attempts = 0;

        loop {
            attempts += 1;

            match attempt().await {
                Ok(value) => {
                    self.breakers.record_success(endpoint);
                    if attempts > 1 {
                        tracing::info!(endpoint = %endpoint, attempts, "Request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    self.breakers.record_failure(endpoint);

                    if !config.retryable.matches(&err) {
                        tracing::debug!(endpoint = %endpoint, error = %err, "Permanent failure, not retrying");
                        return Err(err);
                    }
                    if attempts >= max_attempts {
                        tracing::warn!(endpoint = %endpoint, attempts, error = %err, "Retries exhausted");
                        return Err(err);
                    }

                    let delay = backoff.next_delay();
                    tracing::info!(
                        endpoint = %endpoint,
                        attempt = attempts,
                        delay = ?delay,
                        error = %err,
                        "Retrying request"
                    );
                    metrics::record_retry(endpoint);
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }
}
