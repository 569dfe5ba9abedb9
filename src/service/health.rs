//! Diagnostic snapshot of the service's shared state.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::CacheStats;
use crate::resilience::circuit_breaker::{BreakerSnapshot, CircuitState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub circuit_breakers: BTreeMap<String, BreakerSnapshot>,
    pub cache_stats: CacheStats,
    pub active_request_count: usize,
}

impl SystemHealth {
    /// Endpoint keys whose breaker is not closed.
    pub fn tripped(&self) -> Vec<&str> {
        self.circuit_breakers
            .iter()
            .filter(|(_, b)| b.state != CircuitState::Closed)
            .map(|(endpoint, _)| endpoint.as_str())
            .collect()
    }

    pub fn is_healthy(&self) -> bool {
        self.tripped().is_empty()
    }
}
