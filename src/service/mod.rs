//! API service facade.
//!
//! # Data Flow
//! ```text
//! request(method, path, options)
//!     → cache key (method + path + params + body)
//!     → cacheable and fresh? return cached value
//!     → dedup: join identical pending request, or start one
//!         → retry orchestrator (breaker gate, attempts, backoff)
//!             → http client → transport
//!         → on success: populate cache (before joiners settle)
//!     → typed decode (endpoints.rs unwraps backend envelopes)
//! ```
//!
//! # Design Decisions
//! - One service instance owns every registry; clones share it through an `Arc`
//! - Only GET and HEAD responses are ever cached, and never failure envelopes
//! - Cacheable and uncacheable calls never share an in-flight request
//! - The expiry sweep starts with the service and stops on `shutdown` or drop
//! - Breakers are keyed by endpoint (method + path template), caches by full request

pub mod endpoints;
pub mod health;
pub mod options;
pub mod types;

use std::sync::{Arc, Mutex};

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::{cache_key, CacheSweeper, SweeperHandle, TtlCache};
use crate::config::validation::validate_config;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpClient, ReqwestTransport, RequestHooks, Session, Transport};
use crate::observability::metrics;
use crate::resilience::backoff::{Sleeper, TokioSleeper};
use crate::resilience::circuit_breaker::CircuitBreakerRegistry;
use crate::resilience::dedup::InFlightRequests;
use crate::resilience::retries::RetryExecutor;

pub use health::SystemHealth;
pub use options::RequestOptions;

struct ServiceInner {
    config: ClientConfig,
    http: HttpClient,
    breakers: Arc<CircuitBreakerRegistry>,
    cache: Arc<TtlCache<Value>>,
    in_flight: InFlightRequests<ApiResult<Value>>,
    retry: RetryExecutor,
    session: Arc<Session>,
    sweeper: Mutex<Option<SweeperHandle>>,
}

/// Resilient client for the exam-prep backend.
///
/// Cheap to clone; all clones share breakers, cache and in-flight requests.
#[derive(Clone)]
pub struct ApiService {
    inner: Arc<ServiceInner>,
}

pub struct ApiServiceBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    hooks: Option<Arc<dyn RequestHooks>>,
    session: Option<Arc<Session>>,
    sleeper: Option<Arc<dyn Sleeper>>,
    background_sweep: bool,
}

impl ApiServiceBuilder {
    /// Replace the reqwest transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the request hooks. Defaults to the session.
    pub fn hooks(mut self, hooks: Arc<dyn RequestHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// Replace the backoff sleeper.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Start the cache sweeper from `build` when a tokio runtime is running.
    /// On by default.
    pub fn background_sweep(mut self, enabled: bool) -> Self {
        self.background_sweep = enabled;
        self
    }

    pub fn build(self) -> ApiResult<ApiService> {
        validate_config(&self.config).map_err(|errors| {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            ApiError::Configuration(joined)
        })?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.config.api)?),
        };
        let session = self.session.unwrap_or_else(|| Arc::new(Session::new()));
        let hooks = self
            .hooks
            .unwrap_or_else(|| Arc::clone(&session) as Arc<dyn RequestHooks>);
        let sleeper = self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper));

        let http = HttpClient::new(
            transport,
            hooks,
            self.config.api.base_url.clone(),
            self.config.api.timeout(),
        );
        let breakers = Arc::new(CircuitBreakerRegistry::new(self.config.circuit_breaker.clone()));
        let cache = Arc::new(TtlCache::new(self.config.cache.default_ttl()));
        let retry = RetryExecutor::with_sleeper(Arc::clone(&breakers), sleeper);

        tracing::info!(
            base_url = %self.config.api.base_url,
            environment = ?self.config.api.environment,
            "API service ready"
        );

        let service = ApiService {
            inner: Arc::new(ServiceInner {
                config: self.config,
                http,
                breakers,
                cache,
                in_flight: InFlightRequests::new(),
                retry,
                session,
                sweeper: Mutex::new(None),
            }),
        };

        if self.background_sweep {
            if tokio::runtime::Handle::try_current().is_ok() {
                service.spawn_cache_sweeper();
            } else {
                tracing::debug!("No tokio runtime at build time, cache sweeper not started");
            }
        }
        Ok(service)
    }
}

impl ApiService {
    pub fn builder(config: ClientConfig) -> ApiServiceBuilder {
        ApiServiceBuilder {
            config,
            transport: None,
            hooks: None,
            session: None,
            sleeper: None,
            background_sweep: true,
        }
    }

    /// Service over the default reqwest transport.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.inner.session
    }

    pub fn circuit_breakers(&self) -> &CircuitBreakerRegistry {
        &self.inner.breakers
    }

    /// Perform a request and decode the JSON body as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let value = self.request_value(method, path, options).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Perform a request through cache, deduplication, breaker and retry.
    pub async fn request_value(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<Value> {
        let start = std::time::Instant::now();
        let endpoint = options
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("{} {}", method, path));
        let key = cache_key(method.as_str(), path, &options.params, options.body.as_ref());
        let cacheable = options.cacheable && (method == Method::GET || method == Method::HEAD);

        if cacheable {
            if let Some(hit) = self.inner.cache.get(&key) {
                tracing::debug!(endpoint = %endpoint, "Cache hit");
                metrics::record_request(&endpoint, "cache_hit", start);
                return Ok(hit);
            }
        }

        let call = PendingCall {
            method,
            path: path.to_string(),
            endpoint: endpoint.clone(),
            key: key.clone(),
            cacheable,
            options,
        };

        // a cacheable caller must never join a flight that will not populate the cache
        let flight_key = if cacheable {
            format!("C:{}", key)
        } else {
            key
        };

        let result = if call.options.dedupe {
            let inner = Arc::clone(&self.inner);
            self.inner
                .in_flight
                .run(&flight_key, move || async move { inner.fetch(&call).await })
                .await
        } else {
            self.inner.fetch(&call).await
        };

        let outcome = match &result {
            Ok(_) => "success",
            Err(ApiError::CircuitOpen { .. }) => "circuit_open",
            Err(_) => "error",
        };
        metrics::record_request(&endpoint, outcome, start);
        result
    }

    /// Breakers, cache contents and pending request count.
    pub fn get_system_health(&self) -> SystemHealth {
        SystemHealth {
            circuit_breakers: self.inner.breakers.snapshot(),
            cache_stats: self.inner.cache.stats(),
            active_request_count: self.inner.in_flight.len(),
        }
    }

    /// Drop all cached responses, or those whose key contains `pattern`.
    pub fn clear_cache(&self, pattern: Option<&str>) -> usize {
        let removed = self.inner.cache.clear(pattern);
        tracing::info!(pattern = ?pattern, removed, "Cache cleared");
        removed
    }

    /// Close one breaker, or all of them.
    pub fn reset_circuit_breaker(&self, endpoint: Option<&str>) {
        self.inner.breakers.reset(endpoint);
    }

    /// Start the periodic cache sweep. No-op while one is already running.
    ///
    /// `build` calls this when a runtime is available; services built outside
    /// a runtime call it once they are inside one.
    pub fn spawn_cache_sweeper(&self) {
        let mut slot = self
            .inner
            .sweeper
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let sweeper = CacheSweeper::new(
            Arc::clone(&self.inner.cache),
            self.inner.config.cache.sweep_interval(),
        );
        *slot = Some(sweeper.spawn());
    }

    /// Whether the cache sweeper task is alive.
    pub fn sweeper_running(&self) -> bool {
        self.inner
            .sweeper
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop background tasks.
    ///
    /// Dropping the last clone of the service also ends the sweeper.
    pub async fn shutdown(&self) {
        let handle = self
            .inner
            .sweeper
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
        tracing::info!("API service shut down");
    }
}

/// Everything a deduplicated producer needs, owned.
struct PendingCall {
    method: Method,
    path: String,
    endpoint: String,
    key: String,
    cacheable: bool,
    options: RequestOptions,
}

impl ServiceInner {
    async fn fetch(&self, call: &PendingCall) -> ApiResult<Value> {
        let retry = call.options.retry.as_ref().unwrap_or(&self.config.retries);
        let value = self
            .retry
            .execute_with_retry(&call.endpoint, retry, || {
                self.http.execute(
                    call.method.clone(),
                    &call.path,
                    &call.options.params,
                    call.options.body.as_ref(),
                )
            })
            .await?;

        if call.cacheable && !endpoints::is_failure_envelope(&value) {
            self.cache.set(call.key.clone(), value.clone(), call.options.cache_ttl);
        }
        Ok(value)
    }
}
