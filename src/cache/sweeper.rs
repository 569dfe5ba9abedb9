//! Background expiry sweep.
//!
//! # Responsibilities
//! - Periodically drop expired cache entries
//! - Exit promptly when the owning service shuts down

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;

use crate::cache::ttl::TtlCache;

pub struct CacheSweeper {
    cache: Arc<TtlCache<Value>>,
    interval: Duration,
}

impl CacheSweeper {
    pub fn new(cache: Arc<TtlCache<Value>>, interval: Duration) -> Self {
        Self { cache, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Cache sweeper starting");

        let Some(first_tick) = time::Instant::now().checked_add(self.interval) else {
            tracing::warn!(interval = ?self.interval, "Sweep interval out of range, sweeper idle");
            let _ = shutdown.recv().await;
            return;
        };
        let mut ticker = time::interval_at(first_tick, self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.cache.sweep();
                    tracing::debug!(removed, remaining = self.cache.len(), "Cache sweep complete");
                }
                _ = shutdown.recv() => {
                    tracing::info!("Cache sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run on the current tokio runtime, returning a handle that stops it.
    pub fn spawn(self) -> SweeperHandle {
        let (stop_tx, stop_rx) = broadcast::channel(1);
        let join = tokio::spawn(self.run(stop_rx));
        SweeperHandle { stop_tx, join }
    }
}

/// Owner of a running sweeper task.
///
/// Dropping the handle closes the stop channel, which also ends the task.
pub struct SweeperHandle {
    stop_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "Cache sweeper task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
