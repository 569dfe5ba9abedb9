//! In-flight request deduplication.
//!
//! Concurrent callers asking for the same key share one pending outcome.
//! The first caller starts the producer; later callers join it and receive a
//! clone of the settled value, success or failure alike.
//!
//! A registration lives exactly as long as its pending future. A drop guard
//! inside the shared future removes the key when the producer settles, and
//! also when every caller abandons it, so a stale entry can never be joined.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, Shared, WeakShared};
use futures_util::FutureExt;

use crate::observability::metrics;

type SharedOutcome<T> = Shared<BoxFuture<'static, T>>;

struct Slot<T> {
    id: u64,
    handle: WeakShared<BoxFuture<'static, T>>,
}

/// Removes its registration once the owning future completes or is dropped.
struct SlotGuard<T> {
    slots: Arc<DashMap<String, Slot<T>>>,
    key: String,
    id: u64,
}

impl<T> Drop for SlotGuard<T> {
    fn drop(&mut self) {
        // a newer slot may already occupy the key
        self.slots.remove_if(&self.key, |_, slot| slot.id == self.id);
    }
}

/// Registry of pending outcomes keyed by request identity.
pub struct InFlightRequests<T> {
    slots: Arc<DashMap<String, Slot<T>>>,
    next_id: AtomicU64,
}

impl<T> Default for InFlightRequests<T> {
    fn default() -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T> InFlightRequests<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the pending outcome for `key`, or start `producer` and register it.
    ///
    /// `producer` is invoked while the key is locked and must only build the
    /// future, not poll it.
    pub async fn run<F, Fut>(&self, key: &str, producer: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let outcome = match self.slots.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => match occupied.get().handle.upgrade() {
                Some(pending) => {
                    tracing::debug!(key = %key, "Joining in-flight request");
                    metrics::record_dedup_join();
                    pending
                }
                None => {
                    let (slot, pending) = self.start(key, producer);
                    occupied.insert(slot);
                    pending
                }
            },
            Entry::Vacant(vacant) => {
                let (slot, pending) = self.start(key, producer);
                vacant.insert(slot);
                pending
            }
        };

        outcome.await
    }

    fn start<F, Fut>(&self, key: &str, producer: F) -> (Slot<T>, SharedOutcome<T>)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let future = producer();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let guard = SlotGuard {
            slots: Arc::clone(&self.slots),
            key: key.to_string(),
            id,
        };
        let pending = async move {
            let _guard = guard;
            future.await
        }
        .boxed()
        .shared();

        let slot = Slot {
            id,
            // a freshly built Shared has not completed, so downgrade succeeds
            handle: pending.downgrade().unwrap_or_else(|| unreachable!()),
        };
        (slot, pending)
    }

    /// Number of keys with a pending outcome.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }
}
