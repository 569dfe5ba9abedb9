//! Time-to-live response cache.

use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;

use crate::observability::metrics;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) <= self.ttl
    }
}

/// Size and key listing, as reported by system health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<String>,
}

/// Key-value store whose entries expire after a per-entry TTL.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// Fresh value for `key`, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let value = self
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone());

        if value.is_none() && self.entries.remove_if(key, |_, e| !e.is_fresh(now)).is_some() {
            tracing::debug!(key = %key, "Evicted stale cache entry");
            metrics::record_cache_size(self.entries.len());
        }
        metrics::record_cache_lookup(value.is_some());
        value
    }

    /// Store `value`, replacing any previous entry. `None` uses the default TTL.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
            ttl: ttl.unwrap_or(self.default_ttl),
        };
        self.entries.insert(key.into(), entry);
        metrics::record_cache_size(self.entries.len());
    }

    /// Remove every entry, or only those whose key contains `pattern`.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&self, pattern: Option<&str>) -> usize {
        let before = self.entries.len();
        match pattern {
            Some(pattern) => self.entries.retain(|key, _| !key.contains(pattern)),
            None => self.entries.clear(),
        }
        let removed = before.saturating_sub(self.entries.len());
        tracing::debug!(pattern = ?pattern, removed, "Cache cleared");
        metrics::record_cache_size(self.entries.len());
        removed
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "Swept expired cache entries");
        }
        metrics::record_cache_size(self.entries.len());
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        CacheStats {
            size: keys.len(),
            keys,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_valid_through_ttl_boundary() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.set("GET:/api/plans:{}:null", 1u32, Some(Duration::from_millis(100)));

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(cache.get("GET:/api/plans:{}:null"), Some(1));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("GET:/api/plans:{}:null"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_ttl_and_overwrite() {
        let cache = TtlCache::new(Duration::from_secs(1));
        cache.set("k", "old".to_string(), None);
        tokio::time::advance(Duration::from_millis(900)).await;
        cache.set("k", "new".to_string(), None);
        tokio::time::advance(Duration::from_millis(900)).await;
        assert_eq!(cache.get("k").as_deref(), Some("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_by_substring() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("GET:/api/blocos:{\"cargo\":\"A\"}:null", 1, None);
        cache.set("GET:/api/blocos:{\"cargo\":\"B\"}:null", 2, None);
        cache.set("GET:/api/plans:{}:null", 3, None);

        assert_eq!(cache.clear(Some("/api/blocos")), 2);
        assert_eq!(cache.stats().keys, vec!["GET:/api/plans:{}:null".to_string()]);

        assert_eq!(cache.clear(Some("nothing-matches")), 0);
        assert_eq!(cache.clear(None), 1);
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_expired() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("short", 1, Some(Duration::from_secs(1)));
        cache.set("long", 2, None);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.stats().keys, vec!["long".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_sorted() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("b", 1, None);
        cache.set("a", 2, None);
        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.keys, vec!["a".to_string(), "b".to_string()]);
    }
}
