//! In-process TTL cache for Shop API responses.
//!
//! Backed by a `moka` future cache with a per-entry expiry policy, so every
//! entry carries its own time-to-live. Expired entries are never returned:
//! reads check the TTL lazily and evict, and [`ResponseCache::cleanup`]
//! sweeps everything that has expired. Long-lived processes run the sweep on
//! a timer via [`ResponseCache::start_sweeper`].
//!
//! The cache is constructed by the composition root and injected into the
//! gateway; there is no global instance.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

/// Number of leading query characters kept in a cache key for readability.
const KEY_QUERY_PREFIX_CHARS: usize = 50;

/// A cached response body.
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Arc<Value>,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

/// Expiry policy: each entry lives for its own TTL, reset on overwrite.
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-wide response cache keyed by query and variables.
///
/// Cheap to clone; clones share the same storage.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Cache<String, CacheEntry>,
    default_ttl: Duration,
}

impl ResponseCache {
    /// Create a cache with a default TTL and a maximum number of entries.
    #[must_use]
    pub fn new(default_ttl: Duration, max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();

        Self { inner, default_ttl }
    }

    /// TTL applied when [`ResponseCache::set`] is called without one.
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store `data` under `key`, overwriting any existing entry.
    pub async fn set(&self, key: String, data: impl Into<Arc<Value>>, ttl: Option<Duration>) {
        let entry = CacheEntry {
            data: data.into(),
            stored_at: Instant::now(),
            ttl: ttl.unwrap_or(self.default_ttl),
        };
        self.inner.insert(key, entry).await;
    }

    /// Fetch the data stored under `key`.
    ///
    /// Returns `None` and evicts the entry once it has outlived its TTL. The
    /// returned value is shared with the cache; treat it as read-only.
    pub async fn get(&self, key: &str) -> Option<Arc<Value>> {
        let entry = self.inner.get(key).await?;
        if entry.is_expired() {
            self.inner.invalidate(key).await;
            return None;
        }
        Some(entry.data)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    /// Evict all expired entries now.
    ///
    /// moka's timer wheel only advances in whole ticks, so entries whose TTL
    /// ran out since the last tick are invalidated here by hand.
    pub async fn cleanup(&self) {
        let expired: Vec<Arc<String>> = self
            .inner
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key)
            .collect();

        for key in &expired {
            self.inner.invalidate(key.as_str()).await;
        }
        self.inner.run_pending_tasks().await;

        debug!(
            evicted = expired.len(),
            entries = self.inner.entry_count(),
            "Swept expired response cache entries"
        );
    }

    /// Number of live entries. Expired entries awaiting eviction are not
    /// counted.
    pub async fn len(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        let live = self
            .inner
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .count();
        u64::try_from(live).unwrap_or(u64::MAX)
    }

    /// Whether the cache holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Build a deterministic key for a query and its variables.
    ///
    /// The key keeps the first 50 characters of the query for readable logs,
    /// a SHA-256 digest of the full query text so distinct documents sharing
    /// a prefix never collide, and the JSON-serialized variables.
    #[must_use]
    pub fn create_key(query: &str, variables: &Value) -> String {
        let prefix: String = query.chars().take(KEY_QUERY_PREFIX_CHARS).collect();
        let digest = Sha256::digest(query.as_bytes());
        format!("{prefix}#{digest:x}|{variables}")
    }

    /// Start a background task that calls [`ResponseCache::cleanup`] every
    /// `every`. Stop it with [`CacheSweeper::stop`] on shutdown.
    #[must_use]
    pub fn start_sweeper(&self, every: Duration) -> CacheSweeper {
        let cache = self.clone();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            loop {
                tokio::select! {
                    _ = interval.tick() => cache.cleanup().await,
                    _ = &mut stop_rx => break,
                }
            }
            debug!("Response cache sweeper stopped");
        });

        CacheSweeper {
            stop: Some(stop_tx),
            handle,
        }
    }
}

/// Handle to the periodic cache sweep task.
pub struct CacheSweeper {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl CacheSweeper {
    /// Signal the sweep task to stop and wait for it to finish.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = (&mut self.handle).await {
            tracing::warn!(error = %e, "Response cache sweeper task failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache() -> ResponseCache {
        ResponseCache::new(Duration::from_secs(300), 100)
    }

    #[tokio::test]
    async fn test_set_then_get_returns_value() {
        let cache = cache();
        cache.set("k".to_string(), json!({"a": 1}), None).await;

        let value = cache.get("k").await.unwrap();
        assert_eq!(*value, json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_get_aliases_stored_value() {
        let cache = cache();
        cache.set("k".to_string(), json!([1, 2, 3]), None).await;

        let first = cache.get("k").await.unwrap();
        let second = cache.get("k").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_missing_key_returns_none() {
        assert!(cache().get("absent").await.is_none());
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(300), 100);
        cache
            .set("k".to_string(), json!({"a": 1}), Some(Duration::from_millis(1000)))
            .await;
        assert_eq!(*cache.get("k").await.unwrap(), json!({"a": 1}));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(cache.get("k").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value_and_ttl() {
        let cache = cache();
        cache
            .set("k".to_string(), json!(1), Some(Duration::from_millis(30)))
            .await;
        cache
            .set("k".to_string(), json!(2), Some(Duration::from_secs(60)))
            .await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(*cache.get("k").await.unwrap(), json!(2));
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let cache = cache();
        cache.set("a".to_string(), json!(1), None).await;
        cache.set("b".to_string(), json!(2), None).await;

        cache.clear();
        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cleanup_evicts_only_expired() {
        let cache = cache();
        cache
            .set("short".to_string(), json!(1), Some(Duration::from_millis(20)))
            .await;
        cache
            .set("long".to_string(), json!(2), Some(Duration::from_secs(60)))
            .await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.cleanup().await;

        assert_eq!(cache.len().await, 1);
        assert!(cache.get("long").await.is_some());
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired_from_storage() {
        let cache = cache();
        for i in 0..3 {
            cache
                .set(format!("k{i}"), json!(i), Some(Duration::from_millis(10)))
                .await;
        }

        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.cleanup().await;

        assert_eq!(cache.inner.iter().count(), 0);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_sweeper_evicts_in_background() {
        let cache = cache();
        cache
            .set("k".to_string(), json!(1), Some(Duration::from_millis(10)))
            .await;

        let sweeper = cache.start_sweeper(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(120)).await;
        sweeper.stop().await;

        assert_eq!(cache.len().await, 0);
    }

    #[test]
    fn test_create_key_is_deterministic() {
        let vars = json!({"slug": "chair", "take": 12});
        assert_eq!(
            ResponseCache::create_key("query GetProduct { x }", &vars),
            ResponseCache::create_key("query GetProduct { x }", &vars)
        );
    }

    #[test]
    fn test_create_key_differs_by_variables() {
        let query = "query GetProduct { x }";
        assert_ne!(
            ResponseCache::create_key(query, &json!({"slug": "chair"})),
            ResponseCache::create_key(query, &json!({"slug": "desk"}))
        );
    }

    #[test]
    fn test_create_key_distinguishes_shared_prefix() {
        let prefix = "x".repeat(60);
        let a = format!("{prefix} query A");
        let b = format!("{prefix} query B");
        let vars = json!({});
        assert_ne!(
            ResponseCache::create_key(&a, &vars),
            ResponseCache::create_key(&b, &vars)
        );
    }
}
