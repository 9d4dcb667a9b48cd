//! Category-aware cache manager over an external key-value store
//!
//! Reads never fail: store errors and undecodable entries degrade to a miss.
//! Writes never fail either; a failed population is logged and dropped so the
//! request that produced the value is not blocked by it.

use crate::cache::{
    category::CacheCategory, entry::CacheEntry, store::KeyValueStore, types::CacheStats,
};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use futures::future::join_all;
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One entry for [`TieredCacheManager::warm`]
#[derive(Debug, Clone)]
pub struct WarmEntry {
    pub category: CacheCategory,
    pub identifier: String,
    pub payload: Value,
}

impl WarmEntry {
    pub fn new(category: CacheCategory, identifier: impl Into<String>, payload: Value) -> Self {
        Self {
            category,
            identifier: identifier.into(),
            payload,
        }
    }
}

/// Outcome of a warm run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmSummary {
    pub written: usize,
    pub failed: usize,
}

/// TTL-bounded memoization over a [`KeyValueStore`], scoped by category
pub struct TieredCacheManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    stats: Mutex<CacheStats>,
}

impl TieredCacheManager {
    /// Create a manager using the system clock
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Create a manager with an explicit time source
    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        info!("Initializing tiered cache manager");
        Self {
            store,
            clock,
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Read a payload, `None` on miss
    ///
    /// Expired entries are deleted on the way out. That delete is best-effort.
    pub async fn get(&self, category: CacheCategory, identifier: &str) -> Option<Value> {
        match self.try_get(category, identifier).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Cache read degraded to miss for {}: {}", category.key(identifier), e);
                let mut stats = self.stats.lock();
                stats.misses += 1;
                stats.read_errors += 1;
                None
            }
        }
    }

    /// Read a payload, surfacing store and decode errors
    ///
    /// Callers outside this crate should prefer [`get`](Self::get).
    pub async fn try_get(&self, category: CacheCategory, identifier: &str) -> Result<Option<Value>> {
        let key = category.key(identifier);

        let bytes = match self.store.get(&key).await? {
            Some(bytes) => bytes,
            None => {
                debug!("Cache miss: {}", key);
                self.stats.lock().misses += 1;
                return Ok(None);
            }
        };

        let entry = CacheEntry::from_bytes(&bytes)?;

        if entry.is_expired_at(self.clock.now()) {
            debug!("Cache entry expired: {}", key);
            {
                let mut stats = self.stats.lock();
                stats.misses += 1;
                stats.lazy_expirations += 1;
            }
            // Not compare-and-delete: a put landing between the read and this
            // delete is lost, and the next read is a miss
            if let Err(e) = self.store.del(&key).await {
                warn!("Failed to delete expired cache entry {}: {}", key, e);
            }
            return Ok(None);
        }

        debug!("Cache hit: {}", key);
        self.stats.lock().hits += 1;
        Ok(Some(entry.payload))
    }

    /// Read and decode a typed payload; a payload of the wrong shape is a miss
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        category: CacheCategory,
        identifier: &str,
    ) -> Option<T> {
        let value = self.get(category, identifier).await?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(
                    "Cached payload for {} has unexpected shape: {}",
                    category.key(identifier),
                    e
                );
                None
            }
        }
    }

    /// Write a payload with the category TTL
    ///
    /// Returns whether the write reached the store. Failures are logged only.
    pub async fn put(&self, category: CacheCategory, identifier: &str, payload: Value) -> bool {
        match self.try_put(category, identifier, payload).await {
            Ok(()) => {
                self.stats.lock().writes += 1;
                true
            }
            Err(e) => {
                warn!("Cache population failed for {}: {}", category.key(identifier), e);
                self.stats.lock().write_failures += 1;
                false
            }
        }
    }

    /// Serialize and write a typed payload
    pub async fn put_value<T: Serialize>(
        &self,
        category: CacheCategory,
        identifier: &str,
        payload: &T,
    ) -> bool {
        match serde_json::to_value(payload) {
            Ok(value) => self.put(category, identifier, value).await,
            Err(e) => {
                warn!("Could not serialize payload for {}: {}", category.key(identifier), e);
                self.stats.lock().write_failures += 1;
                false
            }
        }
    }

    async fn try_put(&self, category: CacheCategory, identifier: &str, payload: Value) -> Result<()> {
        let policy = category.config();
        let key = category.key(identifier);
        let entry = CacheEntry::new(key.clone(), payload, self.clock.now(), policy.ttl());
        let bytes = entry.to_bytes()?;

        self.store.set(&key, bytes, Some(policy.ttl())).await?;
        debug!("Cached {} (ttl {}s)", key, policy.ttl_seconds);
        Ok(())
    }

    /// Delete an entry unconditionally
    ///
    /// Administrative path only; the request path relies on TTLs.
    pub async fn invalidate(&self, category: CacheCategory, identifier: &str) -> Result<()> {
        let key = category.key(identifier);
        self.store.del(&key).await?;
        self.stats.lock().invalidations += 1;
        info!("Invalidated cache entry: {}", key);
        Ok(())
    }

    /// Bulk `put`; entries are written concurrently and independently
    pub async fn warm(&self, entries: Vec<WarmEntry>) -> WarmSummary {
        let total = entries.len();
        let results = join_all(
            entries
                .into_iter()
                .map(|e| async move { self.put(e.category, &e.identifier, e.payload).await }),
        )
        .await;

        let written = results.iter().filter(|ok| **ok).count();
        let summary = WarmSummary {
            written,
            failed: total - written,
        };

        if summary.failed > 0 {
            warn!(
                "Cache warm finished with failures: {} written, {} failed",
                summary.written, summary.failed
            );
        } else {
            info!("Cache warm finished: {} entries written", summary.written);
        }

        summary
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;
    use crate::clock::ManualClock;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn manager_with_clock() -> (TieredCacheManager, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::without_expiry());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let manager = TieredCacheManager::with_clock(store.clone(), clock.clone());
        (manager, store, clock)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (cache, _, _) = manager_with_clock();

        assert!(cache.put(CacheCategory::Variants, "p-1", json!([{"id": "v1"}])).await);

        let value = cache.get(CacheCategory::Variants, "p-1").await;
        assert_eq!(value, Some(json!([{"id": "v1"}])));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.writes, 1);
    }

    #[tokio::test]
    async fn test_categories_do_not_collide() {
        let (cache, _, _) = manager_with_clock();

        cache.put(CacheCategory::Variants, "x", json!("variants")).await;
        cache.put(CacheCategory::Materials, "x", json!("materials")).await;

        assert_eq!(cache.get(CacheCategory::Variants, "x").await, Some(json!("variants")));
        assert_eq!(cache.get(CacheCategory::Materials, "x").await, Some(json!("materials")));
        assert_eq!(cache.get(CacheCategory::Popular, "x").await, None);
    }

    #[tokio::test]
    async fn test_lazy_expiry_evicts() {
        let (cache, store, clock) = manager_with_clock();

        cache.put(CacheCategory::Variants, "p-1", json!(1)).await;
        clock.advance(Duration::seconds(901));

        assert_eq!(cache.get(CacheCategory::Variants, "p-1").await, None);
        assert!(!store.contains_key("variants:p-1").await);

        let stats = cache.stats();
        assert_eq!(stats.lazy_expirations, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_corrupt_bytes_are_a_miss() {
        let (cache, store, _) = manager_with_clock();
        store
            .set("materials:rings", b"{broken".to_vec(), None)
            .await
            .unwrap();

        assert_eq!(cache.get(CacheCategory::Materials, "rings").await, None);
        assert!(cache.try_get(CacheCategory::Materials, "rings").await.is_err());
        assert!(cache.stats().read_errors >= 1);
    }

    #[tokio::test]
    async fn test_get_as_wrong_shape_is_miss() {
        let (cache, _, _) = manager_with_clock();
        cache.put(CacheCategory::Popular, "b", json!("not a number")).await;

        let decoded: Option<u32> = cache.get_as(CacheCategory::Popular, "b").await;
        assert!(decoded.is_none());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let (cache, _, _) = manager_with_clock();
        cache.put(CacheCategory::Sequences, "ring42:gold", json!({"frames": []})).await;

        cache
            .invalidate(CacheCategory::Sequences, "ring42:gold")
            .await
            .unwrap();

        assert_eq!(cache.get(CacheCategory::Sequences, "ring42:gold").await, None);
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[tokio::test]
    async fn test_warm() {
        let (cache, _, _) = manager_with_clock();

        let summary = cache
            .warm(vec![
                WarmEntry::new(CacheCategory::Popular, "ring42:gold", json!({"rank": 1})),
                WarmEntry::new(CacheCategory::Popular, "ring7:silver", json!({"rank": 2})),
            ])
            .await;

        assert_eq!(summary, WarmSummary { written: 2, failed: 0 });
        assert!(cache.get(CacheCategory::Popular, "ring7:silver").await.is_some());
    }
}
