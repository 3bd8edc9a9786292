//! In-memory cache backend (default, thread-safe, async).
//!
//! Each region is an independent LRU bounded by a fixed entry count.
//! Regions are kept in a DashMap so unrelated regions never contend.
//! TTL expiration is checked on access.

use super::CacheBackend;
use crate::error::Result;
use dashmap::DashMap;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Default maximum number of entries per region.
pub const DEFAULT_REGION_CAPACITY: usize = 200;

/// In-memory cache entry with optional expiration.
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        CacheEntry { data, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

type Region = Mutex<LruCache<String, CacheEntry>>;

/// Thread-safe async in-memory cache backend with per-region LRU eviction.
///
/// # Example
///
/// ```no_run
/// use taskhub::backend::{CacheBackend, InMemoryBackend};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::with_capacity(100);
///
///     backend.set("cacheOneTask", "id:1", b"value".to_vec(), None).await?;
///     assert!(backend.get("cacheOneTask", "id:1").await?.is_some());
///
///     backend
///         .set("cacheManyTasks", "all", b"list".to_vec(), Some(Duration::from_secs(3600)))
///         .await?;
///     backend.clear_region("cacheManyTasks").await?;
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    regions: Arc<DashMap<String, Region>>,
    capacity: NonZeroUsize,
}

impl InMemoryBackend {
    /// Create a backend holding at most [`DEFAULT_REGION_CAPACITY`] entries per region.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REGION_CAPACITY)
    }

    /// Create a backend with a custom per-region bound, clamped to at least 1.
    pub fn with_capacity(capacity: usize) -> Self {
        InMemoryBackend {
            regions: Arc::new(DashMap::new()),
            capacity: NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// Per-region entry bound.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Total number of entries across all regions, expired ones included.
    pub async fn len(&self) -> usize {
        self.regions.iter().map(|r| r.value().lock().len()).sum()
    }

    /// Check if cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of entries in one region.
    pub async fn region_len(&self, region: &str) -> usize {
        self.regions
            .get(region)
            .map(|r| r.value().lock().len())
            .unwrap_or(0)
    }

    /// Get memory statistics.
    pub async fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            regions: self.regions.len(),
            ..CacheStats::default()
        };
        for region in self.regions.iter() {
            let cache = region.value().lock();
            for (_, entry) in cache.iter() {
                stats.total_entries += 1;
                stats.total_bytes += entry.data.len();
                if entry.is_expired() {
                    stats.expired_entries += 1;
                }
            }
        }
        stats
    }

    /// Print cache statistics to debug log.
    pub async fn log_stats(&self) {
        let stats = self.stats().await;
        debug!(
            "Cache Stats: {} regions, {} entries ({} expired), {} bytes",
            stats.regions, stats.total_entries, stats.expired_entries, stats.total_bytes
        );
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, region: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(cache) = self.regions.get(region) else {
            debug!("✓ InMemory GET {}/{} -> MISS", region, key);
            return Ok(None);
        };
        let mut cache = cache.value().lock();

        let hit = match cache.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.data.clone()),
            Some(_) => {
                cache.pop(key);
                None
            }
            None => None,
        };

        if hit.is_some() {
            debug!("✓ InMemory GET {}/{} -> HIT", region, key);
        } else {
            debug!("✓ InMemory GET {}/{} -> MISS", region, key);
        }
        Ok(hit)
    }

    async fn set(
        &self,
        region: &str,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let cache = self
            .regions
            .entry(region.to_string())
            .or_insert_with(|| Mutex::new(LruCache::new(self.capacity)));

        let evicted = cache
            .value()
            .lock()
            .push(key.to_string(), CacheEntry::new(value, ttl));

        if let Some((old_key, _)) = evicted {
            if old_key != key {
                debug!("✓ InMemory EVICT {}/{} (capacity reached)", region, old_key);
            }
        }

        match ttl {
            Some(d) => debug!("✓ InMemory SET {}/{} (TTL: {:?})", region, key, d),
            None => debug!("✓ InMemory SET {}/{}", region, key),
        }
        Ok(())
    }

    async fn delete(&self, region: &str, key: &str) -> Result<()> {
        if let Some(cache) = self.regions.get(region) {
            cache.value().lock().pop(key);
        }
        debug!("✓ InMemory DELETE {}/{}", region, key);
        Ok(())
    }

    async fn exists(&self, region: &str, key: &str) -> Result<bool> {
        Ok(self
            .regions
            .get(region)
            .and_then(|cache| cache.value().lock().peek(key).map(|e| !e.is_expired()))
            .unwrap_or(false))
    }

    async fn clear_region(&self, region: &str) -> Result<()> {
        if let Some(cache) = self.regions.get(region) {
            cache.value().lock().clear();
        }
        debug!("✓ InMemory CLEAR_REGION {}", region);
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        self.regions.clear();
        warn!("⚠ InMemory CLEAR_ALL executed - all cache cleared!");
        Ok(())
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Default)]
pub struct CacheStats {
    pub regions: usize,
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inmemory_backend_set_get() {
        let backend = InMemoryBackend::new();

        backend
            .set("r", "key1", b"value1".to_vec(), None)
            .await
            .expect("Failed to set");

        let result = backend.get("r", "key1").await.expect("Failed to get");
        assert_eq!(result, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_inmemory_backend_regions_are_separate() {
        let backend = InMemoryBackend::new();
        backend.set("a", "k", b"1".to_vec(), None).await.unwrap();

        assert!(backend.get("b", "k").await.unwrap().is_none());
        assert_eq!(backend.get("a", "k").await.unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn test_inmemory_backend_delete() {
        let backend = InMemoryBackend::new();

        backend
            .set("r", "key1", b"value1".to_vec(), None)
            .await
            .expect("Failed to set");
        assert!(backend.exists("r", "key1").await.unwrap());

        backend.delete("r", "key1").await.expect("Failed to delete");
        assert!(!backend.exists("r", "key1").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_inmemory_backend_ttl_expiration() {
        let backend = InMemoryBackend::new();

        backend
            .set("r", "key1", b"value1".to_vec(), Some(Duration::from_secs(60 * 60)))
            .await
            .expect("Failed to set");

        assert!(backend.get("r", "key1").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(60 * 60 + 1)).await;

        assert!(backend.get("r", "key1").await.unwrap().is_none());
        assert_eq!(backend.region_len("r").await, 0);
    }

    #[tokio::test]
    async fn test_inmemory_backend_lru_eviction() {
        let backend = InMemoryBackend::with_capacity(2);

        backend.set("r", "a", b"a".to_vec(), None).await.unwrap();
        backend.set("r", "b", b"b".to_vec(), None).await.unwrap();

        // Touch "a" so that "b" becomes least recently used.
        assert!(backend.get("r", "a").await.unwrap().is_some());
        backend.set("r", "c", b"c".to_vec(), None).await.unwrap();

        assert_eq!(backend.region_len("r").await, 2);
        assert!(backend.get("r", "a").await.unwrap().is_some());
        assert!(backend.get("r", "b").await.unwrap().is_none());
        assert!(backend.get("r", "c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_inmemory_backend_capacity_is_per_region() {
        let backend = InMemoryBackend::with_capacity(1);
        backend.set("one", "k", b"1".to_vec(), None).await.unwrap();
        backend.set("two", "k", b"2".to_vec(), None).await.unwrap();
        assert_eq!(backend.len().await, 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_clamped() {
        let backend = InMemoryBackend::with_capacity(0);
        assert_eq!(backend.capacity(), 1);
    }

    #[tokio::test]
    async fn test_inmemory_backend_clear_region() {
        let backend = InMemoryBackend::new();
        backend.set("one", "a", b"1".to_vec(), None).await.unwrap();
        backend.set("one", "b", b"2".to_vec(), None).await.unwrap();
        backend.set("two", "a", b"3".to_vec(), None).await.unwrap();

        backend.clear_region("one").await.unwrap();

        assert_eq!(backend.region_len("one").await, 0);
        assert_eq!(backend.region_len("two").await, 1);
    }

    #[tokio::test]
    async fn test_inmemory_backend_clear_all() {
        let backend = InMemoryBackend::new();
        backend.set("one", "a", b"1".to_vec(), None).await.unwrap();
        backend.set("two", "a", b"2".to_vec(), None).await.unwrap();

        backend.clear_all().await.expect("Failed to clear");

        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_inmemory_backend_stats() {
        let backend = InMemoryBackend::new();
        backend
            .set("one", "key1", b"value_with_data".to_vec(), None)
            .await
            .unwrap();
        backend.set("two", "key2", b"data".to_vec(), None).await.unwrap();

        let stats = backend.stats().await;
        assert_eq!(stats.regions, 2);
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 0);
        assert_eq!(stats.total_bytes, 19);
    }

    #[tokio::test]
    async fn test_inmemory_backend_clone_shares_storage() {
        let backend1 = InMemoryBackend::new();
        backend1.set("r", "key", b"value".to_vec(), None).await.unwrap();

        let backend2 = backend1.clone();
        assert_eq!(
            backend2.get("r", "key").await.unwrap(),
            Some(b"value".to_vec())
        );
    }
}
