//! Region cache - read-through lookup and region invalidation.
//!
//! The cache is an accelerator only. A backend failure or an unreadable
//! entry degrades to a miss and never fails the caller; errors returned by
//! the compute function are propagated and nothing is cached for them.

use crate::backend::{CacheBackend, ConfiguredBackend, InMemoryBackend, NoOpBackend};
use crate::config::{CacheConfig, DEFAULT_TTL_SECS};
use crate::entity::EntityKind;
use crate::error::Result;
use crate::key::CacheRegion;
use crate::observability::{CacheMetrics, NoOpMetrics, TtlPolicy};
use crate::serialization::{deserialize_from_cache, is_stale_entry, serialize_for_cache};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cache-aside layer over a region-aware backend.
///
/// # Example
///
/// ```ignore
/// use taskhub::cache::RegionCache;
/// use taskhub::backend::InMemoryBackend;
///
/// let cache = RegionCache::new(InMemoryBackend::new());
/// let titles: Vec<String> = cache
///     .get_or_compute(region, "all", || async { load_titles().await })
///     .await?;
/// ```
pub struct RegionCache<B: CacheBackend> {
    backend: B,
    metrics: Box<dyn CacheMetrics>,
    ttl_policy: TtlPolicy,
}

impl<B: CacheBackend> RegionCache<B> {
    /// Create a cache over the given backend.
    ///
    /// Entries expire after `DEFAULT_TTL_SECS` unless another policy is set.
    pub fn new(backend: B) -> Self {
        RegionCache {
            backend,
            metrics: Box::new(NoOpMetrics),
            ttl_policy: TtlPolicy::Fixed(Duration::from_secs(DEFAULT_TTL_SECS)),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set custom TTL policy.
    pub fn with_ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = policy;
        self
    }

    /// Return the value cached under `key` in `region`, or compute and cache it.
    ///
    /// # Errors
    ///
    /// Only errors produced by `compute` are returned.
    pub async fn get_or_compute<V, F, Fut>(
        &self,
        region: CacheRegion,
        key: &str,
        compute: F,
    ) -> Result<V>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let name = region.name();
        let timer = Instant::now();

        match self.backend.get(name, key).await {
            Ok(Some(bytes)) => match deserialize_from_cache::<V>(&bytes) {
                Ok(value) => {
                    self.metrics.record_hit(name, key, timer.elapsed());
                    return Ok(value);
                }
                Err(e) => {
                    self.metrics.record_error(name, key, &e.to_string());
                    if is_stale_entry(&e) {
                        debug!("Evicting unreadable entry {}/{}", name, key);
                        if let Err(e) = self.backend.delete(name, key).await {
                            warn!("Failed to evict {}/{}: {}", name, key, e);
                        }
                    }
                }
            },
            Ok(None) => self.metrics.record_miss(name, key, timer.elapsed()),
            Err(e) => {
                self.metrics.record_error(name, key, &e.to_string());
                warn!("Cache read failed for {}/{}, computing: {}", name, key, e);
            }
        }

        let value = compute().await?;

        let timer = Instant::now();
        match serialize_for_cache(&value) {
            Ok(bytes) => {
                let ttl = self.ttl_policy.get_ttl(name);
                match self.backend.set(name, key, bytes, ttl).await {
                    Ok(()) => self.metrics.record_set(name, key, timer.elapsed()),
                    Err(e) => {
                        self.metrics.record_error(name, key, &e.to_string());
                        warn!("Cache write failed for {}/{}: {}", name, key, e);
                    }
                }
            }
            Err(e) => self.metrics.record_error(name, key, &e.to_string()),
        }

        Ok(value)
    }

    /// Drop every entry of a region.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend fails to clear the region.
    pub async fn invalidate_region(&self, region: CacheRegion) -> Result<()> {
        self.backend.clear_region(region.name()).await?;
        self.metrics.record_invalidate(region.name());
        Ok(())
    }

    /// Drop both regions of an entity type.
    ///
    /// Both regions are attempted even if the first one fails; the first
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend fails to clear either region.
    pub async fn invalidate_kind(&self, kind: EntityKind) -> Result<()> {
        let mut outcome = Ok(());
        for region in CacheRegion::both(kind) {
            if let Err(e) = self.invalidate_region(region).await {
                self.metrics.record_error(region.name(), "*", &e.to_string());
                if outcome.is_ok() {
                    outcome = Err(e);
                }
            }
        }
        outcome
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// Shareable handle to a [`RegionCache`].
///
/// Cloning is cheap; all clones see the same backend, metrics and TTL policy.
#[derive(Clone)]
pub struct CacheService<B: CacheBackend> {
    cache: Arc<RegionCache<B>>,
}

impl<B: CacheBackend> CacheService<B> {
    /// Create a new cache service with the given backend.
    pub fn new(backend: B) -> Self {
        Self::from_cache(RegionCache::new(backend))
    }

    /// Create a new cache service with custom metrics.
    pub fn with_metrics(backend: B, metrics: Box<dyn CacheMetrics>) -> Self {
        Self::from_cache(RegionCache::new(backend).with_metrics(metrics))
    }

    /// Wrap an already configured cache.
    pub fn from_cache(cache: RegionCache<B>) -> Self {
        CacheService {
            cache: Arc::new(cache),
        }
    }

    /// See [`RegionCache::get_or_compute`].
    ///
    /// # Errors
    ///
    /// Only errors produced by `compute` are returned.
    pub async fn get_or_compute<V, F, Fut>(
        &self,
        region: CacheRegion,
        key: &str,
        compute: F,
    ) -> Result<V>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        self.cache.get_or_compute(region, key, compute).await
    }

    /// See [`RegionCache::invalidate_region`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend fails to clear the region.
    pub async fn invalidate_region(&self, region: CacheRegion) -> Result<()> {
        self.cache.invalidate_region(region).await
    }

    /// See [`RegionCache::invalidate_kind`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend fails to clear either region.
    pub async fn invalidate_kind(&self, kind: EntityKind) -> Result<()> {
        self.cache.invalidate_kind(kind).await
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &B {
        self.cache.backend()
    }
}

impl CacheService<ConfiguredBackend> {
    /// Build the cache described by a configuration section.
    pub fn from_config(config: &CacheConfig) -> Self {
        if !config.enabled {
            info!("Cache disabled by configuration");
            return CacheService::new(ConfiguredBackend::Disabled(NoOpBackend));
        }

        let capacity = config.max_entries_non_zero().get();
        let policy = match config.ttl() {
            Some(ttl) => TtlPolicy::Fixed(ttl),
            None => TtlPolicy::Infinite,
        };
        info!(
            "Cache enabled: {} entries per region, ttl {:?}",
            capacity,
            config.ttl()
        );

        let backend = ConfiguredBackend::InMemory(InMemoryBackend::with_capacity(capacity));
        CacheService::from_cache(RegionCache::new(backend).with_ttl_policy(policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::observability::CountingMetrics;
    use crate::serialization::CacheEnvelope;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone)]
    struct FailingBackend;

    impl CacheBackend for FailingBackend {
        async fn get(&self, _region: &str, _key: &str) -> Result<Option<Vec<u8>>> {
            Err(Error::BackendError("down".into()))
        }

        async fn set(
            &self,
            _region: &str,
            _key: &str,
            _value: Vec<u8>,
            _ttl: Option<Duration>,
        ) -> Result<()> {
            Err(Error::BackendError("down".into()))
        }

        async fn delete(&self, _region: &str, _key: &str) -> Result<()> {
            Err(Error::BackendError("down".into()))
        }

        async fn clear_region(&self, _region: &str) -> Result<()> {
            Err(Error::BackendError("down".into()))
        }

        async fn clear_all(&self) -> Result<()> {
            Err(Error::BackendError("down".into()))
        }
    }

    fn tasks() -> CacheRegion {
        CacheRegion::collection(EntityKind::Task)
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let cache = RegionCache::new(InMemoryBackend::new());
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<String> = cache
                .get_or_compute(tasks(), "all", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["Alpha".to_string()])
                })
                .await
                .expect("Failed to compute");
            assert_eq!(value, vec!["Alpha".to_string()]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_compute_error_is_propagated_and_not_cached() {
        let backend = InMemoryBackend::new();
        let cache = RegionCache::new(backend.clone());

        let result: Result<u32> = cache
            .get_or_compute(tasks(), "k", || async { Err(Error::NotFound("x".into())) })
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(backend.region_len(tasks().name()).await, 0);
    }

    #[tokio::test]
    async fn test_invalidate_region_forces_recompute() {
        let cache = RegionCache::new(InMemoryBackend::new());

        let first: u32 = cache
            .get_or_compute(tasks(), "count", || async { Ok(1) })
            .await
            .unwrap();
        cache.invalidate_region(tasks()).await.unwrap();
        let second: u32 = cache
            .get_or_compute(tasks(), "count", || async { Ok(2) })
            .await
            .unwrap();

        assert_eq!((first, second), (1, 2));
    }

    #[tokio::test]
    async fn test_invalidate_kind_clears_both_regions_only_for_that_kind() {
        let backend = InMemoryBackend::new();
        let cache = RegionCache::new(backend.clone());
        let [one_task, many_tasks] = CacheRegion::both(EntityKind::Task);
        let one_person = CacheRegion::single(EntityKind::Person);

        for region in [one_task, many_tasks, one_person] {
            let _: u8 = cache
                .get_or_compute(region, "k", || async { Ok(1) })
                .await
                .unwrap();
        }

        cache.invalidate_kind(EntityKind::Task).await.unwrap();

        assert_eq!(backend.region_len(one_task.name()).await, 0);
        assert_eq!(backend.region_len(many_tasks.name()).await, 0);
        assert_eq!(backend.region_len(one_person.name()).await, 1);
    }

    #[tokio::test]
    async fn test_corrupted_entry_is_evicted_and_recomputed() {
        let backend = InMemoryBackend::new();
        let metrics = Arc::new(CountingMetrics::new());
        let cache = RegionCache::new(backend.clone()).with_metrics(Box::new(metrics.clone()));

        backend
            .set(tasks().name(), "k", vec![0xff, 0x00, 0x13], None)
            .await
            .unwrap();

        let value: String = cache
            .get_or_compute(tasks(), "k", || async { Ok("fresh".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "fresh");
        assert_eq!(metrics.snapshot().errors, 1);

        let cached: String = cache
            .get_or_compute(tasks(), "k", || async { Ok("again".to_string()) })
            .await
            .unwrap();
        assert_eq!(cached, "fresh");
    }

    #[tokio::test]
    async fn test_old_schema_entry_is_recomputed() {
        let backend = InMemoryBackend::new();
        let cache = RegionCache::new(backend.clone());

        let mut envelope = CacheEnvelope::new(7u32);
        envelope.version += 1;
        let bytes = postcard::to_allocvec(&envelope).unwrap();
        backend.set(tasks().name(), "k", bytes, None).await.unwrap();

        let value: u32 = cache
            .get_or_compute(tasks(), "k", || async { Ok(8) })
            .await
            .unwrap();
        assert_eq!(value, 8);
    }

    #[tokio::test]
    async fn test_failing_backend_degrades_to_compute() {
        let cache = RegionCache::new(FailingBackend);

        let value: u32 = cache
            .get_or_compute(tasks(), "k", || async { Ok(5) })
            .await
            .expect("backend failure must not surface");
        assert_eq!(value, 5);

        assert!(cache.invalidate_kind(EntityKind::Task).await.is_err());
    }

    #[tokio::test]
    async fn test_metrics_count_hits_and_misses() {
        let metrics = Arc::new(CountingMetrics::new());
        let service = CacheService::with_metrics(InMemoryBackend::new(), Box::new(metrics.clone()));

        for _ in 0..2 {
            let _: u8 = service
                .get_or_compute(tasks(), "k", || async { Ok(1) })
                .await
                .unwrap();
        }
        service.invalidate_region(tasks()).await.unwrap();

        let snap = metrics.snapshot();
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.hits, 1);
        assert_eq!(snap.sets, 1);
        assert_eq!(snap.invalidations, 1);
    }

    #[tokio::test]
    async fn test_service_clones_share_cache() {
        let service = CacheService::new(InMemoryBackend::new());
        let clone = service.clone();

        let _: u8 = service
            .get_or_compute(tasks(), "k", || async { Ok(1) })
            .await
            .unwrap();
        let seen: u8 = clone
            .get_or_compute(tasks(), "k", || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(seen, 1);
    }

    #[tokio::test]
    async fn test_from_config_disabled_always_computes() {
        let config = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        let service = CacheService::from_config(&config);
        assert!(!service.backend().is_enabled());

        let first: u8 = service
            .get_or_compute(tasks(), "k", || async { Ok(1) })
            .await
            .unwrap();
        let second: u8 = service
            .get_or_compute(tasks(), "k", || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!((first, second), (1, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_from_config_applies_ttl() {
        let config = CacheConfig {
            ttl_secs: 60,
            ..CacheConfig::default()
        };
        let service = CacheService::from_config(&config);
        assert!(service.backend().is_enabled());

        let _: u8 = service
            .get_or_compute(tasks(), "k", || async { Ok(1) })
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        let after: u8 = service
            .get_or_compute(tasks(), "k", || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(after, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_cache_expires_after_an_hour() {
        let service = CacheService::new(InMemoryBackend::new());
        let first: u8 = service
            .get_or_compute(tasks(), "k", || async { Ok(1) })
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(DEFAULT_TTL_SECS - 1)).await;
        let cached: u8 = service
            .get_or_compute(tasks(), "k", || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!((first, cached), (1, 1));

        tokio::time::advance(Duration::from_secs(2 * 60 * 60)).await;
        let refreshed: u8 = service
            .get_or_compute(tasks(), "k", || async { Ok(3) })
            .await
            .unwrap();
        assert_eq!(refreshed, 3);
    }
}
