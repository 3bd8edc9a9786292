//! Cache metrics hooks and TTL policies.
//!
//! Every cache lookup reports one event per region access:
//!
//! - `record_hit()` / `record_miss()` - lookup outcome with its duration
//! - `record_set()` - a computed value was written back
//! - `record_invalidate()` - a region was cleared after a write
//! - `record_error()` - a backend or decoding failure that was absorbed
//!
//! The default implementations log through the `log` crate. [`NoOpMetrics`]
//! discards everything.
//!
//! ```
//! use taskhub::observability::TtlPolicy;
//! use std::time::Duration;
//!
//! let policy = TtlPolicy::PerRegion(|region| match region {
//!     "cacheManyTasks" | "cacheManyPersons" => Duration::from_secs(300),
//!     _ => Duration::from_secs(3600),
//! });
//! assert_eq!(policy.get_ttl("cacheManyTasks"), Some(Duration::from_secs(300)));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Receives cache lifecycle events.
pub trait CacheMetrics: Send + Sync {
    fn record_hit(&self, region: &str, key: &str, duration: Duration) {
        debug!("Cache HIT: {}/{} took {:?}", region, key, duration);
    }

    fn record_miss(&self, region: &str, key: &str, duration: Duration) {
        debug!("Cache MISS: {}/{} took {:?}", region, key, duration);
    }

    fn record_set(&self, region: &str, key: &str, duration: Duration) {
        debug!("Cache SET: {}/{} took {:?}", region, key, duration);
    }

    fn record_invalidate(&self, region: &str) {
        debug!("Cache INVALIDATE: {}", region);
    }

    fn record_error(&self, region: &str, key: &str, error: &str) {
        warn!("Cache ERROR for {}/{}: {}", region, key, error);
    }
}

/// Metrics sink that drops every event.
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _region: &str, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _region: &str, _key: &str, _duration: Duration) {}
    fn record_set(&self, _region: &str, _key: &str, _duration: Duration) {}
    fn record_invalidate(&self, _region: &str) {}
    fn record_error(&self, _region: &str, _key: &str, _error: &str) {}
}

/// Counting metrics, mostly useful in tests and for periodic log summaries.
#[derive(Debug, Default)]
pub struct CountingMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    invalidations: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time copy of [`CountingMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub invalidations: u64,
    pub errors: u64,
}

impl MetricsSnapshot {
    /// Share of lookups served from cache, 0.0 when nothing was looked up.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl CountingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

impl CacheMetrics for CountingMetrics {
    fn record_hit(&self, _region: &str, _key: &str, _duration: Duration) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self, _region: &str, _key: &str, _duration: Duration) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_set(&self, _region: &str, _key: &str, _duration: Duration) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    fn record_invalidate(&self, _region: &str) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self, region: &str, key: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        warn!("Cache ERROR for {}/{}: {}", region, key, error);
    }
}

impl<M: CacheMetrics + ?Sized> CacheMetrics for Arc<M> {
    fn record_hit(&self, region: &str, key: &str, duration: Duration) {
        (**self).record_hit(region, key, duration)
    }

    fn record_miss(&self, region: &str, key: &str, duration: Duration) {
        (**self).record_miss(region, key, duration)
    }

    fn record_set(&self, region: &str, key: &str, duration: Duration) {
        (**self).record_set(region, key, duration)
    }

    fn record_invalidate(&self, region: &str) {
        (**self).record_invalidate(region)
    }

    fn record_error(&self, region: &str, key: &str, error: &str) {
        (**self).record_error(region, key, error)
    }
}

/// How long a written entry stays valid.
#[derive(Clone, Debug, Default)]
pub enum TtlPolicy {
    /// Let the backend decide (no explicit TTL)
    #[default]
    Default,

    /// Same duration for every region
    Fixed(Duration),

    /// Entries never expire
    Infinite,

    /// Duration chosen from the region name
    PerRegion(fn(&str) -> Duration),
}

impl TtlPolicy {
    /// TTL to apply to an entry written into `region`.
    pub fn get_ttl(&self, region: &str) -> Option<Duration> {
        match self {
            TtlPolicy::Default | TtlPolicy::Infinite => None,
            TtlPolicy::Fixed(d) => Some(*d),
            TtlPolicy::PerRegion(f) => Some(f(region)),
        }
    }
}
