//! Cache backend implementations.

use crate::error::Result;
use std::time::Duration;

pub mod inmemory;
pub mod noop;

pub use inmemory::InMemoryBackend;
pub use noop::NoOpBackend;

/// Trait for cache backend implementations.
///
/// Storage is partitioned into named regions. Every entry lives in exactly
/// one region and a whole region can be dropped at once.
///
/// **IMPORTANT:** All methods use `&self` instead of `&mut self` to allow concurrent access.
/// Backend implementations should use interior mutability.
///
/// **ASYNC:** All methods are async and must be awaited.
#[allow(async_fn_in_trait)]
pub trait CacheBackend: Send + Sync + Clone {
    /// Retrieve value from a region.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Value found and not expired
    /// - `Ok(None)` - Cache miss
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn get(&self, region: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store value in a region with optional TTL.
    ///
    /// # Arguments
    /// - `region`: Region name
    /// - `key`: Key within the region
    /// - `value`: Serialized bytes
    /// - `ttl`: Time-to-live. None = no expiry
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn set(&self, region: &str, key: &str, value: Vec<u8>, ttl: Option<Duration>)
        -> Result<()>;

    /// Remove one value.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn delete(&self, region: &str, key: &str) -> Result<()>;

    /// Check if key exists in a region (optional optimization).
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn exists(&self, region: &str, key: &str) -> Result<bool> {
        Ok(self.get(region, key).await?.is_some())
    }

    /// Drop every entry of a region immediately.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn clear_region(&self, region: &str) -> Result<()>;

    /// Drop every entry of every region.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn clear_all(&self) -> Result<()>;

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Backend selected from configuration at startup.
#[derive(Clone)]
pub enum ConfiguredBackend {
    InMemory(InMemoryBackend),
    Disabled(NoOpBackend),
}

impl ConfiguredBackend {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ConfiguredBackend::InMemory(_))
    }
}

impl CacheBackend for ConfiguredBackend {
    async fn get(&self, region: &str, key: &str) -> Result<Option<Vec<u8>>> {
        match self {
            ConfiguredBackend::InMemory(b) => b.get(region, key).await,
            ConfiguredBackend::Disabled(b) => b.get(region, key).await,
        }
    }

    async fn set(
        &self,
        region: &str,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        match self {
            ConfiguredBackend::InMemory(b) => b.set(region, key, value, ttl).await,
            ConfiguredBackend::Disabled(b) => b.set(region, key, value, ttl).await,
        }
    }

    async fn delete(&self, region: &str, key: &str) -> Result<()> {
        match self {
            ConfiguredBackend::InMemory(b) => b.delete(region, key).await,
            ConfiguredBackend::Disabled(b) => b.delete(region, key).await,
        }
    }

    async fn clear_region(&self, region: &str) -> Result<()> {
        match self {
            ConfiguredBackend::InMemory(b) => b.clear_region(region).await,
            ConfiguredBackend::Disabled(b) => b.clear_region(region).await,
        }
    }

    async fn clear_all(&self) -> Result<()> {
        match self {
            ConfiguredBackend::InMemory(b) => b.clear_all().await,
            ConfiguredBackend::Disabled(b) => b.clear_all().await,
        }
    }
}
