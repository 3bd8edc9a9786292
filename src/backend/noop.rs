//! Backend used when caching is switched off.

use super::CacheBackend;
use crate::error::Result;
use std::time::Duration;

/// Backend that stores nothing: every read misses, every write is dropped.
///
/// Services behave identically with this backend, only slower.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpBackend;

impl CacheBackend for NoOpBackend {
    async fn get(&self, _region: &str, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn set(
        &self,
        _region: &str,
        _key: &str,
        _value: Vec<u8>,
        _ttl: Option<Duration>,
    ) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _region: &str, _key: &str) -> Result<()> {
        Ok(())
    }

    async fn clear_region(&self, _region: &str) -> Result<()> {
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        Ok(())
    }
}
