//! Runtime configuration loaded from TOML.
//!
//! ```toml
//! [cache]
//! enabled = true
//! max_entries_per_region = 200
//! ttl_secs = 3600
//! ```

use crate::error::Result;
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_MAX_ENTRIES_PER_REGION: usize = 200;
pub const DEFAULT_TTL_SECS: u64 = 60 * 60;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
}

/// Cache section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Turn caching on or off. Results are identical either way.
    pub enabled: bool,
    /// LRU bound applied to each region independently.
    pub max_entries_per_region: usize,
    /// Expiry after write, in seconds. Zero means entries never expire.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries_per_region: DEFAULT_MAX_ENTRIES_PER_REGION,
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl CacheConfig {
    /// Region bound as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries_per_region).unwrap_or(NonZeroUsize::MIN)
    }

    /// Expiry for written entries, `None` when `ttl_secs` is zero.
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}

impl Config {
    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` on malformed TOML or mistyped fields.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            error!("Cannot read config {}: {}", path.display(), e);
            e
        })?;
        let config = Self::from_toml_str(&raw)?;
        info!(
            "Loaded config from {} (cache enabled: {}, {} entries/region, ttl {}s)",
            path.display(),
            config.cache.enabled,
            config.cache.max_entries_per_region,
            config.cache.ttl_secs
        );
        Ok(config)
    }
}
