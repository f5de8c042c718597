//! Cache sizing and expiry settings

use crate::error::{LookupError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One week
const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Settings of a [`MemoryCache`](crate::cache::MemoryCache)
///
/// Entries stay valid until the invalidation protocol deletes them. `ttl`
/// only bounds how long an entry missed by invalidation can survive; `None`
/// turns expiry off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl: Option<Duration>,

    /// Entry cap; the least recently used entry makes room beyond it
    pub max_entries: usize,

    /// Byte cap over keys, payloads and bookkeeping
    pub max_bytes: usize,

    /// Spread of each entry's TTL as a fraction of `ttl` (0.0 - 1.0)
    pub ttl_jitter: f64,

    /// Reads refresh an entry's eviction rank; otherwise eviction is FIFO
    pub lru: bool,

    /// Report `size_bytes` in [`CacheStats`](crate::cache::CacheStats)
    pub track_size: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Some(DEFAULT_TTL),
            max_entries: 10_000,
            max_bytes: 64 * 1024 * 1024,
            ttl_jitter: 0.1,
            lru: true,
            track_size: true,
        }
    }
}

impl CacheConfig {
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder {
            config: Self::default(),
        }
    }

    /// Reject settings the cache cannot honor
    pub fn validate(&self) -> Result<()> {
        let problem = if self.max_entries == 0 {
            Some("max_entries must be at least 1")
        } else if self.max_bytes == 0 {
            Some("max_bytes must be at least 1")
        } else if !(0.0..=1.0).contains(&self.ttl_jitter) {
            Some("ttl_jitter must lie within 0.0..=1.0")
        } else if self.ttl == Some(Duration::ZERO) {
            Some("ttl must be non-zero, use None to turn expiry off")
        } else {
            None
        };

        match problem {
            Some(message) => Err(LookupError::ConfigError(message.to_string())),
            None => Ok(()),
        }
    }

    /// TTL for one new entry, randomly spread by `ttl_jitter`
    pub fn entry_ttl(&self) -> Option<Duration> {
        let ttl = self.ttl?;
        if self.ttl_jitter <= 0.0 {
            return Some(ttl);
        }

        let factor = 1.0 + rand::thread_rng().gen_range(-self.ttl_jitter..=self.ttl_jitter);
        let secs = (ttl.as_secs_f64() * factor).max(0.001);
        Some(Duration::try_from_secs_f64(secs).unwrap_or(ttl))
    }

    /// Settings for a small embedded cache
    pub fn small() -> Self {
        Self {
            ttl: Some(Duration::from_secs(24 * 3600)),
            max_entries: 1_000,
            max_bytes: 4 * 1024 * 1024,
            ..Self::default()
        }
    }
}

/// Builder over [`CacheConfig::default`]
#[derive(Debug, Clone)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = Some(ttl);
        self
    }

    /// Entries never expire; only invalidation and eviction remove them
    pub fn no_ttl(mut self) -> Self {
        self.config.ttl = None;
        self
    }

    pub fn max_entries(mut self, max: usize) -> Self {
        self.config.max_entries = max;
        self
    }

    pub fn max_bytes(mut self, max: usize) -> Self {
        self.config.max_bytes = max;
        self
    }

    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.config.ttl_jitter = jitter;
        self
    }

    pub fn lru(mut self, enabled: bool) -> Self {
        self.config.lru = enabled;
        self
    }

    pub fn track_size(mut self, enabled: bool) -> Self {
        self.config.track_size = enabled;
        self
    }

    pub fn build(self) -> CacheConfig {
        self.config
    }
}
