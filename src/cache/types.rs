//! Shared cache types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key, built by [`CacheKeyBuilder`](crate::cache::CacheKeyBuilder)
pub type CacheKey = String;

/// Serialized JSON payload
pub type CacheValue = String;

/// Counters kept by a cache backend
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,

    /// Reads that found nothing, or only an expired entry
    pub misses: u64,

    /// Inserts and overwrites
    pub writes: u64,

    pub entries: usize,
    pub size_bytes: usize,

    /// Dropped to make room under the entry or byte cap
    pub evicted: u64,

    /// Dropped because the safety-net TTL ran out
    pub expired: u64,

    /// Removed through explicit deletion
    pub invalidations: u64,
}

impl CacheStats {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups answered from the cache, `None` before any lookup
    pub fn hit_ratio(&self) -> Option<f64> {
        match self.lookups() {
            0 => None,
            lookups => Some(self.hits as f64 / lookups as f64),
        }
    }

    /// Entries that left the cache for any reason
    pub fn removals(&self) -> u64 {
        self.evicted + self.expired + self.invalidations
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={} misses={} writes={} entries={} removed={}",
            self.hits,
            self.misses,
            self.writes,
            self.entries,
            self.removals()
        )?;
        if let Some(ratio) = self.hit_ratio() {
            write!(f, " hit_ratio={:.2}", ratio)?;
        }
        Ok(())
    }
}
