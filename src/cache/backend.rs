//! Cache backend trait
//!
//! [`CachedLanguageTargetLinks`](crate::cache::CachedLanguageTargetLinks)
//! talks to its storage only through this trait, so a process-local map and
//! an external key-value service are interchangeable.

use crate::cache::types::{CacheKey, CacheStats, CacheValue};
use crate::error::Result;
use async_trait::async_trait;

/// Key-value storage for serialized cache payloads
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a value, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Insert or overwrite a value
    async fn insert(&self, key: CacheKey, value: CacheValue) -> Result<()>;

    /// Remove a value; removing an absent key is a no-op returning `None`
    async fn remove(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Remove several keys, returning how many were present
    async fn remove_many(&self, keys: &[CacheKey]) -> Result<usize> {
        let mut removed = 0;
        for key in keys {
            if self.remove(key).await?.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Current counters
    async fn stats(&self) -> CacheStats;

    /// Human-readable backend name (for logging)
    fn name(&self) -> &str;
}
