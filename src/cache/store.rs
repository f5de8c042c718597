//! In-process cache backend

use crate::cache::{
    backend::CacheBackend,
    config::CacheConfig,
    entry::CacheEntry,
    invalidation::{InvalidationEvent, InvalidationReason},
    types::{CacheKey, CacheStats, CacheValue},
};
use crate::error::{LookupError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Process-local [`CacheBackend`]
///
/// Expired entries are dropped lazily when read, or in bulk through
/// [`cleanup_expired`](Self::cleanup_expired). When the entry or byte cap
/// is reached the entry at the front of the eviction queue goes first;
/// with `lru` enabled reads move an entry to the back.
///
/// No background task is started.
pub struct MemoryCache {
    config: CacheConfig,
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, CacheEntry>,

    /// Eviction order, front goes first
    queue: VecDeque<CacheKey>,

    bytes: usize,
    stats: CacheStats,
}

impl Inner {
    fn requeue(&mut self, key: &str) {
        if let Some(pos) = self.queue.iter().position(|k| k == key) {
            if let Some(k) = self.queue.remove(pos) {
                self.queue.push_back(k);
            }
        }
    }

    fn take(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.queue.retain(|k| k != key);
        self.bytes = self.bytes.saturating_sub(entry.metadata.size_bytes);
        Some(entry)
    }

    fn evict_front(&mut self) -> bool {
        match self.queue.pop_front() {
            Some(key) => {
                if let Some(entry) = self.entries.remove(&key) {
                    self.bytes = self.bytes.saturating_sub(entry.metadata.size_bytes);
                }
                debug!("Evicted cache entry: {}", key);
                self.stats.evicted += 1;
                true
            }
            None => false,
        }
    }
}

impl MemoryCache {
    pub fn new(config: CacheConfig) -> Self {
        info!(
            "Memory cache: max {} entries / {} bytes, ttl {:?}",
            config.max_entries, config.max_bytes, config.ttl
        );

        Self {
            config,
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Whether a live entry exists, without counting a read
    pub async fn contains_key(&self, key: &str) -> bool {
        self.inner
            .read()
            .await
            .entries
            .get(key)
            .map_or(false, |entry| !entry.is_expired())
    }

    /// Drop every entry
    pub async fn clear(&self) -> usize {
        let mut inner = self.inner.write().await;
        let count = inner.entries.len();

        inner.entries.clear();
        inner.queue.clear();
        inner.bytes = 0;
        inner.stats.invalidations += count as u64;
        self.refresh_gauges(&mut inner);

        info!("Cleared {} cache entries", count);
        count
    }

    /// Drop every expired entry now
    ///
    /// Returns `None` when nothing had expired.
    pub async fn cleanup_expired(&self) -> Option<InvalidationEvent> {
        let mut inner = self.inner.write().await;

        let expired: Vec<CacheKey> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        if expired.is_empty() {
            return None;
        }

        for key in &expired {
            inner.take(key);
        }
        inner.stats.expired += expired.len() as u64;
        self.refresh_gauges(&mut inner);

        debug!("Swept {} expired cache entries", expired.len());
        let removed = expired.len();
        Some(InvalidationEvent::new(InvalidationReason::Expired, expired).with_removed(removed))
    }

    pub async fn size_bytes(&self) -> usize {
        self.inner.read().await.bytes
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    fn check_fits(&self, incoming: usize) -> Result<()> {
        if incoming <= self.config.max_bytes {
            return Ok(());
        }

        warn!(
            "Rejecting {} byte cache entry, cap is {} bytes",
            incoming, self.config.max_bytes
        );
        Err(LookupError::CacheError(format!(
            "entry of {} bytes exceeds cache size limit of {} bytes",
            incoming, self.config.max_bytes
        )))
    }

    /// Evict until a new entry of `incoming` bytes fits under both caps
    fn make_room(&self, inner: &mut Inner, incoming: usize) {
        while inner.entries.len() >= self.config.max_entries && inner.evict_front() {}
        while inner.bytes + incoming > self.config.max_bytes && inner.evict_front() {}
    }

    fn refresh_gauges(&self, inner: &mut Inner) {
        inner.stats.entries = inner.entries.len();
        if self.config.track_size {
            inner.stats.size_bytes = inner.bytes;
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let mut inner = self.inner.write().await;

        match inner.entries.get(key).map(CacheEntry::is_expired) {
            None => {}
            Some(true) => {
                debug!("Cache entry expired: {}", key);
                inner.take(key);
                inner.stats.expired += 1;
                self.refresh_gauges(&mut inner);
            }
            Some(false) => {
                let value = inner.entries.get_mut(key).map(|entry| {
                    entry.record_read();
                    entry.value.clone()
                });
                inner.stats.hits += 1;
                if self.config.lru {
                    inner.requeue(key);
                }
                debug!("Cache hit: {}", key);
                return Ok(value);
            }
        }

        inner.stats.misses += 1;
        debug!("Cache miss: {}", key);
        Ok(None)
    }

    async fn insert(&self, key: CacheKey, value: CacheValue) -> Result<()> {
        let incoming = CacheEntry::charged_size(&key, &value);
        if let Err(e) = self.check_fits(incoming) {
            // An oversized overwrite still retires the old value
            let mut inner = self.inner.write().await;
            if inner.take(&key).is_some() {
                inner.stats.invalidations += 1;
                self.refresh_gauges(&mut inner);
                debug!("Dropped stale cache entry: {}", key);
            }
            return Err(e);
        }

        let ttl = self.config.entry_ttl();
        let mut inner = self.inner.write().await;

        // An overwrite gives back the old entry's bytes before making room
        let previous = inner.take(&key);
        self.make_room(&mut inner, incoming);

        let entry = match previous {
            Some(mut entry) => {
                debug!("Overwriting cache entry: {}", key);
                entry.replace(&key, value, ttl);
                entry
            }
            None => CacheEntry::new(&key, value, ttl),
        };
        inner.bytes += entry.metadata.size_bytes;
        inner.entries.insert(key.clone(), entry);
        inner.queue.push_back(key);

        inner.stats.writes += 1;
        self.refresh_gauges(&mut inner);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<Option<CacheValue>> {
        let mut inner = self.inner.write().await;

        let entry = match inner.take(key) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        inner.stats.invalidations += 1;
        self.refresh_gauges(&mut inner);

        debug!("Removed cache entry: {}", key);
        Ok(Some(entry.value))
    }

    async fn remove_many(&self, keys: &[CacheKey]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut inner = self.inner.write().await;
        let removed = keys.iter().filter(|key| inner.take(key).is_some()).count();
        inner.stats.invalidations += removed as u64;
        self.refresh_gauges(&mut inner);

        debug!("Removed {} of {} cache entries", removed, keys.len());
        Ok(removed)
    }

    async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats.clone()
    }

    fn name(&self) -> &str {
        "memory"
    }
}
