//! Stored cache entries and their bookkeeping

use crate::cache::types::CacheValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bytes charged per entry on top of key and payload
const ENTRY_OVERHEAD: usize = std::mem::size_of::<CacheMetadata>();

/// A payload plus the data eviction and expiry decisions need
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: CacheValue,
    pub metadata: CacheMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub inserted_at: DateTime<Utc>,
    pub last_read_at: Option<DateTime<Utc>>,

    /// `None` for entries that never expire
    pub expires_at: Option<DateTime<Utc>>,

    pub reads: u64,

    /// Charged size, see [`CacheEntry::charged_size`]
    pub size_bytes: usize,

    /// Starts at 1, bumped by every overwrite
    pub version: u64,
}

impl CacheEntry {
    pub fn new(key: &str, value: CacheValue, ttl: Option<Duration>) -> Self {
        let now = Utc::now();
        let size_bytes = Self::charged_size(key, &value);

        Self {
            value,
            metadata: CacheMetadata {
                inserted_at: now,
                last_read_at: None,
                expires_at: deadline(now, ttl),
                reads: 0,
                size_bytes,
                version: 1,
            },
        }
    }

    /// Size an entry for `key` and `value` counts against the byte cap
    pub fn charged_size(key: &str, value: &str) -> usize {
        key.len() + value.len() + ENTRY_OVERHEAD
    }

    pub fn is_expired(&self) -> bool {
        self.metadata
            .expires_at
            .map_or(false, |deadline| Utc::now() >= deadline)
    }

    /// Time left before expiry; `None` if the entry never expires
    pub fn remaining_ttl(&self) -> Option<Duration> {
        let deadline = self.metadata.expires_at?;
        Some((deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO))
    }

    /// Record a read
    pub fn record_read(&mut self) {
        self.metadata.last_read_at = Some(Utc::now());
        self.metadata.reads += 1;
    }

    /// Swap in a new payload with a fresh deadline
    pub fn replace(&mut self, key: &str, value: CacheValue, ttl: Option<Duration>) {
        self.metadata.size_bytes = Self::charged_size(key, &value);
        self.metadata.expires_at = deadline(Utc::now(), ttl);
        self.metadata.version += 1;
        self.value = value;
    }
}

fn deadline(from: DateTime<Utc>, ttl: Option<Duration>) -> Option<DateTime<Utc>> {
    // A deadline past chrono's range behaves like no deadline
    let ttl = chrono::Duration::from_std(ttl?).ok()?;
    from.checked_add_signed(ttl)
}
