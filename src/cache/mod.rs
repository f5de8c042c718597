//! # Interlanguage Link Cache
//!
//! Two cache tiers sit in front of the semantic store:
//!
//! - **Language target links**: reference key -> (language code -> page)
//! - **Page language**: page title -> last known language code
//!
//! Both are keyed by logical identity, never by store address, and live in
//! a pluggable [`CacheBackend`]. [`MemoryCache`] is the in-process backend:
//! LRU eviction, size limits and an optional TTL that only acts as a safety
//! net. Correctness comes from explicit invalidation.
//!
//! ## Example
//!
//! ```rust
//! use interlang_kg::cache::{CacheConfig, CachedLanguageTargetLinks, LanguageTargetLinks, MemoryCache};
//! use interlang_kg::schema::{InterlanguageLink, Title};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = CacheConfig::builder()
//!     .ttl(Duration::from_secs(24 * 3600))
//!     .max_entries(10_000)
//!     .build();
//!
//! let cache = CachedLanguageTargetLinks::new(Arc::new(MemoryCache::new(config)));
//!
//! let link = InterlanguageLink::new(Title::new("Foo"), "en", Title::new("Topic"));
//! let mut links = LanguageTargetLinks::new();
//! links.insert("en".to_string(), Title::new("Foo"));
//!
//! cache.save_language_target_links_to_cache(&link, &links).await?;
//!
//! if let Some(found) = cache.get_language_target_links_from_cache(&link).await? {
//!     println!("Cache hit: {} languages", found.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod entry;
pub mod invalidation;
pub mod keys;
pub mod links;
pub mod store;
pub mod types;

pub use backend::CacheBackend;
pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::{CacheEntry, CacheMetadata};
pub use invalidation::{InvalidationEvent, InvalidationReason};
pub use keys::{CacheKeyBuilder, CacheNamespace};
pub use links::{CachedLanguageTargetLinks, LanguageTargetLinks};
pub use store::MemoryCache;
pub use types::{CacheKey, CacheStats, CacheValue};
