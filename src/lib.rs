//! # Interlanguage Link Lookup (interlang-kg)
//!
//! Resolves interlanguage links over a knowledge graph store and keeps a
//! cache of the results coherent with the store.
//!
//! ## Features
//!
//! - Language target link resolution by shared reference key
//! - Last known page language per target page
//! - Two-tier cache keyed by reference key and page title
//! - Targeted invalidation when a page's containers change
//! - In-memory and Neo4j store adapters behind one async trait
//!
//! ## Example
//!
//! ```no_run
//! use interlang_kg::{
//!     CacheConfig, CachedLanguageTargetLinks, InMemoryStore, InterlanguageLink,
//!     InterlanguageLinksLookup, MemoryCache, Title,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let cache = Arc::new(CachedLanguageTargetLinks::new(Arc::new(MemoryCache::new(
//!         CacheConfig::default(),
//!     ))));
//!     let lookup = InterlanguageLinksLookup::new(cache, store.clone());
//!
//!     let link = InterlanguageLink::new(Title::new("Foo"), "en", Title::new("Topic"));
//!     store.add_interlanguage_link(&link, &Title::new("Foo")).await;
//!
//!     let links = lookup.language_target_links(&link).await?;
//!     println!("{:?}", links);
//!
//!     // After the page changes
//!     lookup
//!         .do_invalidate_cached_language_target_links(&Title::new("Foo"))
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Neo4j
//!
//! ```no_run
//! use interlang_kg::{config::Neo4jSettings, Neo4jStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Neo4jStore::connect(&Neo4jSettings::from_env()).await?;
//!     println!("Database healthy: {}", store.health_check().await?);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod lookup;
pub mod query;
pub mod schema;
pub mod store;
pub mod telemetry;

// Re-export main types for convenience
pub use cache::{
    CacheBackend, CacheConfig, CacheConfigBuilder, CacheStats, CachedLanguageTargetLinks,
    InvalidationEvent, InvalidationReason, LanguageTargetLinks, MemoryCache,
};
pub use config::{LookupConfig, Neo4jSettings};
pub use error::{LookupError, Result};
pub use lookup::InterlanguageLinksLookup;
pub use query::{Description, PrintRequest, Query, QueryResult, ResultField, ResultRow};
pub use schema::{DataItem, DataValue, InterlanguageLink, Property, PropertyRegistry, Title, WikiPage};
pub use store::{InMemoryStore, Neo4jStore, SemanticStore};
