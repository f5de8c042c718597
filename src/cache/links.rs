//! Cache of language target links and page languages
//!
//! Two tiers share one backend:
//! - reference key -> [`LanguageTargetLinks`] (language code -> target page)
//! - page title -> last known language code
//!
//! Entries are derived from the store and valid until the invalidation
//! protocol deletes them. An entry whose payload cannot be read is dropped
//! and reported as a miss so the caller recomputes it.

use crate::cache::{
    backend::CacheBackend,
    invalidation::{InvalidationEvent, InvalidationReason},
    keys::{CacheKeyBuilder, CacheNamespace},
    types::{CacheKey, CacheValue},
};
use crate::error::Result;
use crate::schema::link::{reference_key_of, InterlanguageLink};
use crate::schema::types::{DataItem, Title};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Language code -> target page, for one reference key
pub type LanguageTargetLinks = BTreeMap<String, Title>;

/// Bumped whenever the payload layout changes, so stale layouts miss
const PAYLOAD_VERSION: u32 = 1;

/// Serialized form of a cached link set
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedLinks {
    reference: String,
    links: LanguageTargetLinks,
    cached_at: DateTime<Utc>,
}

/// Serialized form of a cached page language
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedPageLanguage {
    language_code: String,
    cached_at: DateTime<Utc>,
}

/// Cache front for interlanguage lookups
///
/// Takes its backend by injection; nothing here is process-global.
pub struct CachedLanguageTargetLinks {
    backend: Arc<dyn CacheBackend>,
}

impl CachedLanguageTargetLinks {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Get the underlying backend
    pub fn backend(&self) -> Arc<dyn CacheBackend> {
        self.backend.clone()
    }

    /// Key of the link set for a reference key
    pub fn links_key(reference_key: &str) -> CacheKey {
        CacheKeyBuilder::new(CacheNamespace::LanguageTargetLinks)
            .identifier(reference_key)
            .version(PAYLOAD_VERSION)
            .build()
    }

    /// Key of the cached language of a page
    pub fn page_language_key(title: &Title) -> CacheKey {
        CacheKeyBuilder::new(CacheNamespace::PageLanguage)
            .identifier(title.db_key())
            .version(PAYLOAD_VERSION)
            .build()
    }

    /// Cached mapping for the link's reference key
    ///
    /// `Ok(None)` means absent; an empty mapping that was cached comes back
    /// as `Ok(Some(empty))`.
    pub async fn get_language_target_links_from_cache(
        &self,
        link: &InterlanguageLink,
    ) -> Result<Option<LanguageTargetLinks>> {
        let key = Self::links_key(link.reference_key());

        let value = match self.backend.get(&key).await? {
            Some(value) => value,
            None => return Ok(None),
        };

        match serde_json::from_str::<CachedLinks>(&value) {
            Ok(cached) => Ok(Some(cached.links)),
            Err(e) => {
                self.drop_corrupt(&key, &e).await?;
                Ok(None)
            }
        }
    }

    /// Cached language code of a page
    pub async fn get_page_language_from_cache(&self, title: &Title) -> Result<Option<String>> {
        let key = Self::page_language_key(title);

        let value = match self.backend.get(&key).await? {
            Some(value) => value,
            None => return Ok(None),
        };

        match serde_json::from_str::<CachedPageLanguage>(&value) {
            Ok(cached) => Ok(Some(cached.language_code)),
            Err(e) => {
                self.drop_corrupt(&key, &e).await?;
                Ok(None)
            }
        }
    }

    /// Store or overwrite the mapping for the link's reference key
    pub async fn save_language_target_links_to_cache(
        &self,
        link: &InterlanguageLink,
        links: &LanguageTargetLinks,
    ) -> Result<()> {
        let payload = CachedLinks {
            reference: link.reference_key().to_string(),
            links: links.clone(),
            cached_at: Utc::now(),
        };
        let value: CacheValue = serde_json::to_string(&payload)?;

        debug!(
            "Caching {} language target links for reference {}",
            links.len(),
            link.reference_key()
        );
        self.backend
            .insert(Self::links_key(link.reference_key()), value)
            .await
    }

    /// Store the language code of a page; empty codes are not cached
    pub async fn save_page_language_to_cache(&self, title: &Title, language_code: &str) -> Result<()> {
        if language_code.is_empty() {
            return Ok(());
        }

        let payload = CachedPageLanguage {
            language_code: language_code.to_string(),
            cached_at: Utc::now(),
        };
        let value: CacheValue = serde_json::to_string(&payload)?;

        self.backend
            .insert(Self::page_language_key(title), value)
            .await
    }

    /// Purge the link sets of every reference among `references`
    ///
    /// Items that carry no reference key are ignored; an empty slice is a
    /// no-op.
    pub async fn delete_language_target_links_from_cache(
        &self,
        references: &[DataItem],
    ) -> Result<InvalidationEvent> {
        let mut keys: Vec<CacheKey> = Vec::with_capacity(references.len());
        for item in references {
            match reference_key_of(item) {
                Some(reference) => {
                    let key = Self::links_key(&reference);
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                None => debug!("Ignoring non-reference item: {}", item.serialization()),
            }
        }

        if keys.is_empty() {
            return Ok(InvalidationEvent::new(InvalidationReason::Manual, keys));
        }

        let removed = self.backend.remove_many(&keys).await?;
        debug!("Deleted {} of {} cached link sets", removed, keys.len());

        Ok(InvalidationEvent::new(InvalidationReason::Manual, keys).with_removed(removed))
    }

    /// Purge the cached language of a page
    pub async fn delete_page_language_for_target_from_cache(&self, title: &Title) -> Result<()> {
        self.backend
            .remove(&Self::page_language_key(title))
            .await
            .map(|_| ())
    }

    async fn drop_corrupt(&self, key: &str, error: &serde_json::Error) -> Result<()> {
        warn!("Dropping unreadable cache entry {}: {}", key, error);
        self.backend.remove(key).await?;
        info!("{}: {}", InvalidationReason::Corrupt, key);
        Ok(())
    }
}
