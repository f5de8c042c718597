//! Interlanguage link lookup
//!
//! Resolves the language target links of a reference key from the semantic
//! store, answers the last known language of a page, and invalidates the
//! cache when a page's interlanguage containers may have changed.
//!
//! Serve-from-cache and recompute-from-store are separate operations; the
//! caller decides which to use. [`language_target_links`] and
//! [`page_language_for_target`] combine the two in the usual order.
//!
//! [`language_target_links`]: InterlanguageLinksLookup::language_target_links
//! [`page_language_for_target`]: InterlanguageLinksLookup::page_language_for_target

use crate::cache::{
    CachedLanguageTargetLinks, InvalidationEvent, InvalidationReason, LanguageTargetLinks,
    MemoryCache,
};
use crate::config::LookupConfig;
use crate::error::{LookupError, Result};
use crate::query::{Description, PrintRequest, Query, SortOrder};
use crate::schema::link::InterlanguageLink;
use crate::schema::properties::PropertyRegistry;
use crate::schema::types::{DataItem, Title, WikiPage};
use crate::store::SemanticStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lookup service over a semantic store and the link cache
pub struct InterlanguageLinksLookup {
    cache: Arc<CachedLanguageTargetLinks>,
    store: Arc<dyn SemanticStore>,
    config: LookupConfig,
}

impl InterlanguageLinksLookup {
    /// Create a lookup with the default configuration
    pub fn new(cache: Arc<CachedLanguageTargetLinks>, store: Arc<dyn SemanticStore>) -> Self {
        Self::with_config(cache, store, LookupConfig::default())
    }

    pub fn with_config(
        cache: Arc<CachedLanguageTargetLinks>,
        store: Arc<dyn SemanticStore>,
        config: LookupConfig,
    ) -> Self {
        Self {
            cache,
            store,
            config,
        }
    }

    /// Validate `config` and build a lookup over a fresh [`MemoryCache`]
    pub fn with_memory_cache(store: Arc<dyn SemanticStore>, config: LookupConfig) -> Result<Self> {
        config.validate()?;

        let backend = Arc::new(MemoryCache::new(config.cache.clone()));
        let cache = Arc::new(CachedLanguageTargetLinks::new(backend));
        Ok(Self::with_config(cache, store, config))
    }

    /// Replace the store used by subsequent operations
    pub fn set_store(&mut self, store: Arc<dyn SemanticStore>) {
        self.store = store;
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<CachedLanguageTargetLinks> {
        &self.cache
    }

    /// Cached mapping for the link's reference key, without touching the store
    pub async fn try_cached_language_target_links(
        &self,
        link: &InterlanguageLink,
    ) -> Result<Option<LanguageTargetLinks>> {
        self.cache.get_language_target_links_from_cache(link).await
    }

    /// Cached language of a page, without touching the store
    pub async fn try_cached_page_language_for_target(&self, title: &Title) -> Result<Option<String>> {
        self.cache.get_page_language_from_cache(title).await
    }

    /// Query every page sharing the link's reference key
    ///
    /// Always hits the store. The resulting mapping is written to the cache
    /// before it is returned, including when it is empty. A mapping too large
    /// for the cache is returned uncached. When two rows report the same
    /// language code, the later row wins.
    pub async fn query_language_target_links(
        &self,
        link: &InterlanguageLink,
    ) -> Result<LanguageTargetLinks> {
        let query = self.language_target_links_query(link);
        let mut result = self.store.get_query_result(&query).await?;

        if result.has_further_results() {
            warn!(
                "Link query for reference {} was truncated at {:?} rows",
                link.reference_key(),
                query.limit()
            );
        }

        let mut links = LanguageTargetLinks::new();
        while let Some(row) = result.next_row() {
            for mut field in row.into_fields() {
                let value = match field.next_data_value() {
                    Some(value) => value,
                    None => {
                        debug!("Skipping row without language: {}", field.result_subject());
                        continue;
                    }
                };

                links.insert(value.wiki_value(), field.result_subject().title().clone());
            }
        }

        debug!(
            "Resolved {} language target links for reference {}",
            links.len(),
            link.reference_key()
        );

        match self.cache.save_language_target_links_to_cache(link, &links).await {
            Ok(()) => {}
            Err(LookupError::CacheError(e)) => {
                warn!(
                    "Language target links for reference {} not cached: {}",
                    link.reference_key(),
                    e
                );
            }
            Err(e) => return Err(e),
        }

        Ok(links)
    }

    /// Language code of the most recently asserted container on `title`
    ///
    /// Returns an empty string when the page has no container or the
    /// container has no textual language value.
    pub async fn find_last_page_language_for_target(&self, title: &Title) -> Result<String> {
        let containers = self
            .store
            .get_property_values(&WikiPage::from_title(title), &PropertyRegistry::container())
            .await?;

        let container = match containers.last().and_then(DataItem::as_wiki_page) {
            Some(container) => container,
            None => return Ok(String::new()),
        };

        let languages = self
            .store
            .get_property_values(container, &PropertyRegistry::language())
            .await?;

        Ok(languages
            .last()
            .and_then(DataItem::as_blob)
            .map(str::to_string)
            .unwrap_or_default())
    }

    /// Reference values of every container recorded on `title`
    ///
    /// Containers are visited in store order; duplicates are kept.
    pub async fn find_link_references_for_target(&self, title: &Title) -> Result<Vec<DataItem>> {
        let containers = self
            .store
            .get_property_values(&WikiPage::from_title(title), &PropertyRegistry::container())
            .await?;

        let mut references = Vec::new();
        for item in &containers {
            let container = match item.as_wiki_page() {
                Some(container) => container,
                None => {
                    debug!("Skipping non-page container value: {}", item.serialization());
                    continue;
                }
            };

            let values = self
                .store
                .get_property_values(container, &PropertyRegistry::reference())
                .await?;
            references.extend(values);
        }

        Ok(references)
    }

    /// Drop every cached entry that may depend on the containers of `title`
    ///
    /// Deletes the link sets of all references found on the page, then the
    /// page's cached language. A store failure aborts before anything is
    /// deleted.
    pub async fn do_invalidate_cached_language_target_links(
        &self,
        title: &Title,
    ) -> Result<InvalidationEvent> {
        let references = self.find_link_references_for_target(title).await?;

        let mut event = self
            .cache
            .delete_language_target_links_from_cache(&references)
            .await?;
        event.reason = InvalidationReason::TargetChanged {
            page: title.db_key().to_string(),
        };

        self.cache
            .delete_page_language_for_target_from_cache(title)
            .await?;

        info!(
            "Invalidated {} cached link sets ({} references) for {}",
            event.removed,
            references.len(),
            title
        );

        Ok(event.with_context(format!("{} references", references.len())))
    }

    /// Cached mapping if present, otherwise a fresh query
    pub async fn language_target_links(
        &self,
        link: &InterlanguageLink,
    ) -> Result<LanguageTargetLinks> {
        if let Some(links) = self.try_cached_language_target_links(link).await? {
            return Ok(links);
        }

        self.query_language_target_links(link).await
    }

    /// Cached page language if present, otherwise read from the store
    ///
    /// Non-empty results read from the store are cached.
    pub async fn page_language_for_target(&self, title: &Title) -> Result<String> {
        if let Some(language_code) = self.try_cached_page_language_for_target(title).await? {
            return Ok(language_code);
        }

        let language_code = self.find_last_page_language_for_target(title).await?;
        self.cache
            .save_page_language_to_cache(title, &language_code)
            .await?;

        Ok(language_code)
    }

    fn language_target_links_query(&self, link: &InterlanguageLink) -> Query {
        let reference = link.link_reference_data_value();
        let language = link.language_data_value();

        let description = Description::conjunction(vec![Description::some_property(
            reference.property().clone(),
            Description::value(reference.data_item().clone()),
        )]);

        let query = Query::new(description)
            .with_print_request(PrintRequest::property(language.property().clone()))
            .with_limit(self.config.query_limit);

        if self.config.sort_results {
            query.sorted_by(language.property().clone(), SortOrder::Ascending)
        } else {
            query
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::store::InMemoryStore;

    struct Fixture {
        store: Arc<InMemoryStore>,
        lookup: InterlanguageLinksLookup,
    }

    fn fixture() -> Fixture {
        fixture_with(LookupConfig::default())
    }

    fn fixture_with(config: LookupConfig) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(CachedLanguageTargetLinks::new(Arc::new(MemoryCache::new(
            CacheConfig::default(),
        ))));
        let lookup = InterlanguageLinksLookup::with_config(cache, store.clone(), config);
        Fixture { store, lookup }
    }

    fn link(page: &str, lang: &str, reference: &str) -> InterlanguageLink {
        InterlanguageLink::new(Title::new(page), lang, Title::new(reference))
    }

    async fn annotate(store: &InMemoryStore, page: &str, lang: &str, reference: &str) {
        store
            .add_interlanguage_link(&link(page, lang, reference), &Title::new(page))
            .await;
    }

    #[tokio::test]
    async fn test_query_builds_mapping_and_caches_it() {
        let f = fixture();
        annotate(&f.store, "Foo", "en", "Topic").await;
        annotate(&f.store, "Foo_de", "de", "Topic").await;
        annotate(&f.store, "Bar", "en", "Other").await;

        let topic_link = link("Foo", "en", "Topic");
        assert!(f.lookup.try_cached_language_target_links(&topic_link).await.unwrap().is_none());

        let links = f.lookup.query_language_target_links(&topic_link).await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links["en"], Title::new("Foo"));
        assert_eq!(links["de"], Title::new("Foo de"));

        let cached = f.lookup.try_cached_language_target_links(&topic_link).await.unwrap();
        assert_eq!(cached, Some(links));
    }

    #[tokio::test]
    async fn test_query_with_no_matches_caches_empty_mapping() {
        let f = fixture();
        let topic_link = link("Foo", "en", "Nowhere");

        let links = f.lookup.query_language_target_links(&topic_link).await.unwrap();
        assert!(links.is_empty());
        assert_eq!(
            f.lookup.try_cached_language_target_links(&topic_link).await.unwrap(),
            Some(LanguageTargetLinks::new())
        );
    }

    #[tokio::test]
    async fn test_row_without_language_is_skipped() {
        let f = fixture();
        annotate(&f.store, "Foo", "en", "Topic").await;

        // Container with a reference but no language value
        let broken = WikiPage::with_subobject(Title::new("Broken"), "_SILbroken");
        f.store
            .add_property_value(
                broken,
                PropertyRegistry::reference(),
                DataItem::WikiPage(WikiPage::new(Title::new("Topic"))),
            )
            .await;

        let links = f
            .lookup
            .query_language_target_links(&link("Foo", "en", "Topic"))
            .await
            .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links["en"], Title::new("Foo"));
    }

    #[tokio::test]
    async fn test_later_row_wins_for_same_language() {
        let f = fixture();
        annotate(&f.store, "T1", "en", "Topic").await;
        annotate(&f.store, "T2", "en", "Topic").await;

        let links = f
            .lookup
            .query_language_target_links(&link("T1", "en", "Topic"))
            .await
            .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links["en"], Title::new("T2"));
    }

    #[tokio::test]
    async fn test_sorting_decides_which_rows_survive_the_cap() {
        let unsorted = fixture_with(LookupConfig::default().with_query_limit(Some(1)));
        let sorted = fixture_with(
            LookupConfig::default()
                .with_query_limit(Some(1))
                .with_sorted_results(true),
        );
        for f in [&unsorted, &sorted] {
            annotate(&f.store, "Foo_fr", "fr", "Topic").await;
            annotate(&f.store, "Foo_de", "de", "Topic").await;
        }

        let topic_link = link("Foo_fr", "fr", "Topic");
        let links = unsorted
            .lookup
            .query_language_target_links(&topic_link)
            .await
            .unwrap();
        assert_eq!(links.keys().collect::<Vec<_>>(), vec!["fr"]);

        let links = sorted
            .lookup
            .query_language_target_links(&topic_link)
            .await
            .unwrap();
        assert_eq!(links.keys().collect::<Vec<_>>(), vec!["de"]);
    }

    #[tokio::test]
    async fn test_uncacheable_mapping_is_still_returned() {
        let store = Arc::new(InMemoryStore::new());
        let backend = Arc::new(MemoryCache::new(
            CacheConfig::builder().max_bytes(600).build(),
        ));
        let cache = Arc::new(CachedLanguageTargetLinks::new(backend.clone()));
        let lookup = InterlanguageLinksLookup::new(cache, store.clone());
        let topic_link = link("Page_0", "l0", "Topic");

        annotate(&store, "Page_0", "l0", "Topic").await;
        lookup.query_language_target_links(&topic_link).await.unwrap();
        assert_eq!(
            lookup
                .try_cached_language_target_links(&topic_link)
                .await
                .unwrap()
                .map(|links| links.len()),
            Some(1)
        );

        for i in 1..30 {
            annotate(&store, &format!("Page_{}", i), &format!("l{}", i), "Topic").await;
        }

        let links = lookup.query_language_target_links(&topic_link).await.unwrap();
        assert_eq!(links.len(), 30);
        assert!(lookup
            .try_cached_language_target_links(&topic_link)
            .await
            .unwrap()
            .is_none());
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_find_last_page_language() {
        let f = fixture();
        let title = Title::new("Foo");

        assert_eq!(f.lookup.find_last_page_language_for_target(&title).await.unwrap(), "");

        annotate(&f.store, "Foo", "en", "Topic").await;
        annotate(&f.store, "Foo", "fr", "Other").await;

        assert_eq!(
            f.lookup.find_last_page_language_for_target(&title).await.unwrap(),
            "fr"
        );
    }

    #[tokio::test]
    async fn test_find_last_page_language_non_text_value() {
        let f = fixture();
        let title = Title::new("Foo");
        let container = WikiPage::with_subobject(title.clone(), "_SILnum");

        f.store
            .add_property_value(
                WikiPage::from_title(&title),
                PropertyRegistry::container(),
                DataItem::WikiPage(container.clone()),
            )
            .await;
        f.store
            .add_property_value(container, PropertyRegistry::language(), DataItem::Number(1.0))
            .await;

        assert_eq!(f.lookup.find_last_page_language_for_target(&title).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_find_link_references() {
        let f = fixture();
        annotate(&f.store, "Foo", "en", "Topic").await;
        annotate(&f.store, "Foo", "de", "Other").await;

        let references = f
            .lookup
            .find_link_references_for_target(&Title::new("Foo"))
            .await
            .unwrap();
        assert_eq!(
            references,
            vec![
                DataItem::WikiPage(WikiPage::new(Title::new("Topic"))),
                DataItem::WikiPage(WikiPage::new(Title::new("Other"))),
            ]
        );

        let none = f
            .lookup
            .find_link_references_for_target(&Title::new("Bar"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_drops_links_and_page_language() {
        let f = fixture();
        annotate(&f.store, "Foo", "en", "Topic").await;
        annotate(&f.store, "Foo_de", "de", "Topic").await;

        let topic_link = link("Foo", "en", "Topic");
        let title = Title::new("Foo");
        f.lookup.query_language_target_links(&topic_link).await.unwrap();
        assert_eq!(f.lookup.page_language_for_target(&title).await.unwrap(), "en");

        let event = f
            .lookup
            .do_invalidate_cached_language_target_links(&title)
            .await
            .unwrap();
        assert_eq!(event.removed, 1);
        assert_eq!(
            event.reason,
            InvalidationReason::TargetChanged {
                page: "Foo".to_string()
            }
        );

        assert!(f.lookup.try_cached_language_target_links(&topic_link).await.unwrap().is_none());
        assert!(f.lookup.try_cached_page_language_for_target(&title).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_without_containers_is_noop() {
        let f = fixture();
        let event = f
            .lookup
            .do_invalidate_cached_language_target_links(&Title::new("Empty"))
            .await
            .unwrap();

        assert!(event.is_empty());
        assert_eq!(event.removed, 0);
    }

    #[tokio::test]
    async fn test_language_target_links_prefers_cache() {
        let f = fixture();
        annotate(&f.store, "Foo", "en", "Topic").await;
        let topic_link = link("Foo", "en", "Topic");

        let first = f.lookup.language_target_links(&topic_link).await.unwrap();
        let second = f.lookup.language_target_links(&topic_link).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(f.store.query_count(), 1);
    }

    #[tokio::test]
    async fn test_page_language_empty_result_not_cached() {
        let f = fixture();
        let title = Title::new("Foo");

        assert_eq!(f.lookup.page_language_for_target(&title).await.unwrap(), "");
        assert!(f.lookup.try_cached_page_language_for_target(&title).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let f = fixture();
        annotate(&f.store, "Foo", "en", "Topic").await;
        f.store.fail_with(Some("connection reset".to_string())).await;

        let err = f
            .lookup
            .query_language_target_links(&link("Foo", "en", "Topic"))
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::StoreError(_)));

        let err = f
            .lookup
            .do_invalidate_cached_language_target_links(&Title::new("Foo"))
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::StoreError(_)));
    }

    #[tokio::test]
    async fn test_with_memory_cache() {
        let store = Arc::new(InMemoryStore::new());
        annotate(&store, "Foo", "en", "Topic").await;

        let config = LookupConfig::default().with_cache(CacheConfig::small());
        let lookup = InterlanguageLinksLookup::with_memory_cache(store.clone(), config).unwrap();
        lookup.language_target_links(&link("Foo", "en", "Topic")).await.unwrap();
        lookup.language_target_links(&link("Foo", "en", "Topic")).await.unwrap();
        assert_eq!(store.query_count(), 1);

        let invalid = LookupConfig::default().with_query_limit(Some(0));
        assert!(matches!(
            InterlanguageLinksLookup::with_memory_cache(store, invalid),
            Err(LookupError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_set_store() {
        let mut f = fixture();
        let other = Arc::new(InMemoryStore::new());
        annotate(&other, "Foo", "en", "Topic").await;

        f.lookup.set_store(other.clone());
        let links = f
            .lookup
            .query_language_target_links(&link("Foo", "en", "Topic"))
            .await
            .unwrap();

        assert_eq!(links.len(), 1);
        assert_eq!(other.query_count(), 1);
        assert_eq!(f.store.query_count(), 0);
    }
}
