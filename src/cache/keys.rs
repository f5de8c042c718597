//! Cache key construction
//!
//! Keys are logical identities, never store addresses: link sets are keyed
//! by reference key, page languages by page title.

use crate::cache::types::CacheKey;
use std::fmt;

/// Key prefix shared by every entry this crate writes
pub const KEY_PREFIX: &str = "sil";

/// Logical partition of the cache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    /// language code -> target page, per reference key
    LanguageTargetLinks,

    /// page -> last known language code
    PageLanguage,
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheNamespace::LanguageTargetLinks => write!(f, "ref"),
            CacheNamespace::PageLanguage => write!(f, "lang"),
        }
    }
}

/// Cache key builder
pub struct CacheKeyBuilder {
    namespace: CacheNamespace,
    identifier: String,
    version: Option<u32>,
}

impl CacheKeyBuilder {
    pub fn new(namespace: CacheNamespace) -> Self {
        Self {
            namespace,
            identifier: String::new(),
            version: None,
        }
    }

    /// Set the primary identifier
    pub fn identifier(mut self, id: impl Into<String>) -> Self {
        self.identifier = id.into();
        self
    }

    /// Tag the key with a payload format version
    pub fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn build(self) -> CacheKey {
        match self.version {
            Some(version) => format!(
                "{}:{}:v{}:{}",
                KEY_PREFIX, self.namespace, version, self.identifier
            ),
            None => format!("{}:{}:{}", KEY_PREFIX, self.namespace, self.identifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_display() {
        assert_eq!(CacheNamespace::LanguageTargetLinks.to_string(), "ref");
        assert_eq!(CacheNamespace::PageLanguage.to_string(), "lang");
    }

    #[test]
    fn test_cache_key_builder() {
        let key = CacheKeyBuilder::new(CacheNamespace::LanguageTargetLinks)
            .identifier("Shared_Topic")
            .build();
        assert_eq!(key, "sil:ref:Shared_Topic");

        let key = CacheKeyBuilder::new(CacheNamespace::PageLanguage)
            .identifier("Foo")
            .version(2)
            .build();
        assert_eq!(key, "sil:lang:v2:Foo");
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let a = CacheKeyBuilder::new(CacheNamespace::LanguageTargetLinks)
            .identifier("Foo")
            .build();
        let b = CacheKeyBuilder::new(CacheNamespace::PageLanguage)
            .identifier("Foo")
            .build();
        assert_ne!(a, b);
    }
}
