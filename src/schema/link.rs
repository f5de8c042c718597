//! The interlanguage link value object

use crate::schema::properties::PropertyRegistry;
use crate::schema::types::{DataItem, DataValue, Title, WikiPage};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One `(page, language code, reference key)` annotation
///
/// Immutable once constructed. The language code is lowercased so that
/// `EN` and `en` resolve to the same slot of a language target mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterlanguageLink {
    page: Title,
    language_code: String,
    reference: Title,
}

impl InterlanguageLink {
    pub fn new(page: Title, language_code: impl AsRef<str>, reference: Title) -> Self {
        Self {
            page,
            language_code: language_code.as_ref().trim().to_lowercase(),
            reference,
        }
    }

    /// Page carrying the annotation
    pub fn page(&self) -> &Title {
        &self.page
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    /// Shared reference grouping same-subject pages across languages
    pub fn reference(&self) -> &Title {
        &self.reference
    }

    /// Logical cache identity for the link's reference
    pub fn reference_key(&self) -> &str {
        self.reference.db_key()
    }

    /// Language descriptor: `SIL_LANG = <language code>`
    pub fn language_data_value(&self) -> DataValue {
        DataValue::new(
            PropertyRegistry::language(),
            DataItem::Blob(self.language_code.clone()),
        )
    }

    /// Reference descriptor: `SIL_REF = <reference page>`
    pub fn link_reference_data_value(&self) -> DataValue {
        DataValue::new(
            PropertyRegistry::reference(),
            DataItem::WikiPage(WikiPage::from_title(&self.reference)),
        )
    }

    /// SHA-256 content hash over all three components, truncated to 32 hex digits
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.page.db_key().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.language_code.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.reference.db_key().as_bytes());
        hasher.finalize()[..16]
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }

    /// Subobject name of the container that records this link on its page
    pub fn container_id(&self) -> String {
        format!("_SIL{}", self.hash())
    }
}

/// Reference key of a stored reference value, if it has one
///
/// Page references key on their database title; a reference recorded as
/// plain text keys on the normalized text so both forms meet in the cache.
pub fn reference_key_of(item: &DataItem) -> Option<String> {
    match item {
        DataItem::WikiPage(page) => Some(page.title().db_key().to_string()),
        DataItem::Blob(text) => Some(Title::new(text).db_key().to_string()),
        DataItem::Number(_) => None,
    }
}
