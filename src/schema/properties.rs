//! Property identifiers used by interlanguage annotations

use crate::schema::types::Property;

/// Registry of the predefined interlanguage properties
pub struct PropertyRegistry;

impl PropertyRegistry {
    /// Links a target page to each of its interlanguage containers
    pub const SIL_CONTAINER: &'static str = "__sil_container";

    /// Reference key held by a container
    pub const SIL_REF: &'static str = "__sil_iwl_ref";

    /// Language code held by a container
    pub const SIL_LANG: &'static str = "__sil_iwl_lang";

    pub fn container() -> Property {
        Property::new(Self::SIL_CONTAINER)
    }

    pub fn reference() -> Property {
        Property::new(Self::SIL_REF)
    }

    pub fn language() -> Property {
        Property::new(Self::SIL_LANG)
    }
}
