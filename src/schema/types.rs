//! Type definitions for knowledge graph values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized page title
///
/// Titles are stored in their database form (underscores instead of spaces)
/// so that `"Main Page"` and `"Main_Page"` name the same page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Title {
    db_key: String,
}

impl Title {
    /// Create a title from either its display or database form
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            db_key: text.as_ref().trim().replace(' ', "_"),
        }
    }

    /// Database form, underscores instead of spaces
    pub fn db_key(&self) -> &str {
        &self.db_key
    }

    /// Display form, spaces instead of underscores
    pub fn text(&self) -> String {
        self.db_key.replace('_', " ")
    }

    pub fn is_empty(&self) -> bool {
        self.db_key.is_empty()
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

impl From<&str> for Title {
    fn from(s: &str) -> Self {
        Title::new(s)
    }
}

/// A page entity in the store, optionally addressing a subobject of the page
///
/// Interlanguage containers are subobjects; their `title()` is the page
/// that holds them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WikiPage {
    title: Title,
    subobject: Option<String>,
}

impl WikiPage {
    /// Create a page entity for a title
    pub fn new(title: Title) -> Self {
        Self {
            title,
            subobject: None,
        }
    }

    /// Create a subobject entity nested in a page
    pub fn with_subobject(title: Title, subobject: impl Into<String>) -> Self {
        Self {
            title,
            subobject: Some(subobject.into()),
        }
    }

    pub fn from_title(title: &Title) -> Self {
        Self::new(title.clone())
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn subobject(&self) -> Option<&str> {
        self.subobject.as_deref()
    }

    /// Stable identity string, `Title` or `Title#subobject`
    pub fn key(&self) -> String {
        match &self.subobject {
            Some(sub) => format!("{}#{}", self.title.db_key(), sub),
            None => self.title.db_key().to_string(),
        }
    }
}

impl fmt::Display for WikiPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A named property in the store's property registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Property {
    key: String,
}

impl Property {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// A typed value held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataItem {
    /// Reference to a page (or a subobject of one)
    WikiPage(WikiPage),
    /// Free text
    Blob(String),
    /// Numeric literal
    Number(f64),
}

impl DataItem {
    /// Canonical serialization used as the item's identity inside a store
    ///
    /// Format: `page:<db_key>[#<subobject>]`, `blob:<text>`, `number:<n>`.
    pub fn serialization(&self) -> String {
        match self {
            DataItem::WikiPage(page) => format!("page:{}", page.key()),
            DataItem::Blob(text) => format!("blob:{}", text),
            DataItem::Number(n) => format!("number:{}", n),
        }
    }

    /// Parse a canonical serialization back into an item
    pub fn from_serialization(s: &str) -> Option<Self> {
        let (kind, rest) = s.split_once(':')?;
        match kind {
            "page" => {
                let page = match rest.split_once('#') {
                    Some((title, sub)) => WikiPage::with_subobject(Title::new(title), sub),
                    None => WikiPage::new(Title::new(rest)),
                };
                Some(DataItem::WikiPage(page))
            }
            "blob" => Some(DataItem::Blob(rest.to_string())),
            "number" => rest.parse::<f64>().ok().map(DataItem::Number),
            _ => None,
        }
    }

    pub fn as_wiki_page(&self) -> Option<&WikiPage> {
        match self {
            DataItem::WikiPage(page) => Some(page),
            _ => None,
        }
    }

    /// Text content, only for blob items
    pub fn as_blob(&self) -> Option<&str> {
        match self {
            DataItem::Blob(text) => Some(text),
            _ => None,
        }
    }
}

impl From<WikiPage> for DataItem {
    fn from(page: WikiPage) -> Self {
        DataItem::WikiPage(page)
    }
}

/// A data item paired with the property it is a value of
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    property: Property,
    item: DataItem,
}

impl DataValue {
    pub fn new(property: Property, item: DataItem) -> Self {
        Self { property, item }
    }

    pub fn property(&self) -> &Property {
        &self.property
    }

    pub fn data_item(&self) -> &DataItem {
        &self.item
    }

    /// Canonical user-facing string form of the value
    pub fn wiki_value(&self) -> String {
        match &self.item {
            DataItem::WikiPage(page) => page.title().text(),
            DataItem::Blob(text) => text.clone(),
            DataItem::Number(n) => n.to_string(),
        }
    }
}
