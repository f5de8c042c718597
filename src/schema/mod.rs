//! Knowledge graph schema module
//!
//! Value objects for pages, properties and data items, the predefined
//! interlanguage properties, and the `InterlanguageLink` annotation itself.

pub mod link;
pub mod properties;
pub mod types;

pub use link::{reference_key_of, InterlanguageLink};
pub use properties::PropertyRegistry;
pub use types::{DataItem, DataValue, Property, Title, WikiPage};
