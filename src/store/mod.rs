//! Semantic store abstraction
//!
//! The store is a black-box graph of `(subject, property, value)` facts with
//! a structured query interface. Lookups only ever read from it.
//!
//! ## Ordering contract
//!
//! `get_property_values` returns values oldest assertion first. Callers that
//! need "the last" value of a property rely on this order; it is the
//! tie-break for pages carrying several interlanguage containers.

pub mod memory;
pub mod neo4j;

use crate::error::Result;
use crate::query::{Query, QueryResult};
use crate::schema::types::{DataItem, Property, WikiPage};
use async_trait::async_trait;

pub use memory::InMemoryStore;
pub use neo4j::Neo4jStore;

/// Read interface of a semantic store
#[async_trait]
pub trait SemanticStore: Send + Sync {
    /// All values of `property` for `subject`, oldest assertion first
    ///
    /// Returns an empty vector, not an error, when there are none.
    async fn get_property_values(
        &self,
        subject: &WikiPage,
        property: &Property,
    ) -> Result<Vec<DataItem>>;

    /// Execute a structured query
    async fn get_query_result(&self, query: &Query) -> Result<QueryResult>;
}
