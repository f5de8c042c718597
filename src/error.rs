//! Error types for interlanguage link lookups
//!
//! Absence (cache misses, pages without containers) is never an error here;
//! it is modelled with `Option`. These variants cover genuine failures of the
//! store, the cache backend, and configuration.

use thiserror::Error;

/// Main error type for lookup, cache, and store operations
#[derive(Error, Debug)]
pub enum LookupError {
    /// Connection error - network or connection pool issues
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Query execution error
    #[error("Query error: {0}")]
    QueryError(String),

    /// The semantic store rejected or failed an operation
    #[error("Store error: {0}")]
    StoreError(String),

    /// The cache backend failed
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Neo4rs driver error (wrapper)
    #[error("Neo4rs driver error: {0}")]
    DriverError(#[from] neo4rs::Error),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for lookup operations
pub type Result<T> = std::result::Result<T, LookupError>;

impl From<String> for LookupError {
    fn from(s: String) -> Self {
        LookupError::Other(s)
    }
}

impl From<&str> for LookupError {
    fn from(s: &str) -> Self {
        LookupError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(e: serde_json::Error) -> Self {
        LookupError::SerializationError(e.to_string())
    }
}
