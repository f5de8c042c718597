//! Lookup and connection configuration
//!
//! Values come from code (builder-style setters) or from the environment.
//! `from_env` loads a `.env` file first when one is present.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `SIL_QUERY_LIMIT` | max rows per link query, `0` for unbounded | `500` |
//! | `SIL_SORT_RESULTS` | sort query rows by language code | `false` |
//! | `SIL_CACHE_TTL_SECS` | cache safety-net TTL, `0` for none | 7 days |
//! | `SIL_CACHE_MAX_ENTRIES` | cache entry cap | `10000` |
//! | `NEO4J_URI` | Bolt URI | `bolt://localhost:7687` |
//! | `NEO4J_USER` / `NEO4J_PASSWORD` | credentials | `neo4j` / `password` |
//! | `NEO4J_DATABASE` | database name | `neo4j` |

use crate::cache::CacheConfig;
use crate::error::{LookupError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Default cap on rows returned by a link query
pub const DEFAULT_QUERY_LIMIT: usize = 500;

/// Configuration for [`InterlanguageLinksLookup`](crate::lookup::InterlanguageLinksLookup)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Max rows fetched per reference key query, `None` for unbounded
    pub query_limit: Option<usize>,

    /// Order query rows by language code before aggregation
    pub sort_results: bool,

    /// Configuration of the backing cache
    pub cache: CacheConfig,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            query_limit: Some(DEFAULT_QUERY_LIMIT),
            sort_results: false,
            cache: CacheConfig::default(),
        }
    }
}

impl LookupConfig {
    pub fn with_query_limit(mut self, limit: Option<usize>) -> Self {
        self.query_limit = limit;
        self
    }

    pub fn with_sorted_results(mut self, sort: bool) -> Self {
        self.sort_results = sort;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.query_limit == Some(0) {
            return Err(LookupError::ConfigError(
                "query_limit must be greater than 0 (use None for unbounded)".to_string(),
            ));
        }

        self.cache.validate()
    }

    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Self::default();

        if let Some(limit) = env_parse::<usize>("SIL_QUERY_LIMIT")? {
            config.query_limit = if limit == 0 { None } else { Some(limit) };
        }

        if let Some(sort) = env_parse::<bool>("SIL_SORT_RESULTS")? {
            config.sort_results = sort;
        }

        if let Some(secs) = env_parse::<u64>("SIL_CACHE_TTL_SECS")? {
            config.cache.ttl = if secs == 0 {
                None
            } else {
                Some(Duration::from_secs(secs))
            };
        }

        if let Some(max) = env_parse::<usize>("SIL_CACHE_MAX_ENTRIES")? {
            config.cache.max_entries = max;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Connection settings for [`Neo4jStore`](crate::store::Neo4jStore)
#[derive(Debug, Clone)]
pub struct Neo4jSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub fetch_size: usize,
    pub max_connections: usize,
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            database: "neo4j".to_string(),
            fetch_size: 500,
            max_connections: 16,
        }
    }
}

impl Neo4jSettings {
    /// Read `NEO4J_*` variables, falling back to local defaults
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let defaults = Self::default();
        Self {
            uri: std::env::var("NEO4J_URI").unwrap_or(defaults.uri),
            user: std::env::var("NEO4J_USER").unwrap_or(defaults.user),
            password: std::env::var("NEO4J_PASSWORD").unwrap_or(defaults.password),
            database: std::env::var("NEO4J_DATABASE").unwrap_or(defaults.database),
            ..defaults
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| LookupError::ConfigError(format!("invalid value for {}: {}", name, raw))),
        Err(_) => Ok(None),
    }
}
