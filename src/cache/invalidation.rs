//! Invalidation records
//!
//! Cached link sets are derived data. They leave the cache when the
//! invalidation protocol deletes them, when their safety-net TTL runs out,
//! or when a payload turns out to be unreadable. Bulk removals are reported
//! as an [`InvalidationEvent`].

use crate::cache::types::CacheKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidationReason {
    /// Safety-net TTL ran out
    Expired,

    /// Deleted by key on request
    Manual,

    /// The containers recorded on `page` may have changed
    TargetChanged { page: String },

    /// Payload could not be deserialized
    Corrupt,
}

impl fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => f.write_str("expired"),
            Self::Manual => f.write_str("deleted on request"),
            Self::TargetChanged { page } => write!(f, "containers of {} changed", page),
            Self::Corrupt => f.write_str("unreadable payload"),
        }
    }
}

/// Outcome of one bulk removal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    pub reason: InvalidationReason,
    pub at: DateTime<Utc>,

    /// Keys targeted, present or not
    pub keys: Vec<CacheKey>,

    /// How many of `keys` were present
    pub removed: usize,

    /// Free-form detail for logs
    pub context: Option<String>,
}

impl InvalidationEvent {
    pub fn new(reason: InvalidationReason, keys: Vec<CacheKey>) -> Self {
        Self {
            reason,
            at: Utc::now(),
            keys,
            removed: 0,
            context: None,
        }
    }

    pub fn with_removed(mut self, removed: usize) -> Self {
        self.removed = removed;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// No key was targeted at all
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
