//! Tracing setup for hosts and test binaries

use crate::error::{LookupError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "interlang_kg=info";

/// Install a global fmt subscriber filtered by `RUST_LOG`
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| LookupError::ConfigError(format!("failed to install tracing subscriber: {}", e)))
}
