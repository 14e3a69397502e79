//! Tracing subscriber setup for binaries and integration harnesses.

use tracing_subscriber::EnvFilter;
use tradeseal_types::{Result, TradesealError};

/// Default directive when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,tradeseal_settlement=debug";

/// Install a global fmt subscriber filtered by `filter`, optionally emitting
/// JSON lines.
///
/// A subscriber that is already installed is left in place, so calling this
/// more than once is harmless.
pub fn init_tracing(filter: &str, json: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_new(filter).map_err(|e| TradesealError::Configuration(e.to_string()))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    if let Err(err) = installed {
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
    Ok(())
}

/// [`init_tracing`] with the filter read from `RUST_LOG`.
pub fn init_tracing_from_env(json: bool) -> Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.into());
    init_tracing(&filter, json)
}
