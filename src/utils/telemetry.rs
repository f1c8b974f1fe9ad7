//! Logging setup for the binary.
//!
//! Events are emitted with `tracing` throughout the crate; this installs the
//! `fmt` subscriber that writes them to stderr. The level comes from
//! `RUST_LOG` and defaults to [`DEFAULT_FILTER`].

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

/// Builds the filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`] when
/// it is unset or unparseable.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .try_init()
        .ok();
}
