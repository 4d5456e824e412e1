//! Diagnostic output for the runtime.

use tracing_subscriber::EnvFilter;

use crate::env::LOG_VAR;

/// Filter used when `LLVMPROF_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

/// Install a stderr subscriber filtered by `LLVMPROF_LOG`.
///
/// The C entry points call this once, since a C host has no way to set up
/// `tracing` itself. Rust hosts install their own subscriber instead. Does
/// nothing if a global subscriber is already set.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_err() {
        tracing::debug!("global subscriber already set, keeping it");
    }
}
