//! Diagnostic logging setup.
//!
//! The engine logs through the `log` facade. This module routes those records
//! into a `tracing` subscriber writing to stderr, filtered by `TABVIEW_LOG`
//! (same syntax as `RUST_LOG`, default `warn`).

use anyhow::{anyhow, Result};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "TABVIEW_LOG";
const DEFAULT_LEVEL: &str = "warn";

/// Builds the filter from `TABVIEW_LOG`, falling back to `warn` when the
/// variable is unset or does not parse.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

pub fn init() -> Result<()> {
    // Bridge `log` macros (used by tabview-engine) to tracing.
    LogTracer::init().map_err(|e| anyhow!("failed to bridge log records: {e}"))?;

    let subscriber = fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))?;
    Ok(())
}
