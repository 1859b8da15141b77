//! Logging setup.
//!
//! `tracing` with an `EnvFilter` (from `--log-filter` / `RUST_LOG`, falling
//! back to [`DEFAULT_LOG_FILTER`]) and a fmt layer stamped in local time.
//! This log is the operator channel: job failures are reported here in full.

use chrono::Local;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::{Error, Result};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "mobi_bridge=info,tower_http=info";

/// Timer that formats timestamps in the server's local timezone.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Build the filter from an explicit directive or the default.
pub fn build_filter(directive: Option<&str>) -> Result<EnvFilter> {
    let directive = directive
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_LOG_FILTER);
    EnvFilter::try_new(directive)
        .map_err(|e| Error::config(format!("Invalid log filter '{}': {}", directive, e)))
}

/// Install the global subscriber.
pub fn init_logging(directive: Option<&str>) -> Result<()> {
    let filter = build_filter(directive)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_timer(LocalTimer).with_target(true))
        .try_init()
        .map_err(|e| Error::Other(format!("Failed to install log subscriber: {}", e)))
}
