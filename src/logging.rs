//! Tracing setup. The terminal belongs to the TUI, so events go to a log file.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::events::{EventBus, SubscriptionId};

const DEFAULT_FILTER: &str = "library_manager=info";

/// Install the global subscriber, appending to `log_path`. `RUST_LOG`
/// overrides the default filter.
pub fn init(log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).context("failed to create log directory")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}

/// Log every change event for the life of the bus.
pub fn audit_changes(bus: &EventBus) -> SubscriptionId {
    bus.subscribe(|event| {
        tracing::info!(%event, "library data changed");
        Ok(())
    })
    .detach()
}
