//! Binary entry point: load the configuration, start logging, open the store,
//! and drive the Ratatui event loop until the user exits.
use std::sync::Arc;

use anyhow::Context;
use library_manager::{logging, run_app, App, AppConfig, Database, EventBus};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.log_path)?;
    tracing::info!(db = %config.db_path.display(), "starting library manager");

    let db = Database::open(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    let bus = EventBus::new();
    logging::audit_changes(&bus);

    let mut app = App::new(Arc::new(db), &bus, config.report_limit);
    let result = run_app(&mut app);
    if let Err(err) = &result {
        tracing::error!(error = %err, "terminal session failed");
    }
    result
}
