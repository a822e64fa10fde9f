//! Where the application keeps its files and how big the reports are.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;

use crate::views::DEFAULT_REPORT_LIMIT;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.sqlite";
const LOG_FILE_NAME: &str = "library-manager.log";

pub const DB_PATH_VAR: &str = "LIBRARY_MANAGER_DB";
pub const LOG_PATH_VAR: &str = "LIBRARY_MANAGER_LOG";
pub const REPORT_LIMIT_VAR: &str = "LIBRARY_MANAGER_TOP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub report_limit: usize,
}

impl AppConfig {
    /// Defaults under `~/.library-manager`, then environment overrides.
    pub fn load() -> Result<Self> {
        let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        let mut config = Self::with_data_dir(base_dirs.home_dir().join(DATA_DIR_NAME));
        config.apply_overrides(|name| env::var(name).ok())?;
        Ok(config)
    }

    /// Every file rooted in `data_dir`, no environment involved.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            log_path: data_dir.join(LOG_FILE_NAME),
            report_limit: DEFAULT_REPORT_LIMIT,
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup(DB_PATH_VAR).filter(|v| !v.trim().is_empty()) {
            self.db_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(LOG_PATH_VAR).filter(|v| !v.trim().is_empty()) {
            self.log_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(REPORT_LIMIT_VAR) {
            let limit = raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("{REPORT_LIMIT_VAR} must be a positive integer"))?;
            if limit == 0 {
                return Err(anyhow!("{REPORT_LIMIT_VAR} must be a positive integer"));
            }
            self.report_limit = limit;
        }
        Ok(())
    }
}
