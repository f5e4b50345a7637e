//! # Configuration
//!
//! Configuration is managed by [`clapfig`], which handles layered loading
//! from TOML files, environment variables, and programmatic overrides.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `CLAUSEVAULT__BACKEND`, `CLAUSEVAULT__WRITE_ATTEMPTS`, etc.
//! 2. **Data-root Config**: `<data root>/clausevault.toml`.
//! 3. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `backend` | `file` | Settings store backend: `file` or `sqlite` |
//! | `settings_file` | `App_Data/LoginSettings.json` | Settings document (file backend) |
//! | `database_file` | `App_Data/LoginSettings.db` | SQLite database (sqlite backend) |
//! | `log_dir` | `App_Data/Logs` | Directory for daily diagnostic logs |
//! | `write_attempts` | `10` | Attempts per file write before giving up |
//! | `retry_delay_ms` | `0` | Pause between write attempts |
//!
//! Paths are relative to the data root.

use crate::writer::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendKind {
    #[default]
    File,
    Sqlite,
}

impl std::str::FromStr for StoreBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(StoreBackendKind::File),
            "sqlite" | "db" => Ok(StoreBackendKind::Sqlite),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Configuration for clausevault, stored in `clausevault.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// Which settings store backend to open: "file" or "sqlite".
    #[config(default = "file")]
    pub backend: StoreBackendKind,

    /// Settings document used by the file backend.
    #[config(default = "App_Data/LoginSettings.json")]
    pub settings_file: PathBuf,

    /// Database used by the sqlite backend.
    #[config(default = "App_Data/LoginSettings.db")]
    pub database_file: PathBuf,

    /// Directory holding daily `Log_yy-MM-dd.txt` files.
    #[config(default = "App_Data/Logs")]
    pub log_dir: PathBuf,

    /// Attempts per file write before giving up.
    #[config(default = 10)]
    pub write_attempts: u32,

    /// Pause between write attempts, in milliseconds.
    #[config(default = 0)]
    pub retry_delay_ms: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackendKind::File,
            settings_file: PathBuf::from("App_Data/LoginSettings.json"),
            database_file: PathBuf::from("App_Data/LoginSettings.db"),
            log_dir: PathBuf::from("App_Data/Logs"),
            write_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: 0,
        }
    }
}

impl VaultConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.write_attempts,
            Duration::from_millis(self.retry_delay_ms),
        )
    }

    pub fn settings_path(&self, root: &Path) -> PathBuf {
        root.join(&self.settings_file)
    }

    pub fn database_path(&self, root: &Path) -> PathBuf {
        root.join(&self.database_file)
    }

    pub fn log_path(&self, root: &Path) -> PathBuf {
        root.join(&self.log_dir)
    }
}
