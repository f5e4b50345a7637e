//! # Context Initialization
//!
//! This is the composition root. It decides, once per process, where data
//! lives, which configuration applies and which settings backend to open.
//! Everything downstream receives a ready [`VaultContext`] and never looks at
//! configuration flags again.
//!
//! ## Data Root
//!
//! Resolved in priority order:
//! 1. An explicit override (the CLI's `--data` flag).
//! 2. The `CLAUSEVAULT_DATA` environment variable (primarily for testing).
//! 3. The OS-appropriate data directory via the `directories` crate.
//!
//! Configuration is then read from `<data root>/clausevault.toml`, and all
//! configured paths are resolved against the data root.

use crate::config::{StoreBackendKind, VaultConfig};
use crate::diagnostics::DiagnosticLog;
use crate::error::{Result, VaultError};
use crate::store::file::FileSettingsStore;
use crate::store::sqlite::RelationalSettingsStore;
use crate::store::SettingsStore;
use crate::writer::RetryingFileWriter;
use clapfig::{Clapfig, SearchMode, SearchPath};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const DATA_ENV_VAR: &str = "CLAUSEVAULT_DATA";
pub const CONFIG_FILE_NAME: &str = "clausevault.toml";

pub type BoxedStore = Box<dyn SettingsStore + Send>;

pub struct VaultContext {
    pub root: PathBuf,
    pub config: VaultConfig,
    pub store: BoxedStore,
    pub diagnostics: DiagnosticLog,
}

pub fn data_root(data_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = data_override {
        return Ok(path);
    }
    if let Ok(path) = std::env::var(DATA_ENV_VAR) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    ProjectDirs::from("com", "clausevault", "clausevault")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| VaultError::Config("Could not determine data dir".to_string()))
}

/// Reads `clausevault.toml` from the data root, falling back to defaults.
pub fn load_config(root: &Path) -> VaultConfig {
    Clapfig::builder::<VaultConfig>()
        .app_name("clausevault")
        .file_name(CONFIG_FILE_NAME)
        .search_paths(vec![SearchPath::Path(root.to_path_buf())])
        .search_mode(SearchMode::Merge)
        .strict(false)
        .load()
        .unwrap_or_else(|e| {
            tracing::warn!("ignoring invalid {}: {}", CONFIG_FILE_NAME, e);
            VaultConfig::default()
        })
}

/// Opens the configured settings backend.
pub fn open_store(config: &VaultConfig, root: &Path) -> Result<BoxedStore> {
    match config.backend {
        StoreBackendKind::File => {
            let path = config.settings_path(root);
            tracing::debug!("using file settings store at {}", path.display());
            let writer = RetryingFileWriter::new(config.retry_policy());
            Ok(Box::new(FileSettingsStore::open(path, writer)))
        }
        StoreBackendKind::Sqlite => {
            let path = config.database_path(root);
            tracing::debug!("using sqlite settings store at {}", path.display());
            Ok(Box::new(RelationalSettingsStore::open(path)?))
        }
    }
}

/// Builds the full context.
///
/// `backend_override` wins over the configured backend for this process.
pub fn initialize(
    data_override: Option<PathBuf>,
    backend_override: Option<StoreBackendKind>,
) -> Result<VaultContext> {
    let root = data_root(data_override)?;
    let mut config = load_config(&root);
    if let Some(backend) = backend_override {
        config.backend = backend;
    }

    let store = open_store(&config, &root)?;
    let diagnostics = DiagnosticLog::new(
        config.log_path(&root),
        RetryingFileWriter::new(config.retry_policy()),
    );

    Ok(VaultContext {
        root,
        config,
        store,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tenant;
    use crate::store::fixtures::seed_basic;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_data_override_wins() {
        let temp = TempDir::new().unwrap();
        let root = data_root(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(root, temp.path());
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        assert_eq!(load_config(temp.path()), VaultConfig::default());
    }

    #[test]
    fn test_config_file_selects_backend() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "backend = \"sqlite\"\n").unwrap();

        let config = load_config(temp.path());
        assert_eq!(config.backend, StoreBackendKind::Sqlite);
        assert_eq!(config.write_attempts, 10);
    }

    #[test]
    fn test_file_backend_persists_under_root() {
        let temp = TempDir::new().unwrap();
        let config = VaultConfig::default();

        let mut store = open_store(&config, temp.path()).unwrap();
        seed_basic(&mut store).unwrap();

        assert!(config.settings_path(temp.path()).exists());
        let reopened = open_store(&config, temp.path()).unwrap();
        assert!(reopened.get_user_by_id("U1").unwrap().is_some());
    }

    #[test]
    fn test_sqlite_backend_persists_under_root() {
        let temp = TempDir::new().unwrap();
        let config = VaultConfig {
            backend: StoreBackendKind::Sqlite,
            ..Default::default()
        };

        let mut store = open_store(&config, temp.path()).unwrap();
        store.add(Tenant::new("T1").into()).unwrap();
        store.save().unwrap();

        assert!(config.database_path(temp.path()).exists());
        let reopened = open_store(&config, temp.path()).unwrap();
        assert!(reopened.get_tenant_by_id("T1").unwrap().is_some());
    }

    #[test]
    fn test_initialize_with_backend_override() {
        let temp = TempDir::new().unwrap();
        let ctx = initialize(Some(temp.path().to_path_buf()), Some(StoreBackendKind::Sqlite)).unwrap();
        assert_eq!(ctx.config.backend, StoreBackendKind::Sqlite);
        assert_eq!(ctx.root, temp.path());
        assert_eq!(ctx.diagnostics.dir(), temp.path().join("App_Data/Logs"));
    }
}
