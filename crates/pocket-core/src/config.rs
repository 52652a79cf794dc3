use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PocketError, Result};
use crate::types::EntityKind;

/// Top-level configuration for Pocket.
///
/// Loaded from `~/.pocket/config.toml` by default. Missing sections fall
/// back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PocketConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl PocketConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PocketConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| PocketError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Full path of the SQLite file: `data_dir` (with `~/` expanded) joined
    /// with `storage.db_file`.
    pub fn database_path(&self) -> PathBuf {
        resolve_data_dir(&self.general.data_dir).join(&self.storage.db_file)
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the database file.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.pocket/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// SQLite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file name inside `data_dir`.
    pub db_file: String,
    /// How long a statement waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_file: "pocket.db".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

/// Remote backup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Collection URL of the remote mock API. Empty means unconfigured.
    pub endpoint: String,
    /// Which local table is pushed to the remote.
    pub entity: EntityKind,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            entity: EntityKind::Transaction,
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if let Some(rest) = data_dir
        .strip_prefix("~/")
        .or_else(|| data_dir.strip_prefix("~\\"))
    {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").ok();
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").ok();

        if let Some(home) = home {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(data_dir)
}
