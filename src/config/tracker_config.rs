//! Issue tracker configuration file handling
//!
//! Loads and manages the ~/.config/issue-tracker/config.yaml file.

use crate::storage::{IssueStore, MemoryStore, SqliteConfig, SqliteStore};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Base directory for config and data (~/.config/issue-tracker)
fn config_dir() -> PathBuf {
    // Always use ~/.config for consistency across platforms (macOS, Linux)
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("issue-tracker");
    path
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Request body size limit in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// Which store backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite database path
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Enable WAL mode for the SQLite database
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

fn default_db_path() -> PathBuf {
    config_dir().join("issues.db")
}

fn default_wal_mode() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_db_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

impl StorageConfig {
    /// Construct the configured store
    pub fn open(&self) -> Result<Arc<dyn IssueStore>> {
        match self.backend {
            StorageBackend::Sqlite => {
                let config = SqliteConfig {
                    path: self.path.clone(),
                    wal_mode: self.wal_mode,
                };
                Ok(Arc::new(SqliteStore::open(&config)?))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; issues are lost on shutdown");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }
}

/// Issue tracker configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl TrackerConfig {
    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::TrackerError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading issue tracker configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            bind = %config.server.bind,
            backend = ?config.storage.backend,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load from the default path, falling back to defaults if no file exists
    pub fn load_default_or_new() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving issue tracker configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/issue-tracker/config.yaml)
    pub fn default_path() -> PathBuf {
        config_dir().join("config.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.server.max_body_size, 1024 * 1024);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert!(config.storage.path.ends_with("issue-tracker/issues.db"));
        assert!(config.storage.wal_mode);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");

        let mut config = TrackerConfig::default();
        config.server.bind = "0.0.0.0:8080".to_string();
        config.storage.backend = StorageBackend::Memory;
        config.save(&path).unwrap();

        let loaded = TrackerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "server:\n  bind: \"127.0.0.1:9999\"\n").unwrap();

        let loaded = TrackerConfig::load(&path).unwrap();
        assert_eq!(loaded.server.bind, "127.0.0.1:9999");
        assert_eq!(loaded.server.max_body_size, 1024 * 1024);
        assert_eq!(loaded.storage, StorageConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = TrackerConfig::load(temp_dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, crate::TrackerError::Config(_)));
    }

    #[test]
    fn test_invalid_backend_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "storage:\n  backend: mongo\n").unwrap();

        let err = TrackerConfig::load(&path).unwrap_err();
        assert!(matches!(err, crate::TrackerError::Yaml(_)));
    }

    #[tokio::test]
    async fn test_open_sqlite_store() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageConfig {
            backend: StorageBackend::Sqlite,
            path: temp_dir.path().join("issues.db"),
            wal_mode: false,
        };

        let store = storage.open().unwrap();
        let found = store
            .find(&crate::issue::IssueFilter::for_project("p"))
            .await
            .unwrap();
        assert!(found.is_empty());
        assert!(temp_dir.path().join("issues.db").exists());
    }
}
