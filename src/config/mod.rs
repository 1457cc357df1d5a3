//! Configuration system
//!
//! Loads ~/.config/issue-tracker/config.yaml with:
//! - HTTP server settings (bind address, body size limit)
//! - Storage backend selection (SQLite path, WAL mode, or in-memory)

mod tracker_config;

pub use tracker_config::{ServerConfig, StorageBackend, StorageConfig, TrackerConfig};
