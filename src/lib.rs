//! Issue Tracker - project-scoped issue tracking REST API
//!
//! Clients create, list, update and delete issues grouped by project name.
//!
//! # Architecture
//!
//! - **issue**: Data model (Issue, IssueId, filters and patches)
//! - **storage**: The `IssueStore` trait with SQLite and in-memory backends
//! - **gateway**: Request validation and outcomes, independent of HTTP
//! - **server**: axum routes mapping outcomes to HTTP responses
//! - **config**: YAML configuration for the server and storage

// Core modules
pub mod config;
pub mod error;
pub mod issue;
pub mod logging;
pub mod storage;

// Components
pub mod gateway;
pub mod server;

// Re-exports
pub use error::{Result, TrackerError};
