//! # repopulse-core
//!
//! Core library for repopulse - GitHub repository traffic insights.
//!
//! This library provides:
//! - Domain types for traffic series and popular snapshots
//! - An async client for the GitHub REST traffic endpoints
//! - Aggregation over daily series
//! - SQLite storage with a deterministic CSV mirror
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through the pipeline sequentially, one repository at a
//! time: **API client → aggregator → persistence**. Each repository's
//! rows commit as a single transaction, so a repo either lands whole or
//! not at all; the report and dashboard read the committed store without
//! the pipeline running.
//!
//! ## Example
//!
//! ```rust,no_run
//! use repopulse_core::{Config, Database};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database
//! let db = Database::open(&config.database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use fetch::{FetchCoordinator, RunSummary};
pub use types::*;

// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod fetch;
pub mod github;
pub mod logging;
pub mod metrics;
pub mod types;
