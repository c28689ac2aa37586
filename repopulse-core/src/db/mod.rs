//! Database layer for repopulse
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Keyed upserts for per-day traffic rows
//! - Transactional snapshot replacement for popular referrers/paths

pub mod schema;
pub mod store;

pub use store::Database;
