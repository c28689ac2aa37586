//! GitHub REST API client
//!
//! Read-only client for the traffic, popular-snapshot, rate-limit, and
//! repository-listing endpoints.

pub mod client;
pub mod models;

pub use client::GithubClient;
