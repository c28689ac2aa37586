//! Wire types for GitHub REST API responses.

use serde::Deserialize;

/// One point of a `/traffic/views` or `/traffic/clones` series.
#[derive(Debug, Deserialize)]
pub struct TrafficPoint {
    /// RFC 3339 day timestamp, e.g. "2026-08-01T00:00:00Z"
    pub timestamp: String,
    pub count: i64,
    pub uniques: i64,
}

/// Response body of the views/clones traffic endpoints.
///
/// The per-day series arrives under a key named after the metric
/// ("views" or "clones"); both map onto `days` here.
#[derive(Debug, Deserialize)]
pub struct TrafficResponse {
    /// Window total across all days
    #[serde(default)]
    pub count: i64,
    /// Window uniques across all days
    #[serde(default)]
    pub uniques: i64,
    /// Per-day series, at most 14 entries
    #[serde(alias = "views", alias = "clones", default)]
    pub days: Vec<TrafficPoint>,
}

/// One entry of `/traffic/popular/referrers` or `/traffic/popular/paths`.
///
/// Referrer entries carry a `referrer` host, path entries a `path`; both
/// map onto `target`.
#[derive(Debug, Clone, Deserialize)]
pub struct PopularEntry {
    #[serde(alias = "referrer", alias = "path")]
    pub target: String,
    pub count: i64,
    pub uniques: i64,
}

/// Response body of `/rate_limit`; only the core resource is relevant.
#[derive(Debug, Deserialize)]
pub struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitCore,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitCore {
    pub limit: i64,
    pub remaining: i64,
    /// Epoch seconds when the window resets
    pub reset: i64,
}

/// One entry of `/user/repos`.
#[derive(Debug, Deserialize)]
pub struct RepoEntry {
    pub name: String,
    pub owner: OwnerEntry,
}

#[derive(Debug, Deserialize)]
pub struct OwnerEntry {
    pub login: String,
}
