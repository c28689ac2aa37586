//! Core domain types for repopulse
//!
//! These types model the GitHub traffic data the pipeline fetches,
//! aggregates, and persists.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Repo** | A GitHub repository, identified by owner and name |
//! | **Metric** | One of views or clones, reported per day by the API |
//! | **Daily count** | One point of the rolling 14-day traffic series |
//! | **Popular snapshot** | The ranked referrers or content-paths list; no history, latest fetch only |
//! | **Rate limit** | The API's per-hour call quota; exhaustion blocks calls until reset |

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================
// Repository identity
// ============================================

/// A repository identified by its owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// Account that owns the repository
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoId {
    /// Create a repo identifier from owner and name parts.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// The `owner/name` form used as the storage key and in display.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(RepoId::new(owner, name))
            }
            _ => Err(format!("invalid repository '{}': expected owner/name", s)),
        }
    }
}

// ============================================
// Traffic metrics
// ============================================

/// Traffic metric kind reported per day by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Views,
    Clones,
}

impl Metric {
    /// Both metrics, in the order the pipeline fetches them.
    pub const ALL: [Metric; 2] = [Metric::Views, Metric::Clones];

    /// Storage and endpoint segment form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Views => "views",
            Metric::Clones => "clones",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "views" => Ok(Metric::Views),
            "clones" => Ok(Metric::Clones),
            _ => Err(format!("unknown metric: {}", s)),
        }
    }
}

/// One day of a traffic series, as returned by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCount {
    /// UTC day the counts cover
    pub date: NaiveDate,
    /// Total hits for the day
    pub count: i64,
    /// Unique visitors/cloners for the day
    pub uniques: i64,
}

/// A persisted per-day traffic row, unique per (repo, date, metric).
///
/// Rows are upserted on each fetch: the API's rolling 14-day window means
/// a later fetch can revise counts for days still inside the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficRecord {
    pub repo: RepoId,
    pub date: NaiveDate,
    pub metric: Metric,
    pub count: i64,
    pub uniques: i64,
}

// ============================================
// Popular snapshots
// ============================================

/// Kind of ranked popular snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopularKind {
    Referrers,
    Paths,
}

impl PopularKind {
    /// Storage and endpoint segment form.
    pub fn as_str(&self) -> &'static str {
        match self {
            PopularKind::Referrers => "referrers",
            PopularKind::Paths => "paths",
        }
    }
}

impl fmt::Display for PopularKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PopularKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "referrers" => Ok(PopularKind::Referrers),
            "paths" => Ok(PopularKind::Paths),
            _ => Err(format!("unknown popular kind: {}", s)),
        }
    }
}

/// One row of a popular referrers/paths snapshot.
///
/// Snapshot-only: rows for a (repo, kind) pair are replaced wholesale on
/// each run; no history is retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopularRecord {
    pub repo: RepoId,
    pub kind: PopularKind,
    /// 1-based position in the API's ranking
    pub rank: i64,
    /// Referrer host or content path
    pub target: String,
    pub count: i64,
    pub uniques: i64,
}

// ============================================
// Rate limit
// ============================================

/// Current API quota, read from `/rate_limit`. Ephemeral, never persisted.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitStatus {
    /// Calls allowed per window
    pub limit: i64,
    /// Calls remaining in the current window
    pub remaining: i64,
    /// When the window resets
    pub reset_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_id_parse() {
        let repo: RepoId = "alice/alpha".parse().unwrap();
        assert_eq!(repo.owner, "alice");
        assert_eq!(repo.name, "alpha");
        assert_eq!(repo.full_name(), "alice/alpha");
        assert_eq!(repo.to_string(), "alice/alpha");
    }

    #[test]
    fn test_repo_id_parse_rejects_malformed() {
        assert!("alpha".parse::<RepoId>().is_err());
        assert!("/alpha".parse::<RepoId>().is_err());
        assert!("alice/".parse::<RepoId>().is_err());
        assert!("alice/alpha/extra".parse::<RepoId>().is_err());
    }

    #[test]
    fn test_metric_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
        assert!("stars".parse::<Metric>().is_err());
    }

    #[test]
    fn test_popular_kind_round_trip() {
        for kind in [PopularKind::Referrers, PopularKind::Paths] {
            assert_eq!(kind.as_str().parse::<PopularKind>().unwrap(), kind);
        }
        assert!("forks".parse::<PopularKind>().is_err());
    }
}
