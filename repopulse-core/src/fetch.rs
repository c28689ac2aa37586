//! Fetch pipeline coordinator
//!
//! Orchestrates the per-run pipeline over the configured repositories:
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │ GitHub API  │ ──► │ FetchCoordinator │ ──► │    Database     │
//! │ (traffic/*) │     │ fetch→agg→commit │     │ + CSV mirror    │
//! └─────────────┘     └──────────────────┘     └─────────────────┘
//! ```
//!
//! Repositories are processed sequentially, one at a time; each
//! repository's rows commit as a single transaction. Repo-scoped fetch
//! errors (not found, timeout, transient API failures) skip that
//! repository and the run continues. Auth and storage errors abort the
//! run; rate-limit exhaustion skips every remaining repository since
//! further calls would fail the same way.

use std::path::Path;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::export;
use crate::github::models::PopularEntry;
use crate::github::GithubClient;
use crate::metrics::{aggregate, TrafficAggregate};
use crate::types::{DailyCount, Metric, PopularKind, PopularRecord, RepoId, TrafficRecord};

/// A repository skipped during a run, with the error that caused it.
#[derive(Debug, Clone)]
pub struct SkippedRepo {
    pub repo: RepoId,
    pub reason: String,
}

/// Outcome of a full fetch run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Repositories whose rows were committed
    pub succeeded: Vec<RepoId>,
    /// Repositories skipped, with reasons
    pub skipped: Vec<SkippedRepo>,
    /// Per-repo, per-metric aggregates for display
    pub aggregates: Vec<(RepoId, Metric, TrafficAggregate)>,
}

impl RunSummary {
    /// True when every repository committed.
    pub fn all_succeeded(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Everything fetched for one repository before it commits.
struct FetchedRepo {
    views: Vec<DailyCount>,
    clones: Vec<DailyCount>,
    referrers: Vec<PopularEntry>,
    paths: Vec<PopularEntry>,
}

/// Coordinates the fetch → aggregate → persist pipeline.
pub struct FetchCoordinator {
    client: GithubClient,
    db: Database,
}

impl FetchCoordinator {
    pub fn new(client: GithubClient, db: Database) -> Self {
        Self { client, db }
    }

    /// Run the pipeline over `repos`, then rewrite the CSV mirror.
    ///
    /// `progress` is invoked before each repository with
    /// (index, total, repo).
    pub async fn run<F>(&self, repos: &[RepoId], csv_path: &Path, mut progress: F) -> Result<RunSummary>
    where
        F: FnMut(usize, usize, &RepoId),
    {
        let mut summary = RunSummary::default();

        for (i, repo) in repos.iter().enumerate() {
            progress(i, repos.len(), repo);
            tracing::info!(repo = %repo, "Fetching traffic");

            match self.fetch_repo(repo).await {
                Ok(fetched) => {
                    // Storage failures are fatal; the repos committed so
                    // far stay committed.
                    self.commit(repo, &fetched)?;

                    summary
                        .aggregates
                        .push((repo.clone(), Metric::Views, aggregate(&fetched.views)));
                    summary
                        .aggregates
                        .push((repo.clone(), Metric::Clones, aggregate(&fetched.clones)));
                    summary.succeeded.push(repo.clone());
                }
                Err(e) if e.is_repo_scoped() => {
                    tracing::warn!(repo = %repo, error = %e, "Skipping repository");
                    summary.skipped.push(SkippedRepo {
                        repo: repo.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e @ Error::RateLimited { .. }) => {
                    // Every remaining call would fail the same way.
                    tracing::warn!(error = %e, "Rate limit exhausted, aborting remaining repositories");
                    for rest in &repos[i..] {
                        summary.skipped.push(SkippedRepo {
                            repo: rest.clone(),
                            reason: e.to_string(),
                        });
                    }
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let all = self.db.list_traffic()?;
        export::mirror_to_csv(&all, csv_path)?;

        Ok(summary)
    }

    /// Fetch all four endpoints for one repository, in a fixed order.
    async fn fetch_repo(&self, repo: &RepoId) -> Result<FetchedRepo> {
        let views = self.client.fetch_traffic(repo, Metric::Views).await?;
        let clones = self.client.fetch_traffic(repo, Metric::Clones).await?;
        let referrers = self.client.fetch_popular(repo, PopularKind::Referrers).await?;
        let paths = self.client.fetch_popular(repo, PopularKind::Paths).await?;

        Ok(FetchedRepo {
            views,
            clones,
            referrers,
            paths,
        })
    }

    /// Commit one repository's rows as a single transaction.
    fn commit(&self, repo: &RepoId, fetched: &FetchedRepo) -> Result<()> {
        let mut traffic = Vec::new();
        for (metric, series) in [
            (Metric::Views, &fetched.views),
            (Metric::Clones, &fetched.clones),
        ] {
            for day in series {
                traffic.push(TrafficRecord {
                    repo: repo.clone(),
                    date: day.date,
                    metric,
                    count: day.count,
                    uniques: day.uniques,
                });
            }
        }

        let referrers = popular_records(repo, PopularKind::Referrers, &fetched.referrers);
        let paths = popular_records(repo, PopularKind::Paths, &fetched.paths);

        self.db
            .commit_repo_snapshot(repo, &traffic, &referrers, &paths)?;

        tracing::info!(
            repo = %repo,
            traffic_rows = traffic.len(),
            referrers = referrers.len(),
            paths = paths.len(),
            "Committed repository snapshot"
        );
        Ok(())
    }
}

/// Turn ranked API entries into snapshot rows, preserving ranking order.
fn popular_records(repo: &RepoId, kind: PopularKind, entries: &[PopularEntry]) -> Vec<PopularRecord> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| PopularRecord {
            repo: repo.clone(),
            kind,
            rank: (i + 1) as i64,
            target: entry.target.clone(),
            count: entry.count,
            uniques: entry.uniques,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popular_records_ranking() {
        let repo: RepoId = "alice/alpha".parse().unwrap();
        let entries = [
            PopularEntry {
                target: "news.ycombinator.com".to_string(),
                count: 30,
                uniques: 20,
            },
            PopularEntry {
                target: "reddit.com".to_string(),
                count: 12,
                uniques: 9,
            },
        ];

        let rows = popular_records(&repo, PopularKind::Referrers, &entries);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].target, "news.ycombinator.com");
        assert_eq!(rows[1].rank, 2);
    }

    #[test]
    fn test_run_summary_success_flag() {
        let mut summary = RunSummary::default();
        assert!(summary.all_succeeded());

        summary.skipped.push(SkippedRepo {
            repo: "alice/alpha".parse().unwrap(),
            reason: "not found".to_string(),
        });
        assert!(!summary.all_succeeded());
    }
}
