//! Text rendering for run summaries, stored reports, and popular
//! snapshots.

use anyhow::Result;
use repopulse_core::fetch::RunSummary;
use repopulse_core::github::models::PopularEntry;
use repopulse_core::metrics::{aggregate, TrafficAggregate};
use repopulse_core::types::{DailyCount, Metric, PopularKind, RateLimitStatus, RepoId};
use repopulse_core::Database;

/// Print the end-of-run summary: per-repo aggregates, then skips.
pub fn print_run_summary(summary: &RunSummary) {
    println!("\nFetch complete:");
    println!("  Repositories fetched: {}", summary.succeeded.len());
    println!("  Repositories skipped: {}", summary.skipped.len());

    if !summary.aggregates.is_empty() {
        println!();
        for (repo, metric, agg) in &summary.aggregates {
            println!("  {}", format_aggregate(repo, *metric, agg));
        }
    }

    if !summary.skipped.is_empty() {
        println!("\nSkipped:");
        for skip in &summary.skipped {
            println!("  {}: {}", skip.repo, skip.reason);
        }
    }
}

/// Summarize everything in the store, one line per repo and metric.
pub fn print_store_report(db: &Database) -> Result<()> {
    let repos = db.repos_with_traffic()?;
    if repos.is_empty() {
        println!("No persisted traffic yet. Run 'repopulse fetch' first.");
        return Ok(());
    }

    println!("Traffic report ({} repositories):\n", repos.len());
    for repo in &repos {
        for metric in Metric::ALL {
            let rows = db.traffic_for(repo, metric)?;
            let daily: Vec<DailyCount> = rows
                .iter()
                .map(|r| DailyCount {
                    date: r.date,
                    count: r.count,
                    uniques: r.uniques,
                })
                .collect();
            println!("  {}", format_aggregate(repo, metric, &aggregate(&daily)));
        }
    }
    Ok(())
}

/// Print a ranked popular snapshot, at most the top 10 entries.
pub fn print_popular(repo: &RepoId, kind: PopularKind, entries: &[PopularEntry]) {
    if entries.is_empty() {
        println!("No {} recorded for {} in the last 14 days.", kind, repo);
        return;
    }

    println!("Top {} for {}:", kind, repo);
    for entry in entries.iter().take(10) {
        println!(
            "  {}: {} hits, {} uniques",
            entry.target, entry.count, entry.uniques
        );
    }
}

/// Print the current core API quota.
pub fn print_rate_limit(status: &RateLimitStatus) {
    println!("Rate limit: {} calls/hr", status.limit);
    println!("Remaining:  {}", status.remaining);
    println!(
        "Resets at:  {}",
        status.reset_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}

fn format_aggregate(repo: &RepoId, metric: Metric, agg: &TrafficAggregate) -> String {
    let best = match agg.best_day {
        Some((date, count)) => format!(", best {} ({})", date, count),
        None => String::new(),
    };
    format!(
        "{} {}: {} total ({} unique), {:.2}/day{}",
        repo, metric, agg.total, agg.total_uniques, agg.average, best
    )
}
