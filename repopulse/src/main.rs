//! repopulse - GitHub repository traffic insights
//!
//! Fetches per-repository traffic statistics (views, clones, referrers,
//! popular paths) from the GitHub REST API, stores them in SQLite plus a
//! CSV mirror, and renders reports from the persisted data.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/repopulse/traffic.db
//! - CSV mirror: $XDG_DATA_HOME/repopulse/traffic.csv
//! - Logs: $XDG_STATE_HOME/repopulse/repopulse.log
//! - Config: $XDG_CONFIG_HOME/repopulse/config.toml

mod dashboard;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use repopulse_core::export;
use repopulse_core::fetch::FetchCoordinator;
use repopulse_core::github::GithubClient;
use repopulse_core::{Config, Database, PopularKind, RepoId};

#[derive(Parser)]
#[command(name = "repopulse")]
#[command(about = "GitHub repository traffic insights")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch traffic for all configured repositories and persist it
    Fetch,
    /// Show top referrers for a repository
    Referrers {
        /// Repository as owner/name
        repo: String,
    },
    /// Show top content paths for a repository
    Paths {
        /// Repository as owner/name
        repo: String,
    },
    /// Show API rate-limit status
    RateLimit,
    /// Summarize persisted traffic per repository
    Report,
    /// Write a self-contained HTML dashboard from persisted traffic
    Dashboard {
        /// Output file
        #[arg(long, default_value = "dashboard.html")]
        out: PathBuf,
    },
    /// Rewrite the CSV mirror from persisted traffic
    Export {
        /// Output file (defaults to the configured mirror path)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        repopulse_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("repopulse starting");

    match args.command {
        Command::Fetch => cmd_fetch(&config).await,
        Command::Referrers { repo } => cmd_popular(&config, &repo, PopularKind::Referrers).await,
        Command::Paths { repo } => cmd_popular(&config, &repo, PopularKind::Paths).await,
        Command::RateLimit => cmd_rate_limit(&config).await,
        Command::Report => cmd_report(&config),
        Command::Dashboard { out } => cmd_dashboard(&config, &out),
        Command::Export { out } => cmd_export(&config, out),
    }
}

/// Build an authenticated client from the configuration.
fn make_client(config: &Config) -> Result<GithubClient> {
    let token = config
        .github
        .resolve_token()
        .context("missing GitHub token")?;
    GithubClient::new(&config.github, &token).context("failed to create GitHub client")
}

/// Open the store at the configured path and run migrations.
fn open_db(config: &Config) -> Result<Database> {
    let db_path = config.database_path();
    tracing::info!(path = %db_path.display(), "Opening database");

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;
    Ok(db)
}

/// The repositories a run covers: the configured list, or the
/// authenticated user's own repositories when the list is empty.
async fn configured_repos(config: &Config, client: &GithubClient) -> Result<Vec<RepoId>> {
    let repos = config.repo_list().context("invalid [repos] entry")?;
    if !repos.is_empty() {
        return Ok(repos);
    }

    tracing::info!("No repositories configured, discovering owned repositories");
    let discovered = client
        .list_repos()
        .await
        .context("failed to list repositories")?;
    Ok(discovered)
}

async fn cmd_fetch(config: &Config) -> Result<()> {
    let client = make_client(config)?;
    let repos = configured_repos(config, &client).await?;

    if repos.is_empty() {
        println!("No repositories configured or discovered.");
        return Ok(());
    }

    let db = open_db(config)?;
    let coordinator = FetchCoordinator::new(client, db);

    let pb = ProgressBar::new(repos.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let summary = coordinator
        .run(&repos, &config.csv_path(), |current, _total, repo| {
            pb.set_position(current as u64);
            pb.set_message(repo.to_string());
        })
        .await
        .context("fetch run failed")?;

    pb.finish_and_clear();

    report::print_run_summary(&summary);
    println!("Saved: {}, {}", config.database_path().display(), config.csv_path().display());

    tracing::info!(
        succeeded = summary.succeeded.len(),
        skipped = summary.skipped.len(),
        "repopulse fetch complete"
    );

    if !summary.all_succeeded() {
        anyhow::bail!(
            "{} of {} repositories failed",
            summary.skipped.len(),
            repos.len()
        );
    }
    Ok(())
}

async fn cmd_popular(config: &Config, repo: &str, kind: PopularKind) -> Result<()> {
    let repo: RepoId = repo
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("invalid repository")?;

    let client = make_client(config)?;
    let entries = client
        .fetch_popular(&repo, kind)
        .await
        .with_context(|| format!("failed to fetch {} for {}", kind, repo))?;

    report::print_popular(&repo, kind, &entries);
    Ok(())
}

async fn cmd_rate_limit(config: &Config) -> Result<()> {
    let client = make_client(config)?;
    let status = client
        .fetch_rate_limit()
        .await
        .context("failed to fetch rate limit")?;

    report::print_rate_limit(&status);
    Ok(())
}

fn cmd_report(config: &Config) -> Result<()> {
    let db = open_db(config)?;
    report::print_store_report(&db)
}

fn cmd_dashboard(config: &Config, out: &PathBuf) -> Result<()> {
    let db = open_db(config)?;
    let records = db.list_traffic().context("failed to read traffic rows")?;

    if records.is_empty() {
        println!("No persisted traffic yet. Run 'repopulse fetch' first.");
        return Ok(());
    }

    let html = dashboard::render_html(&records);
    std::fs::write(out, html)
        .with_context(|| format!("failed to write dashboard to {}", out.display()))?;

    println!("Dashboard: {}", out.display());
    Ok(())
}

fn cmd_export(config: &Config, out: Option<PathBuf>) -> Result<()> {
    let db = open_db(config)?;
    let records = db.list_traffic().context("failed to read traffic rows")?;

    let path = out.unwrap_or_else(|| config.csv_path());
    export::mirror_to_csv(&records, &path).context("failed to write CSV mirror")?;

    println!("Exported {} row(s) to {}", records.len(), path.display());
    Ok(())
}
