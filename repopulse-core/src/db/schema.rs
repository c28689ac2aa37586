//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: per-day traffic rows and popular snapshots
    r#"
    -- One row per (repo, date, metric); overwritten by later fetches
    -- while the day is inside the API's rolling 14-day window.
    CREATE TABLE IF NOT EXISTS traffic (
        repo        TEXT NOT NULL,
        date        TEXT NOT NULL,
        metric      TEXT NOT NULL,
        count       INTEGER NOT NULL,
        uniques     INTEGER NOT NULL,

        PRIMARY KEY (repo, date, metric)
    );

    -- Latest referrers/paths snapshot per repo; replaced wholesale on
    -- each fetch, no history retained.
    CREATE TABLE IF NOT EXISTS popular (
        repo        TEXT NOT NULL,
        kind        TEXT NOT NULL,
        rank        INTEGER NOT NULL,
        target      TEXT NOT NULL,
        count       INTEGER NOT NULL,
        uniques     INTEGER NOT NULL,
        fetched_at  DATETIME NOT NULL,

        PRIMARY KEY (repo, kind, rank)
    );

    CREATE INDEX IF NOT EXISTS idx_traffic_repo_date ON traffic(repo, date);
    CREATE INDEX IF NOT EXISTS idx_popular_repo_kind ON popular(repo, kind);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
