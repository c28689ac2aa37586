//! Database store
//!
//! Upsert and query operations for traffic rows and popular snapshots.
//! The store exclusively owns the on-disk lifecycle: creation, schema,
//! and all writes go through here.

use crate::error::{Error, Result};
use crate::types::{Metric, PopularKind, PopularRecord, RepoId, TrafficRecord};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

/// Database handle (single connection behind a mutex)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL mode so a reader (report, dashboard) can coexist with the
        // fetch pipeline's writer.
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Traffic operations
    // ============================================

    /// Insert or update a single traffic row.
    ///
    /// Idempotent: re-applying an identical record leaves the store
    /// unchanged.
    pub fn upsert_traffic(&self, record: &TrafficRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        Self::upsert_traffic_tx(&conn, record)
    }

    fn upsert_traffic_tx(conn: &Connection, record: &TrafficRecord) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO traffic (repo, date, metric, count, uniques)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(repo, date, metric) DO UPDATE SET
                count = excluded.count,
                uniques = excluded.uniques
            "#,
            params![
                record.repo.full_name(),
                record.date.format("%Y-%m-%d").to_string(),
                record.metric.as_str(),
                record.count,
                record.uniques,
            ],
        )?;
        Ok(())
    }

    /// All traffic rows, sorted by repo, then date, then metric.
    pub fn list_traffic(&self) -> Result<Vec<TrafficRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT repo, date, metric, count, uniques FROM traffic
             ORDER BY repo, date, metric",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_traffic)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Traffic rows for one repository and metric, oldest first.
    pub fn traffic_for(&self, repo: &RepoId, metric: Metric) -> Result<Vec<TrafficRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT repo, date, metric, count, uniques FROM traffic
             WHERE repo = ?1 AND metric = ?2
             ORDER BY date",
        )?;
        let rows = stmt
            .query_map(
                params![repo.full_name(), metric.as_str()],
                Self::row_to_traffic,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Distinct repositories present in the traffic table, sorted.
    pub fn repos_with_traffic(&self) -> Result<Vec<RepoId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT DISTINCT repo FROM traffic ORDER BY repo")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        names
            .iter()
            .map(|name| RepoId::from_str(name).map_err(Error::Config))
            .collect()
    }

    // ============================================
    // Popular snapshot operations
    // ============================================

    /// Replace the full popular snapshot for (repo, kind).
    ///
    /// Delete and insert run inside one transaction: after the call no
    /// stale row for the key survives, and an interrupted call leaves
    /// the previous snapshot intact.
    pub fn replace_popular(
        &self,
        repo: &RepoId,
        kind: PopularKind,
        rows: &[PopularRecord],
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        Self::replace_popular_tx(&tx, repo, kind, rows)?;
        tx.commit()?;
        Ok(())
    }

    fn replace_popular_tx(
        conn: &Connection,
        repo: &RepoId,
        kind: PopularKind,
        rows: &[PopularRecord],
    ) -> Result<()> {
        conn.execute(
            "DELETE FROM popular WHERE repo = ?1 AND kind = ?2",
            params![repo.full_name(), kind.as_str()],
        )?;

        let fetched_at = Utc::now().to_rfc3339();
        for row in rows {
            conn.execute(
                r#"
                INSERT INTO popular (repo, kind, rank, target, count, uniques, fetched_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    row.repo.full_name(),
                    row.kind.as_str(),
                    row.rank,
                    row.target,
                    row.count,
                    row.uniques,
                    fetched_at,
                ],
            )?;
        }
        Ok(())
    }

    /// Popular snapshot rows for (repo, kind), by rank.
    pub fn list_popular(&self, repo: &RepoId, kind: PopularKind) -> Result<Vec<PopularRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT repo, kind, rank, target, count, uniques FROM popular
             WHERE repo = ?1 AND kind = ?2
             ORDER BY rank",
        )?;
        let rows = stmt
            .query_map(
                params![repo.full_name(), kind.as_str()],
                Self::row_to_popular,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ============================================
    // Per-repo commit
    // ============================================

    /// Commit one repository's full fetch result as a single transaction.
    ///
    /// A whole-run interrupt either keeps or discards the repository's
    /// rows as one unit; it never leaves them half-written.
    pub fn commit_repo_snapshot(
        &self,
        repo: &RepoId,
        traffic: &[TrafficRecord],
        referrers: &[PopularRecord],
        paths: &[PopularRecord],
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        for record in traffic {
            Self::upsert_traffic_tx(&tx, record)?;
        }
        Self::replace_popular_tx(&tx, repo, PopularKind::Referrers, referrers)?;
        Self::replace_popular_tx(&tx, repo, PopularKind::Paths, paths)?;

        tx.commit()?;
        Ok(())
    }

    // ============================================
    // Row mapping
    // ============================================

    fn row_to_traffic(row: &Row) -> rusqlite::Result<TrafficRecord> {
        let repo_str: String = row.get("repo")?;
        let date_str: String = row.get("date")?;
        let metric_str: String = row.get("metric")?;

        Ok(TrafficRecord {
            repo: RepoId::from_str(&repo_str).map_err(|e| conversion_error(0, e))?,
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|e| conversion_error(1, e.to_string()))?,
            metric: Metric::from_str(&metric_str).map_err(|e| conversion_error(2, e))?,
            count: row.get("count")?,
            uniques: row.get("uniques")?,
        })
    }

    fn row_to_popular(row: &Row) -> rusqlite::Result<PopularRecord> {
        let repo_str: String = row.get("repo")?;
        let kind_str: String = row.get("kind")?;

        Ok(PopularRecord {
            repo: RepoId::from_str(&repo_str).map_err(|e| conversion_error(0, e))?,
            kind: PopularKind::from_str(&kind_str).map_err(|e| conversion_error(1, e))?,
            rank: row.get("rank")?,
            target: row.get("target")?,
            count: row.get("count")?,
            uniques: row.get("uniques")?,
        })
    }
}

fn conversion_error(column: usize, message: impl Into<String>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        message.into().into(),
    )
}
