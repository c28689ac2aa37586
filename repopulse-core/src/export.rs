//! Flat-file mirror of the traffic table.
//!
//! The export is a full rewrite, sorted by repo, then date, then metric,
//! so external tooling can diff successive runs line by line.

use crate::error::Result;
use crate::types::TrafficRecord;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write all traffic rows to `path` as CSV.
///
/// Writes to a temp file next to the destination and renames it into
/// place, so a concurrent reader never observes a torn file.
pub fn mirror_to_csv(records: &[TrafficRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut sorted: Vec<&TrafficRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        (a.repo.full_name(), a.date, a.metric.as_str())
            .cmp(&(b.repo.full_name(), b.date, b.metric.as_str()))
    });

    let tmp_path = path.with_extension("csv.tmp");
    let mut file = fs::File::create(&tmp_path)?;

    writeln!(file, "repo,date,metric,count,uniques")?;
    for record in sorted {
        writeln!(
            file,
            "{},{},{},{},{}",
            record.repo.full_name(),
            record.date.format("%Y-%m-%d"),
            record.metric.as_str(),
            record.count,
            record.uniques,
        )?;
    }

    file.sync_all()?;
    drop(file);
    fs::rename(&tmp_path, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metric, RepoId};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn record(repo: &str, day: u32, metric: Metric, count: i64) -> TrafficRecord {
        TrafficRecord {
            repo: repo.parse::<RepoId>().unwrap(),
            date: NaiveDate::from_ymd_opt(2026, 8, day).unwrap(),
            metric,
            count,
            uniques: 1,
        }
    }

    #[test]
    fn test_mirror_deterministic_and_sorted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("traffic.csv");

        // Intentionally unsorted input
        let records = [
            record("bob/zeta", 1, Metric::Views, 7),
            record("alice/alpha", 2, Metric::Views, 5),
            record("alice/alpha", 1, Metric::Views, 3),
            record("alice/alpha", 1, Metric::Clones, 2),
        ];

        mirror_to_csv(&records, &path).unwrap();
        let first = fs::read_to_string(&path).unwrap();

        assert_eq!(
            first,
            "repo,date,metric,count,uniques\n\
             alice/alpha,2026-08-01,clones,2,1\n\
             alice/alpha,2026-08-01,views,3,1\n\
             alice/alpha,2026-08-02,views,5,1\n\
             bob/zeta,2026-08-01,views,7,1\n"
        );

        // Re-exporting the same rows is byte-identical.
        mirror_to_csv(&records, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_mirror_empty_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("traffic.csv");

        mirror_to_csv(&[], &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "repo,date,metric,count,uniques\n"
        );
    }

    #[test]
    fn test_mirror_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/traffic.csv");

        mirror_to_csv(&[], &path).unwrap();
        assert!(path.exists());
    }
}
