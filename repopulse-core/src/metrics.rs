//! Aggregation over daily traffic series.
//!
//! Pure computation over the counts the API returned; nothing here
//! touches the network or the store.

use crate::types::DailyCount;
use chrono::NaiveDate;

/// Aggregate over one fetched daily series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrafficAggregate {
    /// Sum of per-day counts
    pub total: i64,
    /// Sum of per-day uniques
    pub total_uniques: i64,
    /// Mean count per returned day, rounded to two decimals
    pub average: f64,
    /// Highest-count day; ties resolve to the earliest date
    pub best_day: Option<(NaiveDate, i64)>,
    /// Lowest-count day; ties resolve to the earliest date
    pub worst_day: Option<(NaiveDate, i64)>,
}

/// Aggregate a daily series into totals, average, and best/worst day.
///
/// The average divides by the number of days actually returned, not a
/// fixed 14, so short windows (a freshly created repo) stay meaningful.
/// An empty series yields an all-zero aggregate.
pub fn aggregate(daily: &[DailyCount]) -> TrafficAggregate {
    if daily.is_empty() {
        return TrafficAggregate::default();
    }

    let mut total = 0i64;
    let mut total_uniques = 0i64;
    let mut best: (NaiveDate, i64) = (daily[0].date, daily[0].count);
    let mut worst: (NaiveDate, i64) = (daily[0].date, daily[0].count);

    for day in daily {
        total += day.count;
        total_uniques += day.uniques;

        if day.count > best.1 || (day.count == best.1 && day.date < best.0) {
            best = (day.date, day.count);
        }
        if day.count < worst.1 || (day.count == worst.1 && day.date < worst.0) {
            worst = (day.date, day.count);
        }
    }

    TrafficAggregate {
        total,
        total_uniques,
        average: round2(total as f64 / daily.len() as f64),
        best_day: Some(best),
        worst_day: Some(worst),
    }
}

/// Round to two decimal places, half away from zero.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
