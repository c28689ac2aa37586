//! Static HTML dashboard rendering.
//!
//! Renders the persisted traffic rows into a single self-contained HTML
//! file with a Chart.js line chart: one point per day, views and clones
//! summed across repositories. The file opens directly in a browser; no
//! server runs.

use chrono::NaiveDate;
use repopulse_core::types::{Metric, TrafficRecord};
use std::collections::BTreeMap;

/// Render all traffic rows as a dashboard page.
pub fn render_html(records: &[TrafficRecord]) -> String {
    // Sum per day across repositories; BTreeMap keeps dates sorted.
    let mut days: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for record in records {
        let entry = days.entry(record.date).or_default();
        match record.metric {
            Metric::Views => entry.0 += record.count,
            Metric::Clones => entry.1 += record.count,
        }
    }

    let labels: Vec<String> = days.keys().map(|d| d.format("%Y-%m-%d").to_string()).collect();
    let views: Vec<i64> = days.values().map(|v| v.0).collect();
    let clones: Vec<i64> = days.values().map(|v| v.1).collect();

    format!(
        r#"<!doctype html>
<html>
<head>
  <title>repopulse - GitHub traffic</title>
  <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
</head>
<body>
  <h1>GitHub traffic (last 14 days)</h1>
  <canvas id="chart"></canvas>
  <script>
    const ctx = document.getElementById('chart');
    new Chart(ctx, {{
      type: 'line',
      data: {{
        labels: {labels},
        datasets: [
          {{ label: 'Views', data: {views}, borderColor: 'blue', fill: false }},
          {{ label: 'Clones', data: {clones}, borderColor: 'green', fill: false }}
        ]
      }}
    }});
  </script>
</body>
</html>
"#,
        labels = to_json(&labels),
        views = to_json(&views),
        clones = to_json(&clones),
    )
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}
