//! Per-tool summary statistics for a finished run.
//!
//! Quartiles are taken by index into the sorted samples
//! (`sorted[floor(n * p)]`), without interpolation.

use crate::runner::ToolResult;
use serde::Serialize;

/// Distribution of one metric across a tool's samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolSummary {
    pub tool: String,
    pub samples: usize,
    /// Rows whose metrics were zero-filled.
    pub degraded: usize,
    pub execution_secs: MetricStats,
    pub cpu_percent: MetricStats,
    pub memory_kb: MetricStats,
}

pub fn calculate_stats(values: &[f64]) -> MetricStats {
    if values.is_empty() {
        return MetricStats::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let len = sorted.len();
    let at = |p: f64| sorted[((len as f64 * p).floor() as usize).min(len - 1)];

    MetricStats {
        min: sorted[0],
        q1: at(0.25),
        median: at(0.5),
        q3: at(0.75),
        max: sorted[len - 1],
        mean: sorted.iter().sum::<f64>() / len as f64,
    }
}

/// Group results by tool, in order of first appearance.
pub fn summarize(results: &[ToolResult]) -> Vec<ToolSummary> {
    let mut order: Vec<&str> = Vec::new();
    for r in results {
        if !order.contains(&r.name.as_str()) {
            order.push(&r.name);
        }
    }

    order
        .into_iter()
        .map(|tool| {
            let rows: Vec<&ToolResult> = results.iter().filter(|r| r.name == tool).collect();
            let column = |f: fn(&ToolResult) -> f64| -> Vec<f64> {
                rows.iter().map(|r| f(r)).collect()
            };

            ToolSummary {
                tool: tool.to_string(),
                samples: rows.len(),
                degraded: rows.iter().filter(|r| r.is_degraded()).count(),
                execution_secs: calculate_stats(&column(|r| r.exec_time_secs)),
                cpu_percent: calculate_stats(&column(|r| r.cpu_percent)),
                memory_kb: calculate_stats(&column(|r| r.memory_kb as f64)),
            }
        })
        .collect()
}

/// Render summaries as a plain-text table.
pub fn render_table(summaries: &[ToolSummary]) -> String {
    let mut out = format!(
        "{:<16} {:>7} {:>9} {:>10} {:>10} {:>10} {:>12}\n",
        "Tool", "Samples", "Degraded", "Time (s)", "Median (s)", "CPU (%)", "Memory (KB)"
    );
    for s in summaries {
        out.push_str(&format!(
            "{:<16} {:>7} {:>9} {:>10.2} {:>10.2} {:>10.2} {:>12.0}\n",
            s.tool,
            s.samples,
            s.degraded,
            s.execution_secs.mean,
            s.execution_secs.median,
            s.cpu_percent.mean,
            s.memory_kb.mean,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::TimingMetrics;
    use crate::runner::RunFailure;

    fn row(name: &str, secs: f64, cpu: f64, kb: i64) -> ToolResult {
        ToolResult::measured(
            name,
            TimingMetrics {
                elapsed_secs: secs,
                cpu_percent: cpu,
                max_rss_kb: kb,
            },
        )
    }

    #[test]
    fn test_calculate_stats_empty_is_zero() {
        assert_eq!(calculate_stats(&[]), MetricStats::default());
    }

    #[test]
    fn test_calculate_stats_single_value() {
        let s = calculate_stats(&[4.0]);
        assert_eq!(s.min, 4.0);
        assert_eq!(s.q1, 4.0);
        assert_eq!(s.median, 4.0);
        assert_eq!(s.q3, 4.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.mean, 4.0);
    }

    #[test]
    fn test_calculate_stats_index_quartiles() {
        // sorted: 1 2 3 4 5 6 7 8; q1 = [2], median = [4], q3 = [6]
        let s = calculate_stats(&[8.0, 3.0, 1.0, 5.0, 2.0, 7.0, 4.0, 6.0]);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.q1, 3.0);
        assert_eq!(s.median, 5.0);
        assert_eq!(s.q3, 7.0);
        assert_eq!(s.max, 8.0);
        assert_eq!(s.mean, 4.5);
    }

    #[test]
    fn test_summarize_groups_in_first_seen_order() {
        let results = vec![
            row("ruff", 1.0, 100.0, 10),
            row("flake8", 2.0, 50.0, 20),
            row("ruff", 3.0, 100.0, 30),
            ToolResult::degraded("flake8", RunFailure::GateClosed),
        ];

        let summaries = summarize(&results);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].tool, "ruff");
        assert_eq!(summaries[0].samples, 2);
        assert_eq!(summaries[0].degraded, 0);
        assert_eq!(summaries[0].execution_secs.mean, 2.0);
        assert_eq!(summaries[0].memory_kb.max, 30.0);

        assert_eq!(summaries[1].tool, "flake8");
        assert_eq!(summaries[1].samples, 2);
        assert_eq!(summaries[1].degraded, 1);
        assert_eq!(summaries[1].cpu_percent.min, 0.0);
    }

    #[test]
    fn test_render_table_has_row_per_tool() {
        let summaries = summarize(&[row("mypy", 2.5, 98.0, 90000), row("ruff", 0.1, 150.0, 4000)]);
        let table = render_table(&summaries);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Tool"));
        assert!(lines[1].starts_with("mypy"));
        assert!(lines[1].contains("2.50"));
        assert!(lines[2].contains("4000"));
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let summaries = summarize(&[row("ruff", 1.0, 100.0, 10)]);
        let json = serde_json::to_value(&summaries).unwrap();
        assert_eq!(json[0]["tool"], "ruff");
        assert_eq!(json[0]["samples"], 1);
        assert_eq!(json[0]["execution_secs"]["mean"], 1.0);
    }
}
