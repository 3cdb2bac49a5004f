/// Metric extraction from `time -v` style reports.
///
/// Pulls elapsed wall-clock time, CPU percent and peak resident memory out of
/// free-form text. Anything missing or malformed reads as zero.
use regex::Regex;
use std::sync::LazyLock;

static ELAPSED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Elapsed \(wall clock\) time \(h:mm:ss or m:ss\): ([0-9:.]+)").unwrap()
});

static CPU_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Percent of CPU this job got: ([0-9.]+)%").unwrap());

static MAX_RSS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Maximum resident set size \(kbytes\): ([0-9]+)").unwrap());

/// Measurements parsed from one timing report.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimingMetrics {
    pub elapsed_secs: f64,
    pub cpu_percent: f64,
    pub max_rss_kb: i64,
}

/// Extract all three metrics from the timing utility's combined output.
pub fn extract(output: &str) -> TimingMetrics {
    let elapsed = capture(&ELAPSED_RE, output).unwrap_or("0");
    let cpu = capture(&CPU_RE, output).unwrap_or("0");
    let rss = capture(&MAX_RSS_RE, output).unwrap_or("0");

    TimingMetrics {
        elapsed_secs: parse_time(elapsed),
        cpu_percent: cpu.parse().unwrap_or(0.0),
        max_rss_kb: rss.parse().unwrap_or(0),
    }
}

/// Whether the text contains any of the report lines at all.
///
/// Output with none of them (a `time` without `-v`, a usage message) carries
/// no measurement, as opposed to a report whose values happen to be zero.
pub fn has_report(output: &str) -> bool {
    [&*ELAPSED_RE, &*CPU_RE, &*MAX_RSS_RE]
        .iter()
        .any(|re| re.is_match(output))
}

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Convert `m:ss`, `h:mm:ss` or a bare number of seconds into seconds.
///
/// Components that fail to parse count as zero; a value matching none of the
/// shapes yields `0.0`.
pub fn parse_time(value: &str) -> f64 {
    let part = |s: &str| s.parse::<f64>().unwrap_or(0.0);
    let parts: Vec<&str> = value.split(':').collect();

    match parts.as_slice() {
        [m, s] => part(m) * 60.0 + part(s),
        [h, m, s] => part(h) * 3600.0 + part(m) * 60.0 + part(s),
        _ => part(value),
    }
}
