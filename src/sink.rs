/// Append-only CSV output for benchmark rows.
///
/// The header is written only when the file is created by this call. Separate
/// harness processes appending to the same file are not coordinated.
use crate::metrics::TimingMetrics;
use crate::runner::{RunFailure, ToolResult};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub const HEADER: [&str; 4] = [
    "Tool",
    "Execution Time (s)",
    "CPU Used (%)",
    "Memory Used (KB)",
];

/// Errors that can occur while writing the results file.
#[derive(Debug)]
pub enum SinkError {
    /// Failed to open or create the output file.
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write or flush a record.
    Write { path: PathBuf, source: csv::Error },
    /// Failed to open or read back the results file.
    Read { path: PathBuf, source: csv::Error },
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Open { path, source } => {
                write!(f, "failed to open {}: {}", path.display(), source)
            }
            SinkError::Write { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            SinkError::Read { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SinkError::Open { source, .. } => Some(source),
            SinkError::Write { source, .. } => Some(source),
            SinkError::Read { source, .. } => Some(source),
        }
    }
}

/// Format one result as a CSV record.
fn record(result: &ToolResult) -> [String; 4] {
    [
        result.name.clone(),
        format!("{:.2}", result.exec_time_secs),
        format!("{:.2}", result.cpu_percent),
        result.memory_kb.to_string(),
    ]
}

/// Append `results` to the CSV file at `path`, returning the rows written.
pub fn append_results(path: &Path, results: &[ToolResult]) -> Result<usize, SinkError> {
    let is_new = !path.exists();

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SinkError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

    let write_err = |e: csv::Error| SinkError::Write {
        path: path.to_path_buf(),
        source: e,
    };

    let mut writer = csv::Writer::from_writer(file);
    if is_new {
        writer.write_record(HEADER).map_err(write_err)?;
    }
    for result in results {
        writer.write_record(record(result)).map_err(write_err)?;
    }
    writer.flush().map_err(|e| write_err(e.into()))?;

    tracing::debug!(
        path = %path.display(),
        rows = results.len(),
        header = is_new,
        "appended results"
    );
    Ok(results.len())
}

/// Read every row accumulated in the CSV file at `path`.
///
/// Short rows are skipped and malformed numbers read as zero. Rows whose
/// metrics are all zero come back degraded.
pub fn read_results(path: &Path) -> Result<Vec<ToolResult>, SinkError> {
    let read_err = |e: csv::Error| SinkError::Read {
        path: path.to_path_buf(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_err)?;

    let mut results = Vec::new();
    for record in reader.records() {
        let record = record.map_err(read_err)?;
        if record.len() < HEADER.len() {
            continue;
        }
        let metrics = TimingMetrics {
            elapsed_secs: record[1].parse().unwrap_or(0.0),
            cpu_percent: record[2].parse().unwrap_or(0.0),
            max_rss_kb: record[3].parse().unwrap_or(0),
        };
        if metrics == TimingMetrics::default() {
            results.push(ToolResult::degraded(&record[0], RunFailure::ZeroRow));
        } else {
            results.push(ToolResult::measured(&record[0], metrics));
        }
    }
    Ok(results)
}
