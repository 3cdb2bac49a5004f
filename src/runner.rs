/// Run one analyzer under the timing utility and turn its report into a row.
///
/// Every invocation produces a `ToolResult`. Analyzer exit codes are ignored
/// and anything that prevents a real measurement degrades to zero metrics,
/// with the reason kept in `ToolResult::failure`.
use crate::metrics::{self, TimingMetrics};
use crate::tool::Tool;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::process::Stdio;
use tokio::process::Command;

/// Why a row carries zero-filled metrics instead of a measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunFailure {
    /// The timing utility could not be started.
    Spawn { program: String, message: String },
    /// Waiting on the timing utility or reading its output failed.
    Io { message: String },
    /// The timing utility ran but printed none of the expected report lines.
    NoReport { program: String },
    /// The admission gate was closed before the task got a slot.
    GateClosed,
    /// The task panicked before producing a measurement.
    Panicked { message: String },
    /// A row read back from the results file with every metric at zero.
    ZeroRow,
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunFailure::Spawn { program, message } => {
                write!(f, "failed to spawn {}: {}", program, message)
            }
            RunFailure::Io { message } => write!(f, "I/O error while running tool: {}", message),
            RunFailure::NoReport { program } => {
                write!(f, "{} printed no resource report", program)
            }
            RunFailure::GateClosed => write!(f, "admission gate closed"),
            RunFailure::Panicked { message } => write!(f, "task panicked: {}", message),
            RunFailure::ZeroRow => write!(f, "recorded row has no measurement"),
        }
    }
}

/// One observed measurement.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub name: String,
    pub exec_time_secs: f64,
    pub cpu_percent: f64,
    pub memory_kb: i64,
    pub timestamp: DateTime<Utc>,
    /// Set when the metrics are zero-filled rather than measured.
    pub failure: Option<RunFailure>,
}

impl ToolResult {
    pub fn measured(name: &str, metrics: TimingMetrics) -> Self {
        Self {
            name: name.to_string(),
            exec_time_secs: metrics.elapsed_secs,
            cpu_percent: metrics.cpu_percent,
            memory_kb: metrics.max_rss_kb,
            timestamp: Utc::now(),
            failure: None,
        }
    }

    pub fn degraded(name: &str, failure: RunFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::measured(name, TimingMetrics::default())
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

/// The external timing utility wrapped around every analyzer command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingWrapper {
    pub program: String,
    /// Arguments placed before the analyzer command, e.g. `-v`.
    pub args: Vec<String>,
}

impl Default for TimingWrapper {
    fn default() -> Self {
        Self {
            program: "/usr/bin/time".to_string(),
            args: vec!["-v".to_string()],
        }
    }
}

impl TimingWrapper {
    /// Full argv passed to the timing program for `command`.
    pub fn wrap(&self, command: &[String]) -> Vec<String> {
        self.args.iter().chain(command).cloned().collect()
    }
}

/// Executes one resolved analyzer command and reports a measurement.
///
/// Infallible by type: failures are folded into the returned `ToolResult`.
pub trait ToolExecutor: Send + Sync {
    fn execute(&self, tool: &Tool, command: Vec<String>) -> impl Future<Output = ToolResult> + Send;
}

/// Production executor: runs the command under the timing utility.
#[derive(Debug, Clone, Default)]
pub struct TimedExecutor {
    timing: TimingWrapper,
}

impl TimedExecutor {
    pub fn new(timing: TimingWrapper) -> Self {
        Self { timing }
    }

    /// Run the timing utility and return its combined stdout+stderr.
    ///
    /// The exit status is discarded; analyzers that find issues exit non-zero.
    async fn capture(&self, command: &[String]) -> Result<String, RunFailure> {
        let output = Command::new(&self.timing.program)
            .args(self.timing.wrap(command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    RunFailure::Spawn {
                        program: self.timing.program.clone(),
                        message: e.to_string(),
                    }
                }
                _ => RunFailure::Io {
                    message: e.to_string(),
                },
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }
}

impl ToolExecutor for TimedExecutor {
    async fn execute(&self, tool: &Tool, command: Vec<String>) -> ToolResult {
        match self.capture(&command).await {
            Ok(text) if metrics::has_report(&text) => {
                ToolResult::measured(&tool.name, metrics::extract(&text))
            }
            Ok(_) => ToolResult::degraded(
                &tool.name,
                RunFailure::NoReport {
                    program: self.timing.program.clone(),
                },
            ),
            Err(failure) => ToolResult::degraded(&tool.name, failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A stand-in timing utility: `sh -c <script> timing <command...>`.
    fn fake_timing(script: &str) -> TimedExecutor {
        TimedExecutor::new(TimingWrapper {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "timing".to_string()],
        })
    }

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_wrap_prepends_timing_args() {
        let timing = TimingWrapper::default();
        assert_eq!(
            timing.wrap(&argv(&["ruff", "check", "/src"])),
            vec!["-v", "ruff", "check", "/src"]
        );
    }

    #[tokio::test]
    async fn test_execute_parses_report_from_stderr() {
        let executor = fake_timing(
            "echo 'analyzer output'; \
             echo 'Percent of CPU this job got: 42%' >&2; \
             echo 'Elapsed (wall clock) time (h:mm:ss or m:ss): 0:02.50' >&2; \
             echo 'Maximum resident set size (kbytes): 2048' >&2",
        );
        let tool = Tool::new("flake8", &["flake8"], 1);

        let result = executor.execute(&tool, argv(&["flake8", "/src"])).await;

        assert_eq!(result.name, "flake8");
        assert_eq!(result.cpu_percent, 42.0);
        assert!((result.exec_time_secs - 2.5).abs() < 1e-9);
        assert_eq!(result.memory_kb, 2048);
        assert!(!result.is_degraded());
    }

    #[tokio::test]
    async fn test_execute_ignores_nonzero_exit() {
        let executor = fake_timing("echo 'Maximum resident set size (kbytes): 77' >&2; exit 1");
        let tool = Tool::new("mypy", &["mypy"], 1);

        let result = executor.execute(&tool, argv(&["mypy", "/src"])).await;

        assert_eq!(result.memory_kb, 77);
        assert!(result.failure.is_none());
    }

    #[tokio::test]
    async fn test_execute_passes_command_after_timing_args() {
        // "$@" is the wrapped command; echo it back inside a parsable line.
        let executor = fake_timing("echo \"Maximum resident set size (kbytes): $#\" >&2");
        let tool = Tool::new("ruff", &["ruff", "check"], 2);

        let result = executor
            .execute(&tool, argv(&["ruff", "check", "/src"]))
            .await;

        assert_eq!(result.memory_kb, 3);
    }

    #[tokio::test]
    async fn test_execute_unparseable_output_is_degraded() {
        let executor = fake_timing("echo garbage");
        let tool = Tool::new("ruff", &["ruff", "check"], 2);

        let result = executor.execute(&tool, argv(&["ruff"])).await;

        assert_eq!(result.exec_time_secs, 0.0);
        assert_eq!(result.cpu_percent, 0.0);
        assert_eq!(result.memory_kb, 0);
        assert!(result.is_degraded());
        assert_eq!(
            result.failure,
            Some(RunFailure::NoReport {
                program: "sh".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_execute_usage_message_without_report_is_degraded() {
        // A `time` that does not understand -v prints usage and exits 1.
        let executor = fake_timing("echo 'usage: time [-lp] command' >&2; exit 1");
        let tool = Tool::new("flake8", &["flake8"], 1);

        let result = executor.execute(&tool, argv(&["flake8", "/src"])).await;

        assert!(matches!(result.failure, Some(RunFailure::NoReport { .. })));
        assert_eq!(result.memory_kb, 0);
        assert!(result
            .failure
            .unwrap()
            .to_string()
            .contains("printed no resource report"));
    }

    #[tokio::test]
    async fn test_execute_missing_timing_utility_degrades() {
        let executor = TimedExecutor::new(TimingWrapper {
            program: "nonexistent-timing-binary-xyz".to_string(),
            args: vec!["-v".to_string()],
        });
        let tool = Tool::new("flake8", &["flake8"], 1);

        let result = executor.execute(&tool, argv(&["flake8", "/src"])).await;

        assert_eq!(result.name, "flake8");
        assert_eq!(result.exec_time_secs, 0.0);
        assert_eq!(result.memory_kb, 0);
        assert!(matches!(result.failure, Some(RunFailure::Spawn { .. })));
        assert!(result
            .failure
            .unwrap()
            .to_string()
            .contains("failed to spawn nonexistent-timing-binary-xyz"));
    }

    #[test]
    fn test_degraded_result_is_zero_filled() {
        let result = ToolResult::degraded("ruff", RunFailure::GateClosed);
        assert_eq!(result.name, "ruff");
        assert_eq!(result.exec_time_secs, 0.0);
        assert_eq!(result.cpu_percent, 0.0);
        assert_eq!(result.memory_kb, 0);
        assert!(result.is_degraded());
    }
}
