use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::runner::TimingWrapper;

/// Top-level configuration loaded from lintbench.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct BenchConfig {
    pub run: RunConfig,
    pub timing: TimingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub iterations: u32,
    pub output: PathBuf,
    /// 0 = one less than the available cores.
    pub parallel: i64,
    pub smart: bool,
    pub command_template: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub command: String,
    pub args: Vec<String>,
}

// --- Default implementations ---

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            output: PathBuf::from("metrics_data.csv"),
            parallel: 0,
            smart: true,
            command_template: "{analyzer_cmd} {path}".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        let wrapper = TimingWrapper::default();
        Self {
            command: wrapper.program,
            args: wrapper.args,
        }
    }
}

impl TimingConfig {
    pub fn wrapper(&self) -> TimingWrapper {
        TimingWrapper {
            program: self.command.clone(),
            args: self.args.clone(),
        }
    }
}

/// Errors that can occur while loading the config file.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

/// Read and parse the config file. A missing file yields the defaults.
pub fn try_load(path: &Path) -> Result<BenchConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BenchConfig::default()),
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load config, falling back to defaults when the file is unusable.
pub fn load_config(path: &Path) -> BenchConfig {
    try_load(path).unwrap_or_else(|e| {
        tracing::warn!("{e}; using default settings");
        BenchConfig::default()
    })
}
