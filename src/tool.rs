//! Analyzer definitions and the per-run tool registry.

/// A static analyzer the harness knows how to invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub name: String,
    /// Base command, e.g. `["ruff", "check"]`.
    pub command: Vec<String>,
    /// Argument index the target path is written to in positional mode.
    pub target_arg: usize,
}

impl Tool {
    pub fn new(name: &str, command: &[&str], target_arg: usize) -> Self {
        Self {
            name: name.to_string(),
            command: command.iter().map(|s| s.to_string()).collect(),
            target_arg,
        }
    }

    /// A user-supplied analyzer invoked as `<name> <path>`.
    pub fn custom(name: &str) -> Self {
        Self::new(name, &[name], 1)
    }
}

/// The set of tools benchmarked in one run.
///
/// Built once at startup and handed to the scheduler; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    /// The fixed built-in analyzers.
    pub fn builtin() -> Self {
        Self {
            tools: vec![
                Tool::new("flake8", &["flake8"], 1),
                Tool::new("ruff", &["ruff", "check"], 2),
                Tool::new("mypy", &["mypy"], 1),
            ],
        }
    }

    /// Built-ins plus an optional custom analyzer.
    ///
    /// A blank name or one that shadows a built-in is ignored.
    pub fn with_custom(custom: Option<&str>) -> Self {
        let mut registry = Self::builtin();
        if let Some(name) = custom.map(str::trim).filter(|n| !n.is_empty()) {
            if registry.contains(name) {
                tracing::debug!(analyzer = name, "custom analyzer is a built-in, not adding");
            } else {
                registry.tools.push(Tool::custom(name));
            }
        }
        registry
    }

    #[cfg(test)]
    pub fn from_tools(tools: Vec<Tool>) -> Self {
        Self { tools }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }
}
