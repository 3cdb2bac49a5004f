//! Bounded fan-out of (tool × iteration) tasks.
//!
//! Every task waits on a shared semaphore before launching its process, so no
//! more than `limit` analyzers run at once. Tasks live in a `JoinSet` that a
//! single collector drains in completion order; `run` returns once the set is
//! empty, i.e. after every task has reported. A task that panics still yields
//! a degraded row for its tool.

use crate::command::build_command;
use crate::runner::{RunFailure, ToolExecutor, ToolResult};
use crate::tool::{Tool, ToolRegistry};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Resolved settings for one benchmarking run.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Absolute path handed to every analyzer.
    pub target: String,
    pub iterations: u32,
    /// Requested parallelism; zero or negative means auto.
    pub parallelism: i64,
    /// Accepted for compatibility; scheduling never reads it.
    pub smart: bool,
    /// Empty selects positional substitution.
    pub command_template: String,
}

/// Effective concurrency limit for a requested value.
///
/// Non-positive requests resolve to one less than the available cores, never
/// below one. Requests are capped at the most permits a semaphore can hold.
pub fn resolve_parallelism(requested: i64) -> usize {
    if requested > 0 {
        return usize::try_from(requested)
            .unwrap_or(usize::MAX)
            .min(Semaphore::MAX_PERMITS);
    }
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cores.saturating_sub(1).max(1)
}

pub struct Scheduler<E> {
    registry: ToolRegistry,
    config: SchedulerConfig,
    executor: Arc<E>,
}

impl<E: ToolExecutor + 'static> Scheduler<E> {
    pub fn new(registry: ToolRegistry, config: SchedulerConfig, executor: E) -> Self {
        Self {
            registry,
            config,
            executor: Arc::new(executor),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn limit(&self) -> usize {
        resolve_parallelism(self.config.parallelism)
    }

    pub fn task_count(&self) -> usize {
        self.registry.tools().len() * self.config.iterations as usize
    }

    /// The resolved command for each registered tool.
    pub fn commands(&self) -> Vec<(&Tool, Vec<String>)> {
        self.registry
            .tools()
            .iter()
            .map(|tool| {
                let argv = build_command(
                    tool,
                    &self.config.target,
                    &self.config.command_template,
                );
                (tool, argv)
            })
            .collect()
    }

    /// Run every task and return all results in completion order.
    pub async fn run(&self) -> Vec<ToolResult> {
        let limit = self.limit();
        let total = self.task_count();
        let gate = Arc::new(Semaphore::new(limit));
        let mut tasks = JoinSet::new();
        let mut names = HashMap::with_capacity(total);

        info!(
            tasks = total,
            tools = self.registry.tools().len(),
            iterations = self.config.iterations,
            limit,
            "scheduling benchmark tasks"
        );

        for (tool, argv) in self.commands() {
            debug!(tool = %tool.name, command = ?argv, "resolved analyzer command");
            for _ in 0..self.config.iterations {
                let gate = Arc::clone(&gate);
                let executor = Arc::clone(&self.executor);
                let tool = tool.clone();
                let argv = argv.clone();
                let name = tool.name.clone();

                let handle = tasks.spawn(async move {
                    match gate.acquire_owned().await {
                        Ok(_permit) => executor.execute(&tool, argv).await,
                        Err(_) => ToolResult::degraded(&tool.name, RunFailure::GateClosed),
                    }
                });
                names.insert(handle.id(), name);
            }
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next_with_id().await {
            let result = match joined {
                Ok((_, result)) => result,
                Err(e) => {
                    let name = names.get(&e.id()).cloned().unwrap_or_default();
                    ToolResult::degraded(
                        &name,
                        RunFailure::Panicked {
                            message: e.to_string(),
                        },
                    )
                }
            };
            debug!(
                tool = %result.name,
                finished_at = %result.timestamp.to_rfc3339(),
                completed = results.len() + 1,
                total,
                "task finished"
            );
            results.push(result);
        }

        let panicked = results
            .iter()
            .filter(|r| matches!(r.failure, Some(RunFailure::Panicked { .. })))
            .count();
        if panicked > 0 {
            warn!(panicked, total, "some benchmark tasks panicked");
        }
        results
    }
}
