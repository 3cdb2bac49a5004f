mod command;
mod config;
mod metrics;
mod runner;
mod scheduler;
mod sink;
mod stats;
mod tool;

use clap::{ArgAction, Parser};
use config::BenchConfig;
use runner::{TimedExecutor, TimingWrapper};
use scheduler::{Scheduler, SchedulerConfig};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tool::ToolRegistry;
use tracing_subscriber::EnvFilter;

/// Benchmark static analyzers: run each one repeatedly under `time -v`,
/// record wall time, CPU and peak memory, and append the rows to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "lintbench", version, about)]
pub struct Cli {
    /// Directory to analyze
    #[arg(short, long, default_value = ".")]
    target: String,

    /// Iterations per tool (overrides config)
    #[arg(short, long)]
    iterations: Option<u32>,

    /// Output CSV file (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Parallel processes, 0 = auto (overrides config)
    #[arg(short, long, allow_negative_numbers = true)]
    parallel: Option<i64>,

    /// Smart scheduling; accepted but has no effect on iteration counts
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    smart: Option<bool>,

    /// Command template with {analyzer_cmd} and {path}; empty = positional
    #[arg(long)]
    command_template: Option<String>,

    /// Extra analyzer executable to run alongside the built-ins
    #[arg(long)]
    custom_analyzer: Option<String>,

    /// Config file path
    #[arg(short, long, default_value = "lintbench.toml")]
    config: PathBuf,

    /// Timing utility (overrides config)
    #[arg(long)]
    timing_command: Option<String>,

    /// Print resolved settings and commands, don't run anything
    #[arg(long)]
    dry_run: bool,

    /// Print the per-tool summary as JSON
    #[arg(long)]
    json: bool,

    /// Summarize every row in the output file, not just this run
    #[arg(long)]
    cumulative: bool,

    /// Extra logging (resolved commands, task completions)
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors on stderr
    #[arg(short, long)]
    quiet: bool,
}

/// Everything a run needs once config and CLI are merged.
#[derive(Debug)]
struct Settings {
    scheduler: SchedulerConfig,
    output: PathBuf,
    timing: TimingWrapper,
}

fn resolve_settings(cli: &Cli, config: BenchConfig, target: &Path) -> Settings {
    let run = config.run;
    let mut timing = config.timing.wrapper();
    if let Some(program) = &cli.timing_command {
        timing.program = program.clone();
    }

    Settings {
        scheduler: SchedulerConfig {
            target: target.to_string_lossy().into_owned(),
            iterations: cli.iterations.unwrap_or(run.iterations),
            parallelism: cli.parallel.unwrap_or(run.parallel),
            smart: cli.smart.unwrap_or(run.smart),
            command_template: cli
                .command_template
                .clone()
                .unwrap_or(run.command_template),
        },
        output: cli.output.clone().unwrap_or(run.output),
        timing,
    }
}

/// Make the target directory absolute. This is the only fatal failure.
///
/// An empty target means the working directory, so in practice this only
/// fails when the working directory itself cannot be determined.
fn resolve_target(target: &str) -> std::io::Result<PathBuf> {
    let target = if target.is_empty() { "." } else { target };
    std::path::absolute(target)
}

fn init_tracing(cli: &Cli) {
    let default_filter = if cli.verbose {
        "lintbench=debug"
    } else if cli.quiet {
        "lintbench=warn"
    } else {
        "lintbench=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .init();
}

fn print_dry_run(scheduler: &Scheduler<TimedExecutor>, settings: &Settings) {
    let cfg = scheduler.config();
    println!("Dry run mode — nothing will be executed.");
    println!("Target:           {}", cfg.target);
    println!("Output:           {}", settings.output.display());
    println!("Iterations:       {}", cfg.iterations);
    println!("Parallelism:      {}", scheduler.limit());
    println!("Smart scheduling: {} (no effect)", cfg.smart);
    println!("Command template: {:?}", cfg.command_template);
    println!("Total tasks:      {}", scheduler.task_count());
    for (tool, argv) in scheduler.commands() {
        let wrapped = settings.timing.wrap(&argv).join(" ");
        println!("  {:<12} {} {}", tool.name, settings.timing.program, wrapped);
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);
    tracing::debug!(?cli, "parsed CLI arguments");

    let config = config::load_config(&cli.config);

    let target = match resolve_target(&cli.target) {
        Ok(path) => path,
        Err(e) => {
            tracing::error!(path = %cli.target, error = %e, "cannot resolve target directory");
            std::process::exit(1);
        }
    };

    let settings = resolve_settings(&cli, config, &target);
    let registry = ToolRegistry::with_custom(cli.custom_analyzer.as_deref());
    let tool_count = registry.tools().len();
    let scheduler = Scheduler::new(
        registry,
        settings.scheduler.clone(),
        TimedExecutor::new(settings.timing.clone()),
    );

    if cli.dry_run {
        print_dry_run(&scheduler, &settings);
        return;
    }

    let iterations = settings.scheduler.iterations;
    if !cli.json {
        println!(
            "Collecting metrics: {} iterations for each of {} tools",
            iterations, tool_count
        );
        println!("Command template: {}", settings.scheduler.command_template);
        if let Some(name) = cli.custom_analyzer.as_deref().filter(|n| !n.trim().is_empty()) {
            println!("Custom analyzer enabled: {name}");
        }
    }

    let start = Instant::now();
    let results = scheduler.run().await;

    let degraded = results.iter().filter(|r| r.is_degraded()).count();
    if degraded > 0 {
        tracing::warn!(
            degraded,
            total = results.len(),
            "some runs could not be measured and were recorded as zeros"
        );
    }

    if let Err(e) = sink::append_results(&settings.output, &results) {
        tracing::error!("{e}");
    }

    let summaries = if cli.cumulative {
        match sink::read_results(&settings.output) {
            Ok(rows) => stats::summarize(&rows),
            Err(e) => {
                tracing::error!("{e}; summarizing this run only");
                stats::summarize(&results)
            }
        }
    } else {
        stats::summarize(&results)
    };
    if cli.json {
        match serde_json::to_string_pretty(&summaries) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(error = %e, "failed to serialize summary"),
        }
        return;
    }

    println!(
        "Collected {} measurements in {} ({} per tool for {} tools)",
        results.len(),
        settings.output.display(),
        iterations,
        tool_count
    );
    print!("{}", stats::render_table(&summaries));
    println!(
        "Metrics collection finished in {:.2} seconds",
        start.elapsed().as_secs_f64()
    );
}
