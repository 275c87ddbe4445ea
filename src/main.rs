//! protostage CLI entrypoint.
//!
//! Loads configuration for the project root, applies command-line overrides,
//! and runs one staging and compilation pass. The process exits with the
//! compiler's status when it fails, and 1 for any other failure.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use protostage::cli::Cli;
use protostage::config::PipelineConfig;
use protostage::error::{Result, StageError};
use protostage::pipeline::{Pipeline, PipelineReport};
use protostage::report::{LogReporter, error_chain};
use protostage::runner::SystemCommandExecutor;
use std::io::Write;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli) -> Result<PipelineReport> {
    let project_root = resolve_project_root(cli.project_root.as_deref())?;
    let mut config = PipelineConfig::discover(&project_root, cli.config.as_deref())?;
    cli.apply_to(&mut config);

    init_logging(config.verbose);
    log::debug!(target: "protostage", "project root {project_root}");

    let artifacts = cli.artifact_paths(&LogReporter);
    let pipeline = Pipeline::new(&config, &project_root, &SystemCommandExecutor, &LogReporter);
    Ok(pipeline.execute(&artifacts))
}

/// Installs the stderr log backend. `RUST_LOG` takes precedence over the
/// verbosity flag.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .is_err()
    {
        // A global subscriber is already installed; keep it.
    }
}

/// Resolves `--project-root` against the working directory, defaulting to
/// the working directory itself.
fn resolve_project_root(explicit: Option<&Utf8Path>) -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir().map_err(|e| StageError::ProjectRoot {
        reason: format!("current directory is unavailable: {e}"),
    })?;
    let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| StageError::ProjectRoot {
        reason: format!("current directory is not valid UTF-8: {e}"),
    })?;

    let root = explicit.map_or_else(|| cwd.clone(), |path| cwd.join(path));
    if root.is_dir() {
        Ok(root)
    } else {
        Err(StageError::ProjectRoot {
            reason: format!("{root} is not a directory"),
        })
    }
}

fn exit_code_for_run_result(result: Result<PipelineReport>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(report) if report.is_success() => 0,
        Ok(report) => report.exit_code().filter(|&code| code != 0).unwrap_or(1),
        Err(err) => {
            write_stderr_line(stderr, error_chain(&err));
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}
