//! Execution of the external schema compiler.
//!
//! The compiler is a black box: it receives an argument vector and produces
//! an exit status plus captured output. A configurable timeout guards
//! against a compiler that never exits.
//!
//! Executors have no [`Reporter`] of their own. Process housekeeping
//! failures that do not change the outcome (a child that could not be
//! reaped after a kill, or a pipe read that ended early) go to the `log`
//! facade at debug level only. Everything that affects the run is returned
//! to [`run_compiler`], which reports it.

use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::command::CompilerCommand;
use crate::error::{Result, StageError};
use crate::report::Reporter;

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs `program` with `args`, waiting at most `timeout` when given, and
    /// returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::CompilerSpawn`] if the process cannot be started
    /// or waited on, and [`StageError::CompilerTimeout`] if it outlives
    /// `timeout`.
    fn run(&self, program: &str, args: &[String], timeout: Option<Duration>) -> Result<Output>;
}

/// Executes commands on the host system, resolving bare names via `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, program: &str, args: &[String], timeout: Option<Duration>) -> Result<Output> {
        let spawn_error = |source| StageError::CompilerSpawn {
            program: program.to_owned(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        // Drain both pipes while waiting so a verbose compiler cannot block
        // on a full pipe buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match timeout {
            None => child.wait().map_err(spawn_error)?,
            Some(limit) => match child.wait_timeout(limit).map_err(spawn_error)? {
                Some(status) => status,
                None => {
                    if let Err(err) = child.kill().and_then(|()| child.wait()) {
                        log::debug!(target: "protostage", "could not reap {program}: {err}");
                    }
                    return Err(StageError::CompilerTimeout {
                        program: program.to_owned(),
                        limit,
                    });
                }
            },
        };

        Ok(Output {
            status,
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }
}

/// Reads a child pipe to the end on a helper thread.
fn drain<R>(pipe: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut reader) = pipe {
            // A read error truncates the capture; the exit status still counts.
            if let Err(err) = reader.read_to_end(&mut buffer) {
                log::debug!(target: "protostage", "truncated compiler output: {err}");
            }
        }
        buffer
    })
}

/// Result of one compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerRun {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CompilerRun {
    /// Returns true if the compiler exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs `command` once and reports its output.
///
/// In verbose mode the command line is reported before execution and
/// stdout afterwards. A nonzero exit reports stderr as an error.
///
/// # Errors
///
/// Propagates [`StageError::CompilerSpawn`] and
/// [`StageError::CompilerTimeout`] from the executor.
pub fn run_compiler(
    executor: &dyn CommandExecutor,
    command: &CompilerCommand,
    timeout: Option<Duration>,
    reporter: &dyn Reporter,
    verbose: bool,
) -> Result<CompilerRun> {
    if verbose {
        reporter.info(&command.to_string());
    }

    let output = executor.run(command.program(), command.args(), timeout)?;
    let run = CompilerRun {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if verbose && !run.stdout.trim().is_empty() {
        reporter.info(run.stdout.trim_end());
    }

    if !run.success() {
        let stderr = run.stderr.trim_end();
        if stderr.is_empty() {
            let status = run
                .exit_code
                .map_or_else(|| "a signal".to_owned(), |code| format!("status {code}"));
            reporter.error(&format!("{} exited with {status}", command.program()));
        } else {
            reporter.error(stderr);
        }
    }

    Ok(run)
}
