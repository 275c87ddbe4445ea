//! Staging and compilation pipeline orchestration.
//!
//! One run flows strictly through scanner, stager, resolver, command builder,
//! and runner. Per-item problems are reported and skipped; only a compiler
//! that cannot run to completion, or that exits nonzero, fails the run.

use camino::{Utf8Path, Utf8PathBuf};

use crate::command::CompilerCommand;
use crate::config::PipelineConfig;
use crate::report::{Reporter, error_chain};
use crate::resolver::{prepare_output_dir, resolve_include_paths, resolve_source_files};
use crate::runner::{CommandExecutor, CompilerRun, run_compiler};
use crate::scanner::scan_archives;
use crate::stager::Stager;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No source file survived resolution; the compiler was not invoked.
    NothingToCompile,
    /// The compiler ran to completion.
    Compiled(CompilerRun),
    /// The compiler could not be started or was killed after the timeout.
    Aborted {
        /// Rendered cause.
        reason: String,
    },
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Files written into the staging directory.
    pub staged: Vec<Utf8PathBuf>,
    /// The invocation that was attempted, if any.
    pub command: Option<CompilerCommand>,
    /// Final state of the run.
    pub outcome: Outcome,
}

impl PipelineReport {
    /// Returns true unless the compiler failed or could not run.
    #[must_use]
    pub fn is_success(&self) -> bool {
        match &self.outcome {
            Outcome::NothingToCompile => true,
            Outcome::Compiled(run) => run.success(),
            Outcome::Aborted { .. } => false,
        }
    }

    /// Compiler exit code.
    ///
    /// `Some(0)` when nothing needed compiling, `None` when the compiler
    /// never produced an exit code.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match &self.outcome {
            Outcome::NothingToCompile => Some(0),
            Outcome::Compiled(run) => run.exit_code,
            Outcome::Aborted { .. } => None,
        }
    }
}

/// A configured pipeline bound to a project and its collaborators.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    project_root: &'a Utf8Path,
    executor: &'a dyn CommandExecutor,
    reporter: &'a dyn Reporter,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline for `project_root`.
    #[must_use]
    pub fn new(
        config: &'a PipelineConfig,
        project_root: &'a Utf8Path,
        executor: &'a dyn CommandExecutor,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            project_root,
            executor,
            reporter,
        }
    }

    /// Runs the pipeline over the resolved dependency `artifacts`.
    ///
    /// Never returns an error: failures are reported and reflected in the
    /// returned outcome.
    #[must_use]
    pub fn execute(&self, artifacts: &[Utf8PathBuf]) -> PipelineReport {
        let config = self.config;
        let verbose = config.verbose;

        let staged = if config.should_extract() {
            self.stage(artifacts)
        } else {
            if verbose {
                self.reporter
                    .info("Skipping archive extraction: no proto files configured.");
            }
            Vec::new()
        };

        let mut report = PipelineReport {
            staged,
            command: None,
            outcome: Outcome::NothingToCompile,
        };

        if config.source_files.is_empty() {
            if verbose {
                self.reporter
                    .warn("No proto files were configured to be compiled.");
            }
            return report;
        }

        let sources = resolve_source_files(self.project_root, &config.source_files, self.reporter);
        if sources.is_empty() {
            if verbose {
                self.reporter
                    .warn("None of the configured proto files exist; nothing to compile.");
            }
            return report;
        }

        let includes = resolve_include_paths(
            self.project_root,
            &config.include_paths,
            !report.staged.is_empty(),
            self.reporter,
            verbose,
        );
        let output_dir =
            prepare_output_dir(self.project_root, &config.output_directory(), self.reporter);

        let command = CompilerCommand::build(
            &config.compiler_executable,
            &config.language,
            &includes,
            &sources,
            &output_dir,
        );

        report.outcome = match run_compiler(
            self.executor,
            &command,
            config.timeout(),
            self.reporter,
            verbose,
        ) {
            Ok(run) => Outcome::Compiled(run),
            Err(err) => {
                let reason = error_chain(&err);
                self.reporter.error(&reason);
                Outcome::Aborted { reason }
            }
        };
        report.command = Some(command);
        report
    }

    fn stage(&self, artifacts: &[Utf8PathBuf]) -> Vec<Utf8PathBuf> {
        let candidates: Vec<Utf8PathBuf> = artifacts
            .iter()
            .map(|artifact| self.project_root.join(artifact))
            .collect();
        let entries = scan_archives(candidates.iter().map(Utf8PathBuf::as_path), self.reporter);

        let stager = Stager::new(
            PipelineConfig::staging_dir(self.project_root),
            self.config.clear_staging,
            self.config.verbose,
        );
        stager.stage_all(&entries, self.reporter).staged
    }
}
