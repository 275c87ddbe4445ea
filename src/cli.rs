//! CLI argument definitions for protostage.
//!
//! Flags mirror the configuration file keys. Any flag given on the command
//! line overrides the file; list flags replace the file's list rather than
//! extending it.

use crate::config::PipelineConfig;
use crate::report::Reporter;
use camino::Utf8PathBuf;
use clap::Parser;
use std::ffi::OsString;

/// Stage bundled schema files and run the schema compiler.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "protostage")]
#[command(version, about)]
#[command(long_about = concat!(
    "Stage bundled schema files and run the schema compiler.\n\n",
    "protostage scans dependency archives for .proto entries, copies them into ",
    "target/protos, and invokes protoc with include paths, source files, and an ",
    "output directory resolved against the project root.\n\n",
    "Settings are read from protostage.toml in the project root when present. ",
    "Flags given here take precedence over the file.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Compile one schema against a Maven classpath:\n",
    "    $ protostage -s src/main/proto/root.proto \\\n",
    "        --classpath \"$(mvn -q dependency:build-classpath -Dmdep.outputFile=/dev/stdout)\"\n\n",
    "  Only stage bundled schemas, without compiling:\n",
    "    $ protostage --always-extract -a lib/common-protos.jar\n\n",
    "  Generate C++ with a pinned compiler:\n",
    "    $ protostage -s schema/a.proto --language cpp --protoc /opt/protoc/bin/protoc",
))]
pub struct Cli {
    /// Project root that relative paths resolve against [default: current directory].
    #[arg(short = 'C', long, value_name = "DIR")]
    pub project_root: Option<Utf8PathBuf>,

    /// Configuration file, relative to the project root [default: protostage.toml].
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Dependency archive to scan (can be repeated).
    #[arg(short, long = "artifact", value_name = "PATH")]
    pub artifacts: Vec<Utf8PathBuf>,

    /// Platform path list of dependency archives, as printed by build tools.
    #[arg(long, value_name = "LIST")]
    pub classpath: Option<OsString>,

    /// Schema file to compile, relative to the project root (can be repeated).
    #[arg(short, long = "source", value_name = "FILE")]
    pub sources: Vec<String>,

    /// Include directory, relative to the project root (can be repeated).
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    pub includes: Vec<String>,

    /// Output directory [default: src/main/<language>/].
    #[arg(short, long = "output-directory", value_name = "DIR")]
    pub output: Option<String>,

    /// Target language passed as --<language>_out [default: java].
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Compiler executable name or path [default: protoc].
    #[arg(long = "protoc", alias = "compiler-executable", value_name = "PATH")]
    pub protoc: Option<String>,

    /// Seconds to wait for the compiler before killing it (at least 1).
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Scan archives even when no source files are configured.
    #[arg(long)]
    pub always_extract: bool,

    /// Keep previously staged files instead of clearing target/protos.
    #[arg(long = "no-clear-staging")]
    pub no_clear: bool,

    /// Report staging and compiler details.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Overlays the flags that were given onto `config`.
    pub fn apply_to(&self, config: &mut PipelineConfig) {
        if !self.sources.is_empty() {
            config.source_files.clone_from(&self.sources);
        }
        if !self.includes.is_empty() {
            config.include_paths.clone_from(&self.includes);
        }
        if let Some(output) = &self.output {
            config.output_directory = Some(output.clone());
        }
        if let Some(language) = &self.language {
            config.language.clone_from(language);
        }
        if let Some(protoc) = &self.protoc {
            config.compiler_executable.clone_from(protoc);
        }
        if self.timeout.is_some() {
            config.timeout_secs = self.timeout;
        }
        if self.always_extract {
            config.always_extract = true;
        }
        if self.no_clear {
            config.clear_staging = false;
        }
        if self.verbose {
            config.verbose = true;
        }
    }

    /// Returns every artifact named by `--artifact` and `--classpath`, in
    /// that order.
    ///
    /// Empty classpath segments are ignored. Segments that are not valid
    /// UTF-8 are reported as warnings and skipped.
    #[must_use]
    pub fn artifact_paths(&self, reporter: &dyn Reporter) -> Vec<Utf8PathBuf> {
        let mut paths = self.artifacts.clone();
        let Some(classpath) = &self.classpath else {
            return paths;
        };

        for segment in std::env::split_paths(classpath) {
            if segment.as_os_str().is_empty() {
                continue;
            }
            match Utf8PathBuf::from_path_buf(segment) {
                Ok(path) => paths.push(path),
                Err(segment) => reporter.warn(&format!(
                    "skipping classpath entry {} with a non-UTF-8 path",
                    segment.display()
                )),
            }
        }
        paths
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
