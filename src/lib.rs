//! protostage library.
//!
//! This crate finds schema files bundled in dependency archives, stages them
//! next to the project's own schemas, and runs the schema compiler with the
//! include paths, sources, and output directory it needs. It backs the
//! `protostage` binary and can be driven programmatically from build scripts
//! or tests.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`command`] - Compiler argument construction
//! - [`config`] - Pipeline settings and their TOML file form
//! - [`error`] - Error types for every pipeline stage
//! - [`pipeline`] - Orchestration of a single staging and compilation run
//! - [`report`] - Diagnostic sink abstraction and its `log` backend
//! - [`resolver`] - Include path, source file, and output directory resolution
//! - [`runner`] - Compiler process execution
//! - [`scanner`] - Archive scanning for bundled schema files
//! - [`stager`] - Extraction into the staging directory

pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod scanner;
pub mod stager;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
