//! Compiler argument construction.
//!
//! The argument vector holds one `--proto_path` per include path, a single
//! `--<language>_out` flag, then the source files. Nothing else is added.

use std::fmt;

use camino::Utf8Path;

use crate::resolver::PathSet;

/// A fully assembled compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerCommand {
    program: String,
    args: Vec<String>,
}

impl CompilerCommand {
    /// Builds the invocation of `program` for the resolved inputs.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::{Utf8Path, Utf8PathBuf};
    /// use protostage::command::CompilerCommand;
    /// use protostage::resolver::PathSet;
    ///
    /// let includes: PathSet = [Utf8PathBuf::from("/repo/proto")].into_iter().collect();
    /// let sources: PathSet = [Utf8PathBuf::from("/repo/proto/a.proto")].into_iter().collect();
    /// let command = CompilerCommand::build(
    ///     "protoc",
    ///     "java",
    ///     &includes,
    ///     &sources,
    ///     Utf8Path::new("/repo/src/main/java"),
    /// );
    ///
    /// assert_eq!(
    ///     command.args(),
    ///     [
    ///         "--proto_path=/repo/proto",
    ///         "--java_out=/repo/src/main/java",
    ///         "/repo/proto/a.proto",
    ///     ]
    /// );
    /// ```
    #[must_use]
    pub fn build(
        program: &str,
        language: &str,
        include_paths: &PathSet,
        source_files: &PathSet,
        output_dir: &Utf8Path,
    ) -> Self {
        let mut args = Vec::with_capacity(include_paths.len() + source_files.len() + 1);
        args.extend(include_paths.iter().map(|path| proto_path_arg(path)));
        args.push(output_arg(language, output_dir));
        args.extend(source_files.iter().map(ToString::to_string));

        Self {
            program: program.to_owned(),
            args,
        }
    }

    /// The compiler executable.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The argument vector, without the program name.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CompilerCommand {
    /// Renders the command line for logs, quoting arguments that contain
    /// whitespace or quotes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Formats an include path flag.
#[must_use]
pub fn proto_path_arg(path: &Utf8Path) -> String {
    format!("--proto_path={path}")
}

/// Formats the output flag for `language`.
#[must_use]
pub fn output_arg(language: &str, output_dir: &Utf8Path) -> String {
    format!("--{language}_out={output_dir}")
}

fn quote(arg: &str) -> String {
    let needs_quotes =
        arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"');
    if needs_quotes {
        format!("'{}'", arg.replace('\'', r"'\''"))
    } else {
        arg.to_owned()
    }
}
