//! Error types for the staging pipeline.
//!
//! Most variants describe per-item failures that the pipeline reports and
//! skips. Only the compiler variants, and configuration loading in the CLI,
//! end a run.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while staging schemas or invoking the compiler.
#[derive(Debug, Error)]
pub enum StageError {
    /// A candidate could not be opened or read as a zip archive.
    #[error("could not process classpath file {path}")]
    ArchiveOpen {
        /// Path to the candidate archive.
        path: Utf8PathBuf,
        /// The underlying archive error.
        #[source]
        source: zip::result::ZipError,
    },

    /// A matched entry could not be read from its archive.
    #[error("could not read {entry} from {archive}")]
    EntryRead {
        /// Path to the owning archive.
        archive: Utf8PathBuf,
        /// Name of the entry inside the archive.
        entry: String,
        /// The underlying archive error.
        #[source]
        source: zip::result::ZipError,
    },

    /// A matched entry name would land outside the staging directory.
    #[error("entry {entry} in {archive} escapes the staging directory")]
    UnsafeEntryPath {
        /// Path to the owning archive.
        archive: Utf8PathBuf,
        /// The offending entry name.
        entry: String,
    },

    /// Writing an extracted entry to disk failed.
    #[error("could not write {path}")]
    ExtractWrite {
        /// Destination path under the staging directory.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The staging directory could not be removed before extraction.
    #[error("could not clear staging directory {path}")]
    ClearStaging {
        /// The staging directory.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configured include path is missing or not a directory.
    #[error("could not find path {path}")]
    IncludePathNotFound {
        /// The resolved absolute path.
        path: Utf8PathBuf,
    },

    /// A configured source file is missing or not a regular file.
    #[error("can't find file {path}")]
    SourceFileNotFound {
        /// The resolved absolute path.
        path: Utf8PathBuf,
    },

    /// The output directory could not be created.
    #[error("could not create output directory {path}")]
    OutputDirectory {
        /// The resolved output directory.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The compiler process could not be started or waited on.
    #[error("error executing command {program}")]
    CompilerSpawn {
        /// The compiler executable.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The compiler did not exit within the configured timeout.
    #[error("{program} timed out after {limit:?}")]
    CompilerTimeout {
        /// The compiler executable.
        program: String,
        /// The timeout that elapsed.
        limit: std::time::Duration,
    },

    /// A configuration file could not be read.
    #[error("could not read configuration {path}")]
    ConfigRead {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed.
    #[error("invalid configuration {path}")]
    ConfigParse {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// The underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// A configuration file parsed but holds an unusable value.
    #[error("invalid configuration {path}: {reason}")]
    ConfigInvalid {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the rejected value.
        reason: String,
    },

    /// The project root could not be determined.
    #[error("project root not usable: {reason}")]
    ProjectRoot {
        /// Description of the problem.
        reason: String,
    },

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`StageError`].
pub type Result<T> = std::result::Result<T, StageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_open_names_the_candidate() {
        let err = StageError::ArchiveOpen {
            path: Utf8PathBuf::from("/repo/lib/broken.jar"),
            source: zip::result::ZipError::FileNotFound,
        };
        assert!(err.to_string().contains("broken.jar"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn timeout_includes_program_and_limit() {
        let err = StageError::CompilerTimeout {
            program: "protoc".to_owned(),
            limit: std::time::Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "protoc timed out after 30s");
    }

    #[test]
    fn sub_second_timeout_is_not_rounded_down() {
        let err = StageError::CompilerTimeout {
            program: "protoc".to_owned(),
            limit: std::time::Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "protoc timed out after 250ms");
    }

    #[test]
    fn unsafe_entry_path_names_entry_and_archive() {
        let err = StageError::UnsafeEntryPath {
            archive: Utf8PathBuf::from("/repo/lib/evil.jar"),
            entry: "../escape.proto".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("../escape.proto"));
        assert!(msg.contains("evil.jar"));
    }

    #[test]
    fn missing_source_file_includes_path() {
        let err = StageError::SourceFileNotFound {
            path: Utf8PathBuf::from("/repo/schema/missing.proto"),
        };
        assert!(err.to_string().contains("/repo/schema/missing.proto"));
    }
}
