//! Pipeline configuration.
//!
//! Settings are read from `protostage.toml` in the project root when present
//! and then overridden by command-line flags. Every field has a default, so
//! an empty file (or no file at all) yields a usable configuration.

use crate::error::{Result, StageError};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;

/// Configuration file looked up in the project root when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "protostage.toml";

/// Project-relative directory that receives schemas extracted from archives.
pub const STAGING_DIR: &str = "target/protos";

/// Project-relative resource directory used as a default include path.
pub const RESOURCE_DIR: &str = "src/main/resources";

/// Settings for one staging and compilation run.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Remove the staging directory before the first extraction of a run.
    pub clear_staging: bool,
    /// Emit informational diagnostics.
    pub verbose: bool,
    /// Scan dependency archives even when no source files are configured.
    pub always_extract: bool,
    /// Target language; selects the `--<language>_out` flag.
    pub language: String,
    /// Project-relative output directory. Defaults to `src/main/<language>/`.
    pub output_directory: Option<String>,
    /// Compiler executable name or path.
    pub compiler_executable: String,
    /// Project-relative schema files handed to the compiler.
    pub source_files: Vec<String>,
    /// Project-relative include directories. Empty means use the defaults.
    pub include_paths: Vec<String>,
    /// Seconds to wait for the compiler before killing it.
    #[serde(rename = "timeout")]
    pub timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            clear_staging: true,
            verbose: false,
            always_extract: false,
            language: "java".to_owned(),
            output_directory: None,
            compiler_executable: "protoc".to_owned(),
            source_files: Vec::new(),
            include_paths: Vec::new(),
            timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    /// Parses configuration from TOML text.
    ///
    /// `origin` only labels errors.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::ConfigParse`] for malformed TOML or unknown keys
    /// and [`StageError::ConfigInvalid`] for a zero `timeout`.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use protostage::config::PipelineConfig;
    ///
    /// let config = PipelineConfig::from_toml_str(
    ///     "source-files = [\"schema/root.proto\"]\nlanguage = \"cpp\"\n",
    ///     Utf8Path::new("protostage.toml"),
    /// )?;
    /// assert_eq!(config.output_directory(), "src/main/cpp/");
    /// assert!(config.clear_staging);
    /// # Ok::<(), protostage::error::StageError>(())
    /// ```
    pub fn from_toml_str(contents: &str, origin: &Utf8Path) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|source| StageError::ConfigParse {
            path: origin.to_owned(),
            source,
        })?;

        if config.timeout_secs == Some(0) {
            return Err(StageError::ConfigInvalid {
                path: origin.to_owned(),
                reason: "timeout must be at least 1 second".to_owned(),
            });
        }
        Ok(config)
    }

    /// Reads and parses the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::ConfigRead`] if the file cannot be read and
    /// [`StageError::ConfigParse`] if it is not valid configuration.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| StageError::ConfigRead {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&contents, path)
    }

    /// Loads `explicit` when given, else `protostage.toml` under
    /// `project_root` if it exists, else the defaults.
    ///
    /// # Errors
    ///
    /// Propagates read and parse failures from [`Self::load`]. A missing
    /// default file is not an error.
    pub fn discover(project_root: &Utf8Path, explicit: Option<&Utf8Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(&project_root.join(path));
        }

        let default_path = project_root.join(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            Self::load(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the configured output directory or `src/main/<language>/`.
    #[must_use]
    pub fn output_directory(&self) -> String {
        self.output_directory
            .clone()
            .unwrap_or_else(|| format!("src/main/{}/", self.language))
    }

    /// Returns the compiler timeout, if one is configured.
    ///
    /// A zero timeout set programmatically means no timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }

    /// Decides whether dependency archives should be scanned at all.
    ///
    /// Scanning happens when forced or when there is something to compile;
    /// otherwise the run performs no archive I/O.
    ///
    /// # Examples
    ///
    /// ```
    /// use protostage::config::PipelineConfig;
    ///
    /// let mut config = PipelineConfig::default();
    /// assert!(!config.should_extract());
    ///
    /// config.always_extract = true;
    /// assert!(config.should_extract());
    /// ```
    #[must_use]
    pub fn should_extract(&self) -> bool {
        self.always_extract || !self.source_files.is_empty()
    }

    /// Absolute staging directory for `project_root`.
    #[must_use]
    pub fn staging_dir(project_root: &Utf8Path) -> Utf8PathBuf {
        project_root.join(STAGING_DIR)
    }
}
