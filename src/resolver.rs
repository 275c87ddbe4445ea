//! Resolution of project-relative include paths, sources, and output.
//!
//! Declared strings are joined to the project root and normalised
//! lexically, so `schema/./a.proto` and `schema/a.proto` are the same entry.
//! Paths that do not exist are reported and dropped rather than failing the
//! run.

use camino::{Utf8Path, Utf8PathBuf};

use crate::config::{RESOURCE_DIR, STAGING_DIR};
use crate::error::StageError;
use crate::report::{Reporter, error_chain};

/// An insertion-ordered set of paths.
///
/// Inserting a path that is already present is a no-op, so the first
/// occurrence decides its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSet {
    paths: Vec<Utf8PathBuf>,
}

impl PathSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `path`, returning false if it was already present.
    pub fn insert(&mut self, path: Utf8PathBuf) -> bool {
        if self.paths.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    /// Returns true if `path` is in the set.
    #[must_use]
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.paths.iter().any(|candidate| candidate == path)
    }

    /// Number of paths in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if the set holds no paths.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterates over the paths in insertion order.
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Utf8PathBuf> {
        self.paths.iter()
    }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = &'a Utf8PathBuf;
    type IntoIter = std::slice::Iter<'a, Utf8PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Utf8PathBuf> for PathSet {
    fn from_iter<I: IntoIterator<Item = Utf8PathBuf>>(iter: I) -> Self {
        let mut set = Self::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

/// Joins `declared` to `project_root` and removes `.` components, repeated
/// separators, and trailing slashes.
///
/// Absolute declarations replace the root. `..` components are kept.
///
/// # Examples
///
/// ```
/// use camino::{Utf8Path, Utf8PathBuf};
/// use protostage::resolver::resolve_path;
///
/// let path = resolve_path(Utf8Path::new("/repo"), "src/main/resources/./");
/// assert_eq!(path, Utf8PathBuf::from("/repo/src/main/resources"));
/// ```
#[must_use]
pub fn resolve_path(project_root: &Utf8Path, declared: &str) -> Utf8PathBuf {
    project_root.join(declared).components().collect()
}

/// Project-relative include paths used when none are configured.
///
/// The staging directory is only worth searching when this run wrote
/// something into it.
#[must_use]
pub fn default_include_paths(did_extract: bool) -> Vec<String> {
    let mut defaults = vec![format!("{RESOURCE_DIR}/")];
    if did_extract {
        defaults.push(format!("{STAGING_DIR}/"));
    }
    defaults
}

/// Resolves the include paths handed to the compiler.
///
/// A non-empty `declared` list is authoritative: it is filtered to existing
/// directories and nothing is added to it. An empty list is replaced by
/// [`default_include_paths`]. Explicit entries that are missing are reported
/// as warnings; missing defaults are only mentioned in verbose mode.
#[must_use]
pub fn resolve_include_paths(
    project_root: &Utf8Path,
    declared: &[String],
    did_extract: bool,
    reporter: &dyn Reporter,
    verbose: bool,
) -> PathSet {
    let synthesized = declared.is_empty();
    let defaults;
    let candidates = if synthesized {
        defaults = default_include_paths(did_extract);
        if verbose {
            reporter.info(&format!("Setting default include paths: {defaults:?}"));
        }
        defaults.as_slice()
    } else {
        declared
    };

    let mut resolved = PathSet::new();
    for candidate in candidates {
        let path = resolve_path(project_root, candidate);
        if path.is_dir() {
            resolved.insert(path);
            continue;
        }

        let message = error_chain(&StageError::IncludePathNotFound { path });
        if !synthesized {
            reporter.warn(&message);
        } else if verbose {
            reporter.info(&message);
        }
    }
    resolved
}

/// Resolves the schema files handed to the compiler, dropping entries that
/// are not regular files.
#[must_use]
pub fn resolve_source_files(
    project_root: &Utf8Path,
    declared: &[String],
    reporter: &dyn Reporter,
) -> PathSet {
    let mut resolved = PathSet::new();
    for candidate in declared {
        let path = resolve_path(project_root, candidate);
        if path.is_file() {
            resolved.insert(path);
        } else {
            reporter.warn(&error_chain(&StageError::SourceFileNotFound { path }));
        }
    }
    resolved
}

/// Resolves the output directory and creates it with any missing parents.
///
/// A creation failure is reported but does not stop the run; the compiler
/// will report the unusable directory itself.
#[must_use]
pub fn prepare_output_dir(
    project_root: &Utf8Path,
    declared: &str,
    reporter: &dyn Reporter,
) -> Utf8PathBuf {
    let path = resolve_path(project_root, declared);
    if !path.is_dir() {
        if let Err(source) = std::fs::create_dir_all(&path) {
            reporter.error(&error_chain(&StageError::OutputDirectory {
                path: path.clone(),
                source,
            }));
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Level, RecordingReporter};
    use rstest::rstest;
    use tempfile::TempDir;

    struct Project {
        _temp: TempDir,
        root: Utf8PathBuf,
    }

    impl Project {
        fn new() -> Self {
            let temp = TempDir::new().expect("failed to create temp dir");
            let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("non-UTF8 path");
            Self { _temp: temp, root }
        }

        fn dir(&self, relative: &str) -> Utf8PathBuf {
            let path = self.root.join(relative);
            std::fs::create_dir_all(&path).expect("create dir");
            path
        }

        fn file(&self, relative: &str) -> Utf8PathBuf {
            let path = self.root.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("create parent");
            }
            std::fs::write(&path, b"syntax = \"proto3\";").expect("write file");
            path
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|&v| v.to_owned()).collect()
    }

    #[rstest]
    #[case::plain("schema/a.proto", "/repo/schema/a.proto")]
    #[case::current_dir("schema/./a.proto", "/repo/schema/a.proto")]
    #[case::trailing_slash("src/main/resources/", "/repo/src/main/resources")]
    #[case::double_slash("schema//a.proto", "/repo/schema/a.proto")]
    #[case::absolute("/elsewhere/a.proto", "/elsewhere/a.proto")]
    fn resolve_path_normalises(#[case] declared: &str, #[case] expected: &str) {
        assert_eq!(
            resolve_path(Utf8Path::new("/repo"), declared),
            Utf8PathBuf::from(expected)
        );
    }

    #[test]
    fn path_set_deduplicates_and_keeps_first_position() {
        let set: PathSet = ["/b", "/a", "/b"].into_iter().map(Utf8PathBuf::from).collect();
        let order: Vec<&str> = set.iter().map(|path| path.as_str()).collect();
        assert_eq!(order, vec!["/b", "/a"]);
        assert!(set.contains(Utf8Path::new("/a")));
        assert_eq!(set.len(), 2);
    }

    #[rstest]
    #[case::without_extraction(false, 1)]
    #[case::with_extraction(true, 2)]
    fn defaults_include_staging_only_after_extraction(
        #[case] did_extract: bool,
        #[case] expected_len: usize,
    ) {
        let defaults = default_include_paths(did_extract);
        assert_eq!(defaults.len(), expected_len);
        assert_eq!(defaults.first().map(String::as_str), Some("src/main/resources/"));
        assert_eq!(
            defaults.iter().any(|p| p == "target/protos/"),
            did_extract
        );
    }

    #[test]
    fn synthesized_defaults_contain_existing_directories() {
        let project = Project::new();
        let resources = project.dir("src/main/resources");
        let staging = project.dir("target/protos");

        let reporter = RecordingReporter::new();
        let resolved = resolve_include_paths(&project.root, &[], true, &reporter, true);

        assert_eq!(resolved.len(), 2);
        assert!(resolved.contains(&resources));
        assert!(resolved.contains(&staging));
        assert!(reporter.contains(Level::Info, "Setting default include paths"));
    }

    #[test]
    fn staging_excluded_when_nothing_extracted() {
        let project = Project::new();
        let resources = project.dir("src/main/resources");
        let staging = project.dir("target/protos");

        let reporter = RecordingReporter::new();
        let resolved = resolve_include_paths(&project.root, &[], false, &reporter, false);

        assert!(resolved.contains(&resources));
        assert!(!resolved.contains(&staging));
    }

    #[test]
    fn explicit_list_is_used_verbatim_after_filtering() {
        let project = Project::new();
        project.dir("src/main/resources");
        project.dir("target/protos");
        let proto = project.dir("proto");
        project.file("not-a-dir.proto");

        let reporter = RecordingReporter::new();
        let resolved = resolve_include_paths(
            &project.root,
            &strings(&["proto", "proto/.", "missing", "not-a-dir.proto"]),
            true,
            &reporter,
            false,
        );

        assert_eq!(resolved.iter().collect::<Vec<_>>(), vec![&proto]);
        assert_eq!(reporter.at(Level::Warn).len(), 2);
    }

    #[test]
    fn missing_default_is_quiet_unless_verbose() {
        let project = Project::new();

        let quiet = RecordingReporter::new();
        let resolved = resolve_include_paths(&project.root, &[], false, &quiet, false);
        assert!(resolved.is_empty());
        assert!(quiet.messages().is_empty());

        let verbose = RecordingReporter::new();
        let resolved = resolve_include_paths(&project.root, &[], false, &verbose, true);
        assert!(resolved.is_empty());
        assert!(verbose.contains(Level::Info, "could not find path"));
    }

    #[test]
    fn source_files_keep_only_regular_files() {
        let project = Project::new();
        let root_proto = project.file("schema/root.proto");
        project.dir("schema/dir.proto");

        let reporter = RecordingReporter::new();
        let resolved = resolve_source_files(
            &project.root,
            &strings(&[
                "schema/root.proto",
                "schema/./root.proto",
                "schema/dir.proto",
                "schema/missing.proto",
            ]),
            &reporter,
        );

        assert_eq!(resolved.iter().collect::<Vec<_>>(), vec![&root_proto]);
        assert!(reporter.contains(Level::Warn, "schema/missing.proto"));
        assert!(reporter.contains(Level::Warn, "schema/dir.proto"));
    }

    #[test]
    fn output_dir_is_created_with_parents() {
        let project = Project::new();
        let reporter = RecordingReporter::new();

        let output = prepare_output_dir(&project.root, "build/generated/java/", &reporter);

        assert!(output.is_dir());
        assert_eq!(output, project.root.join("build/generated/java"));
        assert!(reporter.messages().is_empty());
    }

    #[test]
    fn existing_output_dir_is_accepted() {
        let project = Project::new();
        let existing = project.dir("src/main/java");
        let reporter = RecordingReporter::new();

        let output = prepare_output_dir(&project.root, "src/main/java/", &reporter);

        assert_eq!(output, existing);
        assert!(reporter.messages().is_empty());
    }
}
