//! Archive scanner for discovering bundled schema files.
//!
//! Dependency archives are zip containers (jars). The scanner lists the
//! members whose names end in [`SCHEMA_SUFFIX`] without reading their
//! contents; the [`crate::stager`] module extracts them afterwards.

use std::collections::HashSet;
use std::fs::File;

use camino::{Utf8Path, Utf8PathBuf};
use zip::ZipArchive;

use crate::error::{Result, StageError};
use crate::report::{Reporter, error_chain};

/// Suffix identifying schema files inside an archive.
pub const SCHEMA_SUFFIX: &str = ".proto";

/// Suffix of dependency descriptors that sit on the classpath but are not
/// archives.
pub const DESCRIPTOR_SUFFIX: &str = ".xml";

/// A schema file found inside a dependency archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScannedEntry {
    /// Path to the archive holding the entry.
    pub archive: Utf8PathBuf,
    /// Entry name inside the archive, using `/` separators.
    pub entry: String,
}

/// Returns true when `name` names a schema file.
///
/// The comparison is case-sensitive.
///
/// # Examples
///
/// ```
/// use protostage::scanner::is_schema_entry;
///
/// assert!(is_schema_entry("google/protobuf/any.proto"));
/// assert!(!is_schema_entry("google/protobuf/Any.PROTO"));
/// assert!(!is_schema_entry("google/protobuf/"));
/// ```
#[must_use]
pub fn is_schema_entry(name: &str) -> bool {
    name.ends_with(SCHEMA_SUFFIX)
}

/// Returns true when `path` may be opened as a dependency archive.
///
/// Descriptor files are rejected by name before the filesystem is touched.
/// Anything that is not a readable regular file is rejected too.
#[must_use]
pub fn is_candidate(path: &Utf8Path) -> bool {
    if path.as_str().ends_with(DESCRIPTOR_SUFFIX) {
        return false;
    }
    path.is_file() && File::open(path).is_ok()
}

/// Opens `path` as a zip archive.
///
/// # Errors
///
/// Returns [`StageError::ArchiveOpen`] if the file cannot be opened or is
/// not a valid archive.
pub fn open_archive(path: &Utf8Path) -> Result<ZipArchive<File>> {
    let archive_error = |source| StageError::ArchiveOpen {
        path: path.to_owned(),
        source,
    };
    let file = File::open(path).map_err(|e| archive_error(zip::result::ZipError::Io(e)))?;
    ZipArchive::new(file).map_err(archive_error)
}

/// Lists the schema entries of a single archive in the archive's own order.
///
/// # Errors
///
/// Returns [`StageError::ArchiveOpen`] if the archive cannot be opened or
/// its central directory cannot be read.
pub fn scan_archive(path: &Utf8Path) -> Result<Vec<String>> {
    let mut archive = open_archive(path)?;
    let mut names = Vec::new();

    for index in 0..archive.len() {
        let entry = archive
            .by_index_raw(index)
            .map_err(|source| StageError::ArchiveOpen {
                path: path.to_owned(),
                source,
            })?;
        if is_schema_entry(entry.name()) {
            names.push(entry.name().to_owned());
        }
    }

    Ok(names)
}

/// Scans every candidate archive and collects the schema entries found.
///
/// Paths repeated in `candidates` are scanned once. Descriptors and
/// non-files are skipped silently. An archive that cannot be read is
/// reported as an error and skipped; the remaining candidates are still
/// scanned.
#[must_use]
pub fn scan_archives<'a, I>(candidates: I, reporter: &dyn Reporter) -> Vec<ScannedEntry>
where
    I: IntoIterator<Item = &'a Utf8Path>,
{
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for path in candidates {
        if !seen.insert(path) || !is_candidate(path) {
            continue;
        }

        match scan_archive(path) {
            Ok(names) => found.extend(names.into_iter().map(|entry| ScannedEntry {
                archive: path.to_owned(),
                entry,
            })),
            Err(err) => reporter.error(&error_chain(&err)),
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Level, RecordingReporter};
    use crate::test_utils::write_archive;
    use rstest::rstest;
    use tempfile::TempDir;

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("non-UTF8 path");
        (temp, root)
    }

    #[rstest]
    #[case::nested("foo/bar/a.proto", true)]
    #[case::top_level("a.proto", true)]
    #[case::uppercase("a.PROTO", false)]
    #[case::class_file("foo/A.class", false)]
    #[case::directory("foo.proto/", false)]
    #[case::suffix_inside("a.proto.bak", false)]
    fn schema_suffix_match(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_schema_entry(name), expected);
    }

    #[test]
    fn scan_archive_keeps_only_schema_entries_in_order() {
        let (_temp, root) = temp_root();
        let jar = root.join("deps.jar");
        write_archive(
            &jar,
            &[
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n".as_slice()),
                ("foo/", b"".as_slice()),
                ("foo/b.proto", b"syntax = \"proto3\";".as_slice()),
                ("foo/Foo.class", b"\xca\xfe\xba\xbe".as_slice()),
                ("foo/a.proto", b"syntax = \"proto3\";".as_slice()),
            ],
        );

        let names = scan_archive(&jar).expect("scan should succeed");
        assert_eq!(names, vec!["foo/b.proto", "foo/a.proto"]);
    }

    #[test]
    fn descriptor_files_are_never_opened() {
        let (_temp, root) = temp_root();
        // A valid archive with a descriptor suffix must still be skipped.
        let descriptor = root.join("manifestOnly.xml");
        write_archive(&descriptor, &[("a.proto", b"".as_slice())]);

        let reporter = RecordingReporter::new();
        let found = scan_archives([descriptor.as_path()], &reporter);

        assert!(found.is_empty());
        assert!(reporter.messages().is_empty());
    }

    #[test]
    fn corrupt_archive_is_reported_and_skipped() {
        let (_temp, root) = temp_root();
        let corrupt = root.join("corrupt.jar");
        std::fs::write(&corrupt, b"not a zip file").expect("write corrupt jar");
        let good = root.join("good.jar");
        write_archive(&good, &[("x/y.proto", b"".as_slice())]);

        let reporter = RecordingReporter::new();
        let found = scan_archives([corrupt.as_path(), good.as_path()], &reporter);

        assert_eq!(
            found,
            vec![ScannedEntry {
                archive: good.clone(),
                entry: "x/y.proto".to_owned(),
            }]
        );
        assert!(reporter.contains(Level::Error, "corrupt.jar"));
    }

    #[test]
    fn missing_and_directory_candidates_are_skipped() {
        let (_temp, root) = temp_root();
        let missing = root.join("missing.jar");
        let directory = root.join("classes");
        std::fs::create_dir_all(&directory).expect("create dir");

        let reporter = RecordingReporter::new();
        let found = scan_archives([missing.as_path(), directory.as_path()], &reporter);

        assert!(found.is_empty());
        assert!(reporter.messages().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_candidates_are_skipped_silently() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, root) = temp_root();
        let locked = root.join("locked.jar");
        write_archive(&locked, &[("a.proto", b"".as_slice())]);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000))
            .expect("chmod archive");
        if File::open(&locked).is_ok() {
            // Permission bits do not bind this user (root).
            return;
        }

        let reporter = RecordingReporter::new();
        let found = scan_archives([locked.as_path()], &reporter);

        assert!(!is_candidate(&locked));
        assert!(found.is_empty());
        assert!(reporter.messages().is_empty());
    }

    #[test]
    fn repeated_candidates_are_scanned_once() {
        let (_temp, root) = temp_root();
        let jar = root.join("deps.jar");
        write_archive(&jar, &[("a.proto", b"".as_slice())]);

        let reporter = RecordingReporter::new();
        let found = scan_archives([jar.as_path(), jar.as_path()], &reporter);
        assert_eq!(found.len(), 1);
    }
}
