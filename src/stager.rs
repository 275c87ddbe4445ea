//! Extraction of scanned schema entries into the staging directory.
//!
//! Each entry lands at `staging_dir/<entry name>`, so identically named files
//! at different archive paths stay apart. Two archives that ship the same
//! entry path collide; the later archive wins and a warning is reported.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use zip::ZipArchive;

use crate::error::{Result, StageError};
use crate::report::{Reporter, error_chain};
use crate::scanner::{ScannedEntry, open_archive};

/// Files written by one staging pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Destination of every entry that was written, in extraction order.
    pub staged: Vec<Utf8PathBuf>,
}

impl StageReport {
    /// Returns true if at least one entry was written.
    #[must_use]
    pub fn did_extract(&self) -> bool {
        !self.staged.is_empty()
    }
}

/// Copies schema entries out of their archives.
#[derive(Debug, Clone)]
pub struct Stager {
    staging_dir: Utf8PathBuf,
    clear: bool,
    verbose: bool,
}

impl Stager {
    /// Creates a stager writing under `staging_dir`.
    ///
    /// When `clear` is set the directory is removed once, just before the
    /// first entry of a pass is written.
    #[must_use]
    pub fn new(staging_dir: Utf8PathBuf, clear: bool, verbose: bool) -> Self {
        Self {
            staging_dir,
            clear,
            verbose,
        }
    }

    /// Return the staging directory.
    #[must_use]
    pub fn staging_dir(&self) -> &Utf8Path {
        &self.staging_dir
    }

    /// Compute where `entry` from `archive` is written.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::UnsafeEntryPath`] if the entry name is absolute
    /// or climbs out of the staging directory.
    pub fn destination(&self, archive: &Utf8Path, entry: &str) -> Result<Utf8PathBuf> {
        let relative = Utf8Path::new(entry);
        let escapes = relative.components().any(|component| {
            !matches!(component, Utf8Component::Normal(_) | Utf8Component::CurDir)
        });

        if escapes {
            return Err(StageError::UnsafeEntryPath {
                archive: archive.to_owned(),
                entry: entry.to_owned(),
            });
        }

        Ok(self.staging_dir.join(relative))
    }

    /// Extract every entry, reporting and skipping the ones that fail.
    ///
    /// Entries from the same archive share one open handle as long as they
    /// are adjacent in `entries`, which is how the scanner produces them.
    #[must_use]
    pub fn stage_all(&self, entries: &[ScannedEntry], reporter: &dyn Reporter) -> StageReport {
        let mut report = StageReport::default();
        let mut cleared = false;
        let mut written_by: HashMap<Utf8PathBuf, Utf8PathBuf> = HashMap::new();

        for (archive_path, names) in group_by_archive(entries) {
            let mut archive = match open_archive(archive_path) {
                Ok(archive) => archive,
                Err(err) => {
                    reporter.error(&error_chain(&err));
                    continue;
                }
            };

            for name in names {
                if self.verbose {
                    reporter.info(&format!("Found proto file {name}"));
                }

                let dest = match self.destination(archive_path, name) {
                    Ok(dest) => dest,
                    Err(err) => {
                        reporter.error(&error_chain(&err));
                        continue;
                    }
                };

                if !cleared {
                    cleared = true;
                    self.clear_staging_dir(reporter);
                }

                if let Err(err) = extract_entry(&mut archive, archive_path, name, &dest) {
                    reporter.error(&error_chain(&err));
                    continue;
                }

                if let Some(previous) = written_by.insert(dest.clone(), archive_path.to_owned()) {
                    reporter.warn(&format!(
                        "{name} from {archive_path} replaced the copy staged from {previous}"
                    ));
                }
                report.staged.push(dest);
            }
        }

        report
    }

    /// Remove the staging directory if clearing is enabled.
    ///
    /// Failures are reported as warnings; a directory that does not exist yet
    /// is not a failure.
    fn clear_staging_dir(&self, reporter: &dyn Reporter) {
        if !self.clear {
            return;
        }

        if self.verbose {
            reporter.info(&format!("Deleting temp dir {}", self.staging_dir));
        }

        match fs::remove_dir_all(&self.staging_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                let err = StageError::ClearStaging {
                    path: self.staging_dir.clone(),
                    source,
                };
                reporter.warn(&error_chain(&err));
            }
        }
    }
}

/// Groups adjacent entries that share an archive, preserving order.
fn group_by_archive(entries: &[ScannedEntry]) -> Vec<(&Utf8Path, Vec<&str>)> {
    let mut groups: Vec<(&Utf8Path, Vec<&str>)> = Vec::new();

    for scanned in entries {
        let archive = scanned.archive.as_path();
        let entry = scanned.entry.as_str();
        if let Some((current, names)) = groups.last_mut() {
            if *current == archive {
                names.push(entry);
                continue;
            }
        }
        groups.push((archive, vec![entry]));
    }

    groups
}

/// Copy one entry's bytes to `dest`, creating parent directories.
fn extract_entry(
    archive: &mut ZipArchive<File>,
    archive_path: &Utf8Path,
    name: &str,
    dest: &Utf8Path,
) -> Result<()> {
    let mut entry = archive
        .by_name(name)
        .map_err(|source| StageError::EntryRead {
            archive: archive_path.to_owned(),
            entry: name.to_owned(),
            source,
        })?;

    let write_error = |source| StageError::ExtractWrite {
        path: dest.to_owned(),
        source,
    };

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    let mut output = File::create(dest).map_err(write_error)?;
    io::copy(&mut entry, &mut output).map_err(write_error)?;

    Ok(())
}
