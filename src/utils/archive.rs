//! Transactional extraction of repository archives.
//!
//! Archives are unpacked into a staging directory created inside the
//! destination and then renamed into place, merging into directories that
//! already exist. A file the archive replaces is first moved into the staging
//! directory, so a failure part way through can put it back. The staging
//! directory is a [`tempfile::TempDir`] and is removed on every exit path,
//! taking the replaced files with it once extraction succeeds.

use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use crate::error::{VcsError, VcsResult};

const STAGING_PREFIX: &str = ".vcsclient-extract-";

/// Extracts a zip archive into `destination`.
///
/// `destination` must be an existing directory. Archive files overwrite
/// existing files of the same path; unrelated entries are left alone. Returns
/// the number of entries written or replaced.
pub fn extract_zip_into(archive: &[u8], destination: &Path) -> VcsResult<usize> {
    if !destination.is_dir() {
        return Err(VcsError::validation(format!(
            "destination {} is not an existing directory",
            destination.display()
        )));
    }

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(destination)
        .map_err(|e| VcsError::from_local_io(&e, "destination is not writable"))?;
    let content = staging.path().join("content");
    let backups = staging.path().join("backup");
    for dir in [&content, &backups] {
        fs::create_dir(dir)
            .map_err(|e| VcsError::from_local_io(&e, "failed to prepare staging directory"))?;
    }

    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).map_err(zip_error)?;
    zip.extract(&content).map_err(zip_error)?;

    let mut journal = Journal::new(backups);
    if let Err(err) = journal.merge_dir(&content, destination) {
        journal.rollback();
        return Err(VcsError::from_local_io(&err, "failed to move extracted files into place"));
    }

    Ok(journal.len())
}

/// A change made to the destination, in the order it was made.
#[derive(Debug)]
enum Placement {
    Added(PathBuf),
    Replaced { target: PathBuf, backup: PathBuf },
}

/// Records placements so they can be undone.
#[derive(Debug)]
struct Journal {
    backups: PathBuf,
    steps: Vec<Placement>,
}

impl Journal {
    fn new(backups: PathBuf) -> Self {
        Self {
            backups,
            steps: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.steps.len()
    }

    /// Moves every entry of `from` into the existing directory `to`.
    fn merge_dir(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            self.place(&entry.path(), &to.join(entry.file_name()))?;
        }
        Ok(())
    }

    fn place(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        let existing = match fs::symlink_metadata(to) {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                fs::rename(from, to)?;
                self.steps.push(Placement::Added(to.to_path_buf()));
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        if existing.is_dir() && fs::symlink_metadata(from)?.is_dir() {
            return self.merge_dir(from, to);
        }

        let backup = self.backups.join(self.steps.len().to_string());
        fs::rename(to, &backup)?;
        self.steps.push(Placement::Replaced {
            target: to.to_path_buf(),
            backup,
        });
        fs::rename(from, to)
    }

    /// Undoes every placement, newest first.
    fn rollback(self) {
        for step in self.steps.into_iter().rev() {
            match step {
                Placement::Added(path) => remove_path(&path),
                Placement::Replaced { target, backup } => {
                    remove_path(&target);
                    if let Err(err) = fs::rename(&backup, &target) {
                        tracing::warn!(
                            path = %target.display(),
                            error = %err,
                            "failed to restore replaced entry"
                        );
                    }
                }
            }
        }
    }
}

fn remove_path(path: &Path) {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(_) => return,
    };
    if let Err(err) = result {
        tracing::warn!(
            path = %path.display(),
            error = %err,
            "failed to roll back extracted entry"
        );
    }
}

fn zip_error(err: zip::result::ZipError) -> VcsError {
    match err {
        zip::result::ZipError::Io(io) => {
            VcsError::from_local_io(&io, "failed to unpack repository archive")
        }
        other => VcsError::Transient {
            message: format!("invalid repository archive: {other}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn build_archive(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn dir_entries(path: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(path)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    /// # Test: Successful Extraction
    ///
    /// Verifies that archive contents land directly in the destination.
    ///
    /// ## Test Scenario
    /// - Extract an archive with a root file and a nested file
    ///
    /// ## Expected Outcome
    /// - Both files exist with their content
    /// - No staging directory remains
    #[test]
    fn test_extract_places_contents() {
        let dest = TempDir::new().unwrap();
        let archive = build_archive(&[("README.md", "hello"), ("src/main.rs", "fn main() {}")]);

        let placed = extract_zip_into(&archive, dest.path()).unwrap();

        assert_eq!(placed, 2);
        assert_eq!(dir_entries(dest.path()), vec!["README.md", "src"]);
        assert_eq!(
            fs::read_to_string(dest.path().join("src/main.rs")).unwrap(),
            "fn main() {}"
        );
    }

    /// # Test: Corrupt Archive Leaves Destination Untouched
    ///
    /// Verifies that a failure during extraction has no visible side effect.
    ///
    /// ## Test Scenario
    /// - Destination holds one pre-existing file
    /// - Extract bytes that are not a zip archive
    ///
    /// ## Expected Outcome
    /// - An error is returned
    /// - Destination contains only the pre-existing file
    #[test]
    fn test_corrupt_archive_leaves_no_residue() {
        let dest = TempDir::new().unwrap();
        fs::write(dest.path().join("keep.txt"), "mine").unwrap();

        let result = extract_zip_into(b"definitely not a zip", dest.path());

        assert!(result.is_err());
        assert_eq!(dir_entries(dest.path()), vec!["keep.txt"]);
    }

    /// # Test: Existing Files Are Overwritten
    ///
    /// Verifies that extraction writes over clashing files and merges into
    /// existing directories.
    ///
    /// ## Test Scenario
    /// - Destination holds README.md, src/old.rs and notes.txt
    /// - Archive contains README.md, src/lib.rs and lib.rs
    ///
    /// ## Expected Outcome
    /// - README.md has the archive content
    /// - src/old.rs and notes.txt are kept next to the new entries
    /// - No staging directory remains
    #[test]
    fn test_existing_entries_are_overwritten() {
        let dest = TempDir::new().unwrap();
        fs::write(dest.path().join("README.md"), "original").unwrap();
        fs::write(dest.path().join("notes.txt"), "mine").unwrap();
        fs::create_dir(dest.path().join("src")).unwrap();
        fs::write(dest.path().join("src/old.rs"), "old").unwrap();
        let archive = build_archive(&[
            ("README.md", "new"),
            ("src/lib.rs", "lib"),
            ("lib.rs", ""),
        ]);

        extract_zip_into(&archive, dest.path()).unwrap();

        assert_eq!(
            dir_entries(dest.path()),
            vec!["README.md", "lib.rs", "notes.txt", "src"]
        );
        assert_eq!(
            fs::read_to_string(dest.path().join("README.md")).unwrap(),
            "new"
        );
        assert_eq!(dir_entries(&dest.path().join("src")), vec!["lib.rs", "old.rs"]);
    }

    /// # Test: Rollback Restores Replaced Entries
    ///
    /// Verifies that undoing placements brings the destination back.
    ///
    /// ## Test Scenario
    /// - Destination holds README.md
    /// - A staged README.md and a staged new file are placed
    /// - The journal is rolled back
    ///
    /// ## Expected Outcome
    /// - README.md has its original content
    /// - The new file is gone
    #[test]
    fn test_rollback_restores_replaced_entries() {
        let dest = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        fs::write(dest.path().join("README.md"), "original").unwrap();
        let content = staging.path().join("content");
        let backups = staging.path().join("backup");
        fs::create_dir(&content).unwrap();
        fs::create_dir(&backups).unwrap();
        fs::write(content.join("README.md"), "new").unwrap();
        fs::write(content.join("added.txt"), "added").unwrap();

        let mut journal = Journal::new(backups);
        journal.merge_dir(&content, dest.path()).unwrap();
        assert_eq!(journal.len(), 2);
        journal.rollback();

        assert_eq!(dir_entries(dest.path()), vec!["README.md"]);
        assert_eq!(
            fs::read_to_string(dest.path().join("README.md")).unwrap(),
            "original"
        );
    }

    /// # Test: Missing Destination
    ///
    /// Verifies that the destination must already exist.
    ///
    /// ## Test Scenario
    /// - Extract into a path that does not exist
    ///
    /// ## Expected Outcome
    /// - Validation error, and the path is not created
    #[test]
    fn test_missing_destination_is_rejected() {
        let parent = TempDir::new().unwrap();
        let missing = parent.path().join("nope");
        let archive = build_archive(&[("a.txt", "a")]);

        let result = extract_zip_into(&archive, &missing);

        assert!(matches!(result, Err(VcsError::Validation { .. })));
        assert!(!missing.exists());
    }
}
