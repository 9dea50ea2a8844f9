//! Removal of redundant duplicate copies.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use dupsweep_analyze::{DuplicateGroup, files_identical};
use dupsweep_core::FileRecord;

use crate::RemovalError;

/// Options for a removal pass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RemoveOptions {
    /// Run every check but leave the files in place.
    pub dry_run: bool,
}

/// A file that was removed (or would be, in a dry run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedFile {
    pub path: PathBuf,
    pub size: u64,
}

/// A file that was kept because a check or the unlink failed.
#[derive(Debug)]
pub struct RemovalFailure {
    pub path: PathBuf,
    pub error: RemovalError,
}

/// What a removal pass did.
#[derive(Debug, Default)]
pub struct RemovalOutcome {
    /// Removed files, in group order then path order.
    pub removed: Vec<RemovedFile>,
    /// Files left in place, with the reason.
    pub failures: Vec<RemovalFailure>,
    /// Sum of the sizes of `removed`.
    pub bytes_freed: u64,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl RemovalOutcome {
    /// Number of files removed.
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// Check if every attempted removal succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Deletes every non-canonical member of each duplicate group.
///
/// The canonical member is never touched. Failures are collected per path and
/// never stop the pass.
#[derive(Debug, Clone, Default)]
pub struct DuplicateRemover {
    options: RemoveOptions,
}

impl DuplicateRemover {
    /// Create a remover that deletes for real.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a remover with the given options.
    pub fn with_options(options: RemoveOptions) -> Self {
        Self { options }
    }

    /// Remove the redundant members of `groups`.
    pub fn remove_duplicates(&self, groups: &[DuplicateGroup<'_>]) -> RemovalOutcome {
        let mut outcome = RemovalOutcome {
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        for group in groups.iter().filter(|g| g.count() > 1) {
            let canonical = group.canonical();
            if !is_intact(canonical) {
                warn!(
                    canonical = %canonical.path.display(),
                    "canonical copy missing or changed, keeping its group"
                );
                for member in group.redundant() {
                    outcome.failures.push(RemovalFailure {
                        path: member.path.clone(),
                        error: RemovalError::CanonicalMissing {
                            path: member.path.clone(),
                            canonical: canonical.path.clone(),
                        },
                    });
                }
                continue;
            }

            for member in group.redundant() {
                match self.remove_member(member, canonical) {
                    Ok(size) => {
                        debug!(path = %member.path.display(), size, dry_run = self.options.dry_run, "removed duplicate");
                        outcome.bytes_freed += size;
                        outcome.removed.push(RemovedFile {
                            path: member.path.clone(),
                            size,
                        });
                    }
                    Err(error) => {
                        warn!(path = %member.path.display(), %error, "duplicate not removed");
                        outcome.failures.push(RemovalFailure {
                            path: member.path.clone(),
                            error,
                        });
                    }
                }
            }
        }

        info!(
            removed = outcome.removed.len(),
            failed = outcome.failures.len(),
            bytes_freed = outcome.bytes_freed,
            dry_run = self.options.dry_run,
            "removal finished"
        );
        outcome
    }

    /// Verify one member against its record and the canonical copy, then
    /// unlink it.
    ///
    /// Contents are compared again right before the unlink, so a canonical
    /// copy rewritten since detection never loses its last duplicate.
    fn remove_member(
        &self,
        member: &FileRecord,
        canonical: &FileRecord,
    ) -> Result<u64, RemovalError> {
        let metadata = fs::symlink_metadata(&member.path)
            .map_err(|e| RemovalError::from_io(&member.path, e))?;
        if !member.matches(&metadata) {
            return Err(RemovalError::Modified(member.path.clone()));
        }

        let identical = files_identical(&canonical.path, &member.path)
            .map_err(|e| RemovalError::from_io(&member.path, e))?;
        if !identical {
            return Err(RemovalError::Modified(member.path.clone()));
        }

        if !self.options.dry_run {
            fs::remove_file(&member.path).map_err(|e| RemovalError::from_io(&member.path, e))?;
        }
        Ok(member.size)
    }
}

/// The record still describes the file on disk.
fn is_intact(record: &FileRecord) -> bool {
    fs::symlink_metadata(&record.path)
        .map(|m| record.matches(&m))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(temp: &TempDir, name: &str, content: &str) -> FileRecord {
        let path = temp.path().join(name);
        fs::write(&path, content).unwrap();
        FileRecord::from_metadata(&path, &fs::metadata(&path).unwrap())
    }

    #[test]
    fn test_remove_member_checks_size() {
        let temp = TempDir::new().unwrap();
        let keep = record(&temp, "keep", "four");
        let mut rec = record(&temp, "f", "four");
        rec.size = 5;

        let err = DuplicateRemover::new().remove_member(&rec, &keep).unwrap_err();
        assert!(matches!(err, RemovalError::Modified(_)));
        assert!(rec.path.exists());
    }

    #[test]
    fn test_remove_member_missing_file() {
        let temp = TempDir::new().unwrap();
        let keep = record(&temp, "keep", "abc");
        let rec = FileRecord::new(temp.path().join("gone"), 3, None);

        let err = DuplicateRemover::new().remove_member(&rec, &keep).unwrap_err();
        assert!(matches!(err, RemovalError::NotFound(_)));
    }

    #[test]
    fn test_remove_member_compares_contents_with_canonical() {
        let temp = TempDir::new().unwrap();
        let keep = record(&temp, "keep", "same");
        // Same size, no recorded mtime: only the byte comparison can tell.
        fs::write(temp.path().join("f"), "SAME").unwrap();
        let rec = FileRecord::new(temp.path().join("f"), 4, None);

        let err = DuplicateRemover::new().remove_member(&rec, &keep).unwrap_err();
        assert!(matches!(err, RemovalError::Modified(_)));
        assert!(rec.path.exists());
    }

    #[test]
    fn test_dry_run_keeps_file() {
        let temp = TempDir::new().unwrap();
        let keep = record(&temp, "keep", "data");
        let rec = record(&temp, "f", "data");

        let remover = DuplicateRemover::with_options(RemoveOptions { dry_run: true });
        assert_eq!(remover.remove_member(&rec, &keep).unwrap(), 4);
        assert!(rec.path.exists());
    }

    #[test]
    fn test_is_intact() {
        let temp = TempDir::new().unwrap();
        let rec = record(&temp, "f", "abc");
        assert!(is_intact(&rec));

        fs::write(&rec.path, "abcd").unwrap();
        assert!(!is_intact(&rec));

        fs::remove_file(&rec.path).unwrap();
        assert!(!is_intact(&rec));
    }
}
