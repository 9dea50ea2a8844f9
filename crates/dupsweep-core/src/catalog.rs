//! The catalog of every regular file found by a scan.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::record::FileRecord;

/// Owner of all [`FileRecord`]s discovered during a scan session.
///
/// Records are appended while the walk runs and sorted by path once it
/// finishes, so the final order does not depend on how directories were
/// scheduled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileCatalog {
    records: Vec<FileRecord>,
}

impl FileCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn push(&mut self, record: FileRecord) {
        self.records.push(record);
    }

    /// Move every record of `other` into this catalog.
    pub fn append(&mut self, other: &mut Vec<FileRecord>) {
        self.records.append(other);
    }

    /// Sort records by path.
    pub fn sort_by_path(&mut self) {
        self.records.sort_by(|a, b| a.path.cmp(&b.path));
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the catalog holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, FileRecord> {
        self.records.iter()
    }

    /// All records as a slice.
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Look up a record by its path.
    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.path == path)
    }

    /// Sum of all record sizes.
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }
}

impl<'a> IntoIterator for &'a FileCatalog {
    type Item = &'a FileRecord;
    type IntoIter = std::slice::Iter<'a, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<FileRecord> for FileCatalog {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
