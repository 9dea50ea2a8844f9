//! Per-extension file counts.

use std::path::{Path, PathBuf};

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Count and earliest path for one extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionTally {
    /// Number of files carrying the extension.
    pub count: u64,
    /// Smallest path (component-wise) seen with this extension.
    pub first_seen: PathBuf,
}

/// Maps file extension to the number of files carrying it.
///
/// Keys are matched exactly, so `TXT` and `txt` are distinct. Entries keep
/// insertion order until [`settle`](Self::settle) reorders them by the path
/// each extension was first seen at, which is the order a sorted sequential
/// walk would have discovered them in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeRegistry {
    entries: IndexMap<CompactString, ExtensionTally>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more file with `extension`, found at `seen_at`.
    ///
    /// Returns the new count for the extension.
    pub fn increment(&mut self, extension: &str, seen_at: &Path) -> u64 {
        match self.entries.get_mut(extension) {
            Some(tally) => {
                tally.count += 1;
                if seen_at < tally.first_seen.as_path() {
                    tally.first_seen = seen_at.to_path_buf();
                }
                tally.count
            }
            None => {
                self.entries.insert(
                    CompactString::from(extension),
                    ExtensionTally {
                        count: 1,
                        first_seen: seen_at.to_path_buf(),
                    },
                );
                1
            }
        }
    }

    /// Fold another registry into this one.
    pub fn merge(&mut self, other: TypeRegistry) {
        for (extension, tally) in other.entries {
            match self.entries.get_mut(&extension) {
                Some(existing) => {
                    existing.count += tally.count;
                    if tally.first_seen < existing.first_seen {
                        existing.first_seen = tally.first_seen;
                    }
                }
                None => {
                    self.entries.insert(extension, tally);
                }
            }
        }
    }

    /// Reorder entries by the path each extension was first seen at.
    pub fn settle(&mut self) {
        self.entries
            .sort_by(|_, a, _, b| a.first_seen.cmp(&b.first_seen));
    }

    /// Current count for an extension.
    pub fn get(&self, extension: &str) -> Option<u64> {
        self.entries.get(extension).map(|t| t.count)
    }

    /// `(extension, count)` pairs in enumeration order.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        self.entries
            .iter()
            .map(|(ext, tally)| (ext.to_string(), tally.count))
            .collect()
    }

    /// Iterate over extensions and their tallies.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtensionTally)> {
        self.entries.iter().map(|(ext, tally)| (ext.as_str(), tally))
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.values().map(|t| t.count).sum()
    }

    /// Number of distinct extensions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no extension has been counted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
