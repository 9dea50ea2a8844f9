//! Result of one scan session and its statistics.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::catalog::FileCatalog;
use crate::config::ScanConfig;
use crate::error::{ScanWarning, WarningKind};
use crate::registry::TypeRegistry;

/// Counters gathered while walking a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Regular files catalogued.
    pub total_files: u64,
    /// Sum of catalogued file sizes.
    pub total_size: u64,
    /// Directories listed, including the root.
    pub total_dirs: u64,
    /// Symbolic links met and left unfollowed.
    pub symlinks_skipped: u64,
    /// Paths whose inode had already been seen under another path.
    pub hardlinked_paths: u64,
}

impl ScanStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add another set of counters to this one.
    pub fn absorb(&mut self, other: &ScanStats) {
        self.total_files += other.total_files;
        self.total_size += other.total_size;
        self.total_dirs += other.total_dirs;
        self.symlinks_skipped += other.symlinks_skipped;
        self.hardlinked_paths += other.hardlinked_paths;
    }
}

/// Everything one traversal produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSession {
    /// Canonical root that was scanned.
    pub root: PathBuf,

    /// Every regular file found, sorted by path.
    pub catalog: FileCatalog,

    /// Per-extension counts in first-seen order.
    pub registry: TypeRegistry,

    /// Scan configuration used.
    pub config: ScanConfig,

    /// Summary statistics.
    pub stats: ScanStats,

    /// When this scan was performed.
    pub scanned_at: SystemTime,

    /// Duration of the scan.
    pub scan_duration: Duration,

    /// Warnings encountered during the scan, sorted by path.
    pub warnings: Vec<ScanWarning>,
}

impl ScanSession {
    /// Number of regular files found.
    pub fn total_files(&self) -> u64 {
        self.catalog.len() as u64
    }

    /// Warnings of one kind.
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &ScanWarning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}
