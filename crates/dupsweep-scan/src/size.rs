//! Subtree size accounting.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use dupsweep_core::{ScanConfig, ScanError};

use crate::walker::{IgnoreMatcher, open_root, walk_dir};

/// Sums the apparent size of every regular file under a root.
///
/// Uses the scanner's walk rules (symlinks are not followed, unstattable
/// entries are skipped, hidden and ignore filters apply) so that the total
/// matches what the catalog saw.
#[derive(Debug, Clone)]
pub struct DirectorySizer {
    config: ScanConfig,
}

impl DirectorySizer {
    /// Create a sizer that walks with the given configuration.
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Total size in bytes of the configured root.
    pub fn total_size(&self) -> Result<u64, ScanError> {
        let root = open_root(&self.config.root)?;
        let matcher = IgnoreMatcher::new(&self.config.ignore_patterns)?;
        let total = Arc::new(AtomicU64::new(0));

        let walker = walk_dir(&root, &self.config)?.process_read_dir({
            let total = Arc::clone(&total);
            move |depth, _dir, _state, children| {
                if depth.is_none() {
                    return;
                }

                children.retain(|child| match child {
                    Ok(entry) => !matcher.is_ignored(entry.file_name()),
                    Err(_) => true,
                });

                let mut dir_bytes = 0;
                for entry in children.iter().flatten() {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    match entry.metadata() {
                        Ok(metadata) => dir_bytes += metadata.len(),
                        Err(err) => debug!(path = %entry.path().display(), %err, "skipping unstattable entry"),
                    }
                }
                total.fetch_add(dir_bytes, Ordering::Relaxed);
            }
        });

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if let Some(err) = entry.read_children_error.as_ref() {
                        warn!(path = %entry.path().display(), %err, "directory unreadable while sizing");
                    }
                }
                Err(err) => warn!(%err, "directory unreadable while sizing"),
            }
        }

        let bytes = total.load(Ordering::Relaxed);
        debug!(root = %root.display(), bytes, "computed directory size");
        Ok(bytes)
    }

    /// Total size in whole kibibytes, rounded down.
    pub fn total_kib(&self) -> Result<u64, ScanError> {
        Ok(self.total_size()? / 1024)
    }
}
