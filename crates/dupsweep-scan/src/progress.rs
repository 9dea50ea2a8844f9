//! Scan progress snapshots.

use std::path::PathBuf;
use std::time::Duration;

/// Running totals published while a scan is in flight.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    pub files_scanned: u64,
    pub dirs_scanned: u64,
    pub bytes_scanned: u64,
    /// Directory whose listing was merged last.
    pub current_path: PathBuf,
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Files catalogued per second so far.
    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.files_scanned as f64 / secs
        } else {
            0.0
        }
    }
}
