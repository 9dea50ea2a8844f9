//! File system traversal for dupsweep.
//!
//! This crate walks a directory tree in parallel using jwalk and produces a
//! [`ScanSession`]: the catalog of every regular file, per-extension counts,
//! statistics and the non-fatal warnings met along the way.
//!
//! - **Parallel traversal** via jwalk/rayon, one unit of work per directory
//! - **Lock-guarded aggregation** of catalog and extension counts
//! - **Symlinks are opaque**: never followed, so link loops cannot trap the walk
//! - **Size accounting** with the same walk rules, for before/after reports
//!
//! # Example
//!
//! ```rust,no_run
//! use dupsweep_scan::{DirectorySizer, ScanConfig, TreeScanner};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let session = TreeScanner::new().scan(&config).unwrap();
//!
//! println!("Total files: {}", session.total_files());
//! for (ext, count) in session.registry.snapshot() {
//!     println!(".{ext}: {count}");
//! }
//!
//! let bytes = DirectorySizer::new(config).total_size().unwrap();
//! println!("Total size: {bytes} bytes");
//! ```

mod inode;
mod progress;
mod scanner;
mod size;
mod walker;

pub use inode::InodeTracker;
pub use progress::ScanProgress;
pub use scanner::TreeScanner;
pub use size::DirectorySizer;

// Re-export core types for convenience
pub use dupsweep_core::{
    FileCatalog, FileRecord, ScanConfig, ScanError, ScanSession, ScanStats, ScanWarning,
    TypeRegistry, WarningKind,
};
