//! Duplicate detection for dupsweep.
//!
//! Works on the [`FileCatalog`](dupsweep_core::FileCatalog) produced by a
//! scan and never walks the file system itself.
//!
//! - **Duplicate detection**: size, partial hash, BLAKE3 full hash, then a
//!   byte comparison; hard links are never reported as duplicates
//! - **Density**: how many duplicates sit under each top-level subdirectory
//!
//! # Example
//!
//! ```rust,no_run
//! use dupsweep_analyze::DuplicateFinder;
//! use dupsweep_scan::{ScanConfig, TreeScanner};
//!
//! let session = TreeScanner::new().scan(&ScanConfig::new("/path")).unwrap();
//! let report = DuplicateFinder::new().find_duplicates(&session.catalog);
//!
//! for group in &report.groups {
//!     println!("keep {}", group.canonical().path.display());
//!     for extra in group.redundant() {
//!         println!("  dup {}", extra.path.display());
//!     }
//! }
//! ```

mod density;
mod duplicates;

pub use density::{DirectoryDensity, duplicate_density};
pub use duplicates::{
    DuplicateConfig, DuplicateConfigBuilder, DuplicateFinder, DuplicateGroup, DuplicateReport,
    files_identical,
};
