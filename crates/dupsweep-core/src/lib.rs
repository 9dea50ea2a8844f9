//! Core types for dupsweep.
//!
//! This crate provides the data structures shared by the scanner, the
//! duplicate finder and the remover: file records and their catalog, the
//! per-extension registry, scan configuration and the error taxonomy.

mod catalog;
mod config;
mod error;
mod record;
mod registry;
mod session;

pub use catalog::FileCatalog;
pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use record::{ContentHash, FileIdentity, FileRecord, extension_of};
pub use registry::{ExtensionTally, TypeRegistry};
pub use session::{ScanSession, ScanStats};
