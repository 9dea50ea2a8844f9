//! Error types for scanning operations.

use std::fmt::Display;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A directory could not be opened or listed.
    #[error("Directory unreadable: {path}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A runtime resource (thread pool, channel) could not be created.
    #[error("Failed to allocate {resource}: {message}")]
    ResourceAllocation { resource: String, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Classify an error raised while opening a directory.
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::DirectoryUnreadable { path, source },
        }
    }

    /// Create a resource allocation error.
    pub fn resource(resource: impl Into<String>, message: impl Display) -> Self {
        Self::ResourceAllocation {
            resource: resource.into(),
            message: message.to_string(),
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A directory below the root could not be listed; its subtree was skipped.
    DirectoryUnreadable,
    /// Metadata for one entry could not be read; the entry was skipped.
    StatFailed,
    /// File contents could not be read for hashing or comparison.
    ReadError,
}

/// Non-fatal warning encountered during a scan or analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a directory unreadable warning.
    pub fn directory_unreadable(path: impl Into<PathBuf>, error: impl Display) -> Self {
        Self::new(
            path,
            format!("Directory unreadable: {error}"),
            WarningKind::DirectoryUnreadable,
        )
    }

    /// Create a stat failure warning.
    pub fn stat_failed(path: impl Into<PathBuf>, error: impl Display) -> Self {
        Self::new(path, format!("Stat failed: {error}"), WarningKind::StatFailed)
    }

    /// Create a read error warning.
    pub fn read_error(path: impl Into<PathBuf>, error: impl Display) -> Self {
        Self::new(path, format!("Read error: {error}"), WarningKind::ReadError)
    }
}
