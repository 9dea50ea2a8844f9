//! Removal error types.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why one duplicate could not be removed.
#[derive(Debug, Error)]
pub enum RemovalError {
    /// File was not found (may have been deleted or moved since the scan).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to remove.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File changed size or type since it was catalogued.
    #[error("file modified since scan: {0}")]
    Modified(PathBuf),

    /// The copy that should survive is gone or changed, so nothing in its
    /// group is removed.
    #[error("canonical copy {canonical} is missing or changed; kept {path}")]
    CanonicalMissing { path: PathBuf, canonical: PathBuf },

    /// Any other I/O failure.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RemovalError {
    /// Classify an I/O error met while checking or removing `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }

    /// The file that was not removed.
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Modified(p) => p,
            Self::CanonicalMissing { path, .. } | Self::Io { path, .. } => path,
        }
    }

    /// Short machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::PermissionDenied(_) => "permission_denied",
            Self::Modified(_) => "modified",
            Self::CanonicalMissing { .. } => "canonical_missing",
            Self::Io { .. } => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_maps_kinds() {
        let err = RemovalError::from_io("/x", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, RemovalError::NotFound(_)));

        let err = RemovalError::from_io("/x", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.kind(), "permission_denied");

        let err = RemovalError::from_io("/x", io::Error::other("disk on fire"));
        assert!(matches!(err, RemovalError::Io { .. }));
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_path_of_canonical_missing_is_the_kept_file() {
        let err = RemovalError::CanonicalMissing {
            path: PathBuf::from("/r/b"),
            canonical: PathBuf::from("/r/a"),
        };
        assert_eq!(err.path(), Path::new("/r/b"));
    }
}
