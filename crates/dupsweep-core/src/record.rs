//! File records, on-disk identity and content digests.

use std::fs::{File, Metadata};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Files larger than this are hashed through a memory map.
const MMAP_THRESHOLD: u64 = 128 * 1024;

/// BLAKE3 content digest used to pre-filter duplicate candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash an in-memory buffer.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Hash the full contents of a file.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();

        let mut hasher = blake3::Hasher::new();
        if len > MMAP_THRESHOLD {
            hasher.update_mmap_rayon(path)?;
        } else {
            let mut buffer = vec![0u8; 64 * 1024];
            loop {
                let read = file.read(&mut buffer)?;
                if read == 0 {
                    break;
                }
                hasher.update(&buffer[..read]);
            }
        }

        Ok(Self(*hasher.finalize().as_bytes()))
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Stable on-disk identity of a file: device and inode.
///
/// Two paths with the same identity are hard links to one physical file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileIdentity {
    /// Device ID.
    pub device: u64,
    /// Inode number.
    pub inode: u64,
}

impl FileIdentity {
    /// Create a new identity.
    pub fn new(device: u64, inode: u64) -> Self {
        Self { device, inode }
    }

    /// Read the identity from metadata, if the platform exposes one.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self::new(metadata.dev(), metadata.ino()))
    }

    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// A regular file discovered during traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Full path of the file.
    pub path: PathBuf,
    /// Apparent size in bytes.
    pub size: u64,
    /// Device and inode, where available.
    pub identity: Option<FileIdentity>,
    /// Content digest, if it was computed during the scan.
    pub content_digest: Option<ContentHash>,
    /// Extension without the dot, possibly empty.
    pub extension: CompactString,
    /// Modification time at scan, where the platform reports one.
    pub modified: Option<SystemTime>,
}

impl FileRecord {
    /// Create a record for a file; the extension is derived from the file name.
    pub fn new(path: impl Into<PathBuf>, size: u64, identity: Option<FileIdentity>) -> Self {
        let path = path.into();
        let extension = path
            .file_name()
            .map(|name| CompactString::from(extension_of(&name.to_string_lossy())))
            .unwrap_or_default();

        Self {
            path,
            size,
            identity,
            content_digest: None,
            extension,
            modified: None,
        }
    }

    /// Build a record from the metadata returned by a directory walk.
    pub fn from_metadata(path: impl Into<PathBuf>, metadata: &Metadata) -> Self {
        let mut record = Self::new(path, metadata.len(), FileIdentity::from_metadata(metadata));
        record.modified = metadata.modified().ok();
        record
    }

    /// Check that `metadata` still describes the file this record was taken from.
    ///
    /// Compares type, size and, when both are known, modification time.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        if !metadata.is_file() || metadata.len() != self.size {
            return false;
        }
        match self.modified {
            Some(recorded) => metadata.modified().ok() == Some(recorded),
            None => true,
        }
    }

    /// Attach a precomputed content digest.
    pub fn with_digest(mut self, digest: ContentHash) -> Self {
        self.content_digest = Some(digest);
        self
    }
}

/// Extension of a file name: the text after the last `.`.
///
/// Empty when the name has no dot or when its only dot is the leading
/// character of a hidden file.
pub fn extension_of(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &file_name[idx + 1..],
    }
}
