//! Scan configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for scanning operations.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Number of threads for scanning (0 = rayon default pool, 1 = serial).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Glob patterns matched against entry names; matches are skipped and
    /// matching directories are not descended into.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Compute content digests during the walk.
    #[builder(default = "false")]
    #[serde(default)]
    pub compute_hashes: bool,

    /// Minimum file size to hash during the walk.
    #[builder(default = "4096")]
    #[serde(default = "default_min_hash_size")]
    pub min_hash_size: u64,
}

fn default_true() -> bool {
    true
}

fn default_min_hash_size() -> u64 {
    4096
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            threads: 0,
            include_hidden: true,
            ignore_patterns: Vec::new(),
            compute_hashes: false,
            min_hash_size: 4096,
        }
    }

    /// Check if hidden files should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }

    /// Check if a file of `size` bytes should be hashed during the walk.
    pub fn should_hash(&self, size: u64) -> bool {
        self.compute_hashes && size >= self.min_hash_size
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
