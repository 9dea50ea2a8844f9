//! Walk setup shared by the scanner and the sizer.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};
use jwalk::{Parallelism, WalkDir};

use dupsweep_core::{ScanConfig, ScanError};

/// Pick the jwalk scheduling mode for a thread count.
///
/// `0` uses rayon's global pool, `1` walks on the calling thread and any
/// larger value gets a dedicated pool of that size.
pub(crate) fn parallelism(threads: usize) -> Result<Parallelism, ScanError> {
    match threads {
        0 => Ok(Parallelism::RayonDefaultPool {
            busy_timeout: Duration::from_millis(100),
        }),
        1 => Ok(Parallelism::Serial),
        n => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .thread_name(|i| format!("dupsweep-walk-{i}"))
                .build()
                .map_err(|e| ScanError::resource("scan thread pool", e))?;
            Ok(Parallelism::RayonExistingPool {
                pool: Arc::new(pool),
                busy_timeout: None,
            })
        }
    }
}

/// Base walker: no symlink following, hidden handling from the config.
pub(crate) fn walk_dir(root: &Path, config: &ScanConfig) -> Result<WalkDir, ScanError> {
    Ok(WalkDir::new(root)
        .parallelism(parallelism(config.threads)?)
        .skip_hidden(!config.include_hidden)
        .follow_links(false)
        .sort(true))
}

/// Resolve and check the root of a walk.
///
/// The root must be a directory that can be listed; anything else fails the
/// whole operation.
pub(crate) fn open_root(root: &Path) -> Result<std::path::PathBuf, ScanError> {
    let root_path = root
        .canonicalize()
        .map_err(|e| ScanError::unreadable(root, e))?;

    if !root_path.is_dir() {
        return Err(ScanError::NotADirectory { path: root_path });
    }

    std::fs::read_dir(&root_path).map_err(|e| ScanError::unreadable(&root_path, e))?;
    Ok(root_path)
}

/// Glob matcher for entry names that must be skipped.
#[derive(Debug, Clone, Default)]
pub(crate) struct IgnoreMatcher {
    set: Option<GlobSet>,
}

impl IgnoreMatcher {
    pub fn new(patterns: &[String]) -> Result<Self, ScanError> {
        if patterns.is_empty() {
            return Ok(Self::default());
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
                message: format!("invalid ignore pattern {pattern:?}: {e}"),
            })?;
            builder.add(glob);
        }

        let set = builder.build().map_err(|e| ScanError::InvalidConfig {
            message: format!("invalid ignore patterns: {e}"),
        })?;
        Ok(Self { set: Some(set) })
    }

    pub fn is_ignored(&self, name: &OsStr) -> bool {
        self.set.as_ref().is_some_and(|set| set.is_match(name))
    }
}

/// Lock a mutex, recovering the data if a worker panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
