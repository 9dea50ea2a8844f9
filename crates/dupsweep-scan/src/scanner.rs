//! JWalk-based parallel traverser that builds the file catalog.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use dupsweep_core::{
    ContentHash, FileCatalog, FileRecord, ScanConfig, ScanError, ScanSession, ScanStats,
    ScanWarning, TypeRegistry,
};

use crate::inode::InodeTracker;
use crate::progress::ScanProgress;
use crate::walker::{IgnoreMatcher, lock, open_root, walk_dir};

/// How many files pass between two progress messages.
const PROGRESS_INTERVAL: u64 = 1000;

/// Parallel scanner that catalogues every regular file under a root.
pub struct TreeScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl TreeScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Walk the configured root and catalogue its regular files.
    ///
    /// Directories are listed concurrently. Each listing is folded into the
    /// shared [`ScanContext`] in one step, so counts never depend on which
    /// worker finished first. Unreadable subdirectories and unstattable
    /// entries become warnings; only a bad root fails the scan.
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanSession, ScanError> {
        let started = Instant::now();
        let root = open_root(&config.root)?;
        let matcher = IgnoreMatcher::new(&config.ignore_patterns)?;

        info!(root = %root.display(), threads = config.threads, "starting scan");

        let context = Arc::new(ScanContext::new(started, self.progress_tx.clone()));
        let walker = walk_dir(&root, config)?.process_read_dir({
            let context = Arc::clone(&context);
            let config = config.clone();
            move |depth, dir, _state, children| {
                // The first read lists the root itself, not its contents.
                if depth.is_none() {
                    return;
                }

                children.retain(|child| match child {
                    Ok(entry) => !matcher.is_ignored(entry.file_name()),
                    Err(_) => true,
                });

                let mut batch = DirectoryBatch::new(dir);
                for child in children.iter() {
                    let Ok(entry) = child else { continue };
                    let file_type = entry.file_type();

                    if file_type.is_symlink() {
                        batch.stats.symlinks_skipped += 1;
                    } else if file_type.is_file() {
                        let path = entry.path();
                        match entry.metadata() {
                            Ok(metadata) => batch.add_file(path, &metadata, &config, &context),
                            Err(err) => batch.warn(ScanWarning::stat_failed(path, err)),
                        }
                    }
                }

                context.absorb(batch);
            }
        });

        // Per-entry work happens in the callback; the iterator only reports
        // directories whose listing failed.
        let mut walk_warnings = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if let Some(err) = entry.read_children_error.as_ref() {
                        walk_warnings.push(ScanWarning::directory_unreadable(entry.path(), err));
                    }
                }
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    walk_warnings.push(ScanWarning::directory_unreadable(path, &err));
                }
            }
        }

        let (mut catalog, mut registry, stats, mut warnings) = context.drain();
        warnings.append(&mut walk_warnings);

        catalog.sort_by_path();
        registry.settle();
        warnings.sort_by(|a, b| a.path.cmp(&b.path));
        warnings.dedup_by(|a, b| a.path == b.path && a.kind == b.kind);

        for warning in &warnings {
            warn!(path = %warning.path.display(), kind = ?warning.kind, "{}", warning.message);
        }

        let scan_duration = started.elapsed();
        info!(
            files = catalog.len(),
            extensions = registry.len(),
            warnings = warnings.len(),
            elapsed_ms = scan_duration.as_millis() as u64,
            "scan finished"
        );

        Ok(ScanSession {
            root,
            catalog,
            registry,
            config: config.clone(),
            stats,
            scanned_at: SystemTime::now(),
            scan_duration,
            warnings,
        })
    }
}

impl Default for TreeScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared aggregation state for one scan.
///
/// Every collection sits behind its own mutex; workers only touch it through
/// [`absorb`](Self::absorb).
struct ScanContext {
    catalog: Mutex<FileCatalog>,
    registry: Mutex<TypeRegistry>,
    stats: Mutex<ScanStats>,
    warnings: Mutex<Vec<ScanWarning>>,
    inodes: InodeTracker,
    files_seen: AtomicU64,
    progress_tx: broadcast::Sender<ScanProgress>,
    started: Instant,
}

impl ScanContext {
    fn new(started: Instant, progress_tx: broadcast::Sender<ScanProgress>) -> Self {
        Self {
            catalog: Mutex::new(FileCatalog::new()),
            registry: Mutex::new(TypeRegistry::new()),
            stats: Mutex::new(ScanStats::new()),
            warnings: Mutex::new(Vec::new()),
            inodes: InodeTracker::new(),
            files_seen: AtomicU64::new(0),
            progress_tx,
            started,
        }
    }

    /// Merge one directory's findings into the shared collections.
    fn absorb(&self, mut batch: DirectoryBatch) {
        let added = batch.records.len() as u64;
        debug!(dir = %batch.dir.display(), files = added, "directory listed");

        lock(&self.catalog).append(&mut batch.records);
        lock(&self.registry).merge(batch.registry);
        let stats = {
            let mut stats = lock(&self.stats);
            stats.absorb(&batch.stats);
            stats.clone()
        };
        lock(&self.warnings).append(&mut batch.warnings);

        let before = self.files_seen.fetch_add(added, Ordering::Relaxed);
        if before / PROGRESS_INTERVAL != (before + added) / PROGRESS_INTERVAL {
            let _ = self.progress_tx.send(ScanProgress {
                files_scanned: stats.total_files,
                dirs_scanned: stats.total_dirs,
                bytes_scanned: stats.total_size,
                current_path: batch.dir,
                elapsed: self.started.elapsed(),
            });
        }
    }

    /// Take the collected results out of the context.
    fn drain(&self) -> (FileCatalog, TypeRegistry, ScanStats, Vec<ScanWarning>) {
        (
            std::mem::take(&mut *lock(&self.catalog)),
            std::mem::take(&mut *lock(&self.registry)),
            std::mem::take(&mut *lock(&self.stats)),
            std::mem::take(&mut *lock(&self.warnings)),
        )
    }
}

/// Findings for a single directory listing, built without any locking.
struct DirectoryBatch {
    dir: PathBuf,
    records: Vec<FileRecord>,
    registry: TypeRegistry,
    stats: ScanStats,
    warnings: Vec<ScanWarning>,
}

impl DirectoryBatch {
    fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            records: Vec::new(),
            registry: TypeRegistry::new(),
            stats: ScanStats {
                total_dirs: 1,
                ..ScanStats::default()
            },
            warnings: Vec::new(),
        }
    }

    fn add_file(
        &mut self,
        path: PathBuf,
        metadata: &std::fs::Metadata,
        config: &ScanConfig,
        context: &ScanContext,
    ) {
        let mut record = FileRecord::from_metadata(path, metadata);

        if let Some(identity) = record.identity {
            if !context.inodes.track(identity) {
                self.stats.hardlinked_paths += 1;
            }
        }

        if config.should_hash(record.size) {
            match ContentHash::of_file(&record.path) {
                Ok(digest) => record = record.with_digest(digest),
                Err(err) => self.warn(ScanWarning::read_error(&record.path, err)),
            }
        }

        self.registry.increment(&record.extension, &record.path);
        self.stats.total_files += 1;
        self.stats.total_size += record.size;
        self.records.push(record);
    }

    fn warn(&mut self, warning: ScanWarning) {
        self.warnings.push(warning);
    }
}
