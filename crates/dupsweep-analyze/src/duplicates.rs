//! Duplicate file detection using content hashing.
//!
//! Uses a four-phase algorithm:
//! 1. Group files by size (instant, O(n))
//! 2. Compute partial hash for size-matched files (first + last 4KB)
//! 3. Compute full BLAKE3 hash for partial-hash matches
//! 4. Compare bytes within each full-hash bucket
//!
//! Hard links are collapsed before phase 1: several paths sharing one inode
//! are a single physical file, never a duplicate of each other.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::hash::Hash;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use blake3::Hasher;
use derive_builder::Builder;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use dupsweep_core::{ContentHash, FileCatalog, FileRecord, ScanWarning};

/// Chunk size used when comparing two files byte by byte.
const COMPARE_CHUNK: usize = 64 * 1024;

/// Configuration for duplicate detection.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct DuplicateConfig {
    /// Minimum file size to consider. The default of 1 leaves empty files out.
    #[builder(default = "1")]
    pub min_size: u64,

    /// Maximum file size to consider.
    #[builder(default = "u64::MAX")]
    pub max_size: u64,

    /// Use a partial hash (head + tail) before the full hash.
    #[builder(default = "true")]
    pub quick_compare: bool,

    /// Number of bytes for partial hash from start of file.
    #[builder(default = "4096")]
    pub partial_hash_head: usize,

    /// Number of bytes for partial hash from end of file.
    #[builder(default = "4096")]
    pub partial_hash_tail: usize,

    /// Compare contents byte by byte before trusting a digest match.
    #[builder(default = "true")]
    pub verify_bytes: bool,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: u64::MAX,
            quick_compare: true,
            partial_hash_head: 4096,
            partial_hash_tail: 4096,
            verify_bytes: true,
        }
    }
}

impl DuplicateConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateConfigBuilder {
        DuplicateConfigBuilder::default()
    }
}

/// A set of two or more distinct files with identical contents.
///
/// Members borrow their records from the [`FileCatalog`] and are sorted by
/// path; the first member is the canonical copy that removal keeps.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup<'c> {
    /// Content hash shared by all files in this group.
    pub hash: ContentHash,

    /// Size of each file in bytes.
    pub size: u64,

    /// All members, canonical first.
    pub members: Vec<&'c FileRecord>,

    /// Wasted space: size * (count - 1).
    pub wasted_bytes: u64,
}

impl<'c> DuplicateGroup<'c> {
    fn new(hash: ContentHash, size: u64, mut members: Vec<&'c FileRecord>) -> Self {
        members.sort_by(|a, b| a.path.cmp(&b.path));
        let wasted_bytes = size * (members.len() as u64).saturating_sub(1);
        Self {
            hash,
            size,
            members,
            wasted_bytes,
        }
    }

    /// The member that survives removal.
    pub fn canonical(&self) -> &'c FileRecord {
        self.members[0]
    }

    /// Every member except the canonical one.
    pub fn redundant(&self) -> &[&'c FileRecord] {
        &self.members[1..]
    }

    /// Get the number of duplicate files.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Check if keeping one file, how many could be deleted.
    pub fn deletable_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// Paths of all members, canonical first.
    pub fn paths(&self) -> impl Iterator<Item = &'c Path> + '_ {
        self.members.iter().map(|r| r.path.as_path())
    }
}

/// Results from duplicate analysis.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateReport<'c> {
    /// Groups of duplicate files, by wasted space descending then canonical path.
    pub groups: Vec<DuplicateGroup<'c>>,

    /// Total size of all duplicate files.
    pub total_duplicate_size: u64,

    /// Total wasted space (could be reclaimed).
    pub total_wasted_space: u64,

    /// Number of files analyzed.
    pub files_analyzed: u64,

    /// Number of files that have duplicates.
    pub files_with_duplicates: u64,

    /// Number of unique duplicate groups.
    pub group_count: usize,

    /// Paths left out because they are hard links to an analyzed file.
    pub hardlinks_excluded: u64,

    /// Files that could not be read while hashing or comparing.
    pub warnings: Vec<ScanWarning>,
}

impl<'c> DuplicateReport<'c> {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Every non-canonical member across all groups.
    pub fn redundant_files(&self) -> impl Iterator<Item = &'c FileRecord> + '_ {
        self.groups.iter().flat_map(|g| g.redundant().iter().copied())
    }
}

/// Duplicate file finder.
pub struct DuplicateFinder {
    config: DuplicateConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with default config.
    pub fn new() -> Self {
        Self {
            config: DuplicateConfig::default(),
        }
    }

    /// Create a new duplicate finder with custom config.
    pub fn with_config(config: DuplicateConfig) -> Self {
        Self { config }
    }

    /// Find duplicates among the records of a catalog.
    ///
    /// The result only depends on file contents and paths, never on the
    /// order in which the catalog was filled.
    pub fn find_duplicates<'c>(&self, catalog: &'c FileCatalog) -> DuplicateReport<'c> {
        // Phase 0: one candidate per physical file, within size bounds
        let (candidates, hardlinks_excluded) = self.collect_candidates(catalog);
        let files_analyzed = candidates.len() as u64;

        // Phase 1: Group by size
        let size_groups = group_by_size(candidates);
        debug!(buckets = size_groups.len(), "size buckets with more than one file");

        // Phases 2-4, parallelized across size groups
        let outcomes: Vec<BucketOutcome<'c>> = size_groups
            .into_par_iter()
            .map(|(size, files)| self.resolve_size_group(size, files))
            .collect();

        let mut groups = Vec::new();
        let mut warnings = Vec::new();
        for outcome in outcomes {
            groups.extend(outcome.groups);
            warnings.extend(outcome.warnings);
        }

        groups.sort_by(|a, b| {
            b.wasted_bytes
                .cmp(&a.wasted_bytes)
                .then_with(|| a.canonical().path.cmp(&b.canonical().path))
        });
        warnings.sort_by(|a, b| a.path.cmp(&b.path));
        for warning in &warnings {
            warn!(path = %warning.path.display(), "{}", warning.message);
        }

        let total_duplicate_size: u64 = groups.iter().map(|g| g.size * g.members.len() as u64).sum();
        let total_wasted_space: u64 = groups.iter().map(|g| g.wasted_bytes).sum();
        let files_with_duplicates: u64 = groups.iter().map(|g| g.members.len() as u64).sum();
        let group_count = groups.len();

        info!(
            files_analyzed,
            groups = group_count,
            wasted_bytes = total_wasted_space,
            hardlinks_excluded,
            "duplicate detection finished"
        );

        DuplicateReport {
            groups,
            total_duplicate_size,
            total_wasted_space,
            files_analyzed,
            files_with_duplicates,
            group_count,
            hardlinks_excluded,
            warnings,
        }
    }

    /// Filter by size and keep the first path (by path order) of each inode.
    fn collect_candidates<'c>(&self, catalog: &'c FileCatalog) -> (Vec<&'c FileRecord>, u64) {
        let mut records: Vec<&FileRecord> = catalog
            .iter()
            .filter(|r| r.size >= self.config.min_size && r.size <= self.config.max_size)
            .collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));

        let mut seen = HashSet::new();
        let mut excluded = 0;
        let mut candidates = Vec::with_capacity(records.len());
        for record in records {
            if let Some(identity) = record.identity {
                if !seen.insert(identity) {
                    debug!(path = %record.path.display(), "skipping hard link");
                    excluded += 1;
                    continue;
                }
            }
            candidates.push(record);
        }

        (candidates, excluded)
    }

    /// Resolve one size bucket into confirmed duplicate groups.
    fn resolve_size_group<'c>(&self, size: u64, files: Vec<&'c FileRecord>) -> BucketOutcome<'c> {
        let mut outcome = BucketOutcome::default();

        // Small files are read whole by the partial hash anyway.
        let partial_covers_file =
            size <= (self.config.partial_hash_head + self.config.partial_hash_tail) as u64;
        let use_partial = self.config.quick_compare && !partial_covers_file;
        let partial_groups: Vec<Vec<&FileRecord>> = if use_partial {
            bucket_by(files, |r| self.compute_partial_hash(&r.path), &mut outcome.warnings)
                .into_iter()
                .map(|(_, files)| files)
                .collect()
        } else {
            vec![files]
        };

        for candidates in partial_groups {
            let full_groups = bucket_by(candidates, full_hash, &mut outcome.warnings);

            for (hash, files) in full_groups {
                if self.config.verify_bytes {
                    for class in split_identical(files, &mut outcome.warnings) {
                        if class.len() >= 2 {
                            outcome.groups.push(DuplicateGroup::new(hash, size, class));
                        }
                    }
                } else {
                    outcome.groups.push(DuplicateGroup::new(hash, size, files));
                }
            }
        }

        outcome
    }

    /// Compute a partial hash (first + last N bytes).
    fn compute_partial_hash(&self, path: &Path) -> io::Result<[u8; 32]> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        let mut hasher = Hasher::new();

        // Read from start
        let head_size = (self.config.partial_hash_head as u64).min(file_size);
        let mut head_buf = vec![0u8; head_size as usize];
        file.read_exact(&mut head_buf)?;
        hasher.update(&head_buf);

        // Read from end (if file is large enough)
        if file_size > head_size {
            let tail_size = (self.config.partial_hash_tail as u64).min(file_size - head_size);
            if tail_size > 0 {
                file.seek(SeekFrom::End(-(tail_size as i64)))?;
                let mut tail_buf = vec![0u8; tail_size as usize];
                file.read_exact(&mut tail_buf)?;
                hasher.update(&tail_buf);
            }
        }

        // Include file size in hash to differentiate files with same head/tail
        hasher.update(&file_size.to_le_bytes());

        Ok(*hasher.finalize().as_bytes())
    }
}

impl Default for DuplicateFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Groups and warnings produced by one size bucket.
#[derive(Default)]
struct BucketOutcome<'c> {
    groups: Vec<DuplicateGroup<'c>>,
    warnings: Vec<ScanWarning>,
}

/// Group files by size, dropping sizes held by a single file.
fn group_by_size(files: Vec<&FileRecord>) -> HashMap<u64, Vec<&FileRecord>> {
    let mut groups: HashMap<u64, Vec<&FileRecord>> = HashMap::new();
    for file in files {
        groups.entry(file.size).or_default().push(file);
    }
    groups.retain(|_, v| v.len() > 1);
    groups
}

/// Key files in parallel and keep the keys shared by at least two files.
///
/// Files whose key cannot be computed are reported and dropped.
fn bucket_by<'c, K, F>(
    files: Vec<&'c FileRecord>,
    key: F,
    warnings: &mut Vec<ScanWarning>,
) -> Vec<(K, Vec<&'c FileRecord>)>
where
    K: Hash + Eq + Send,
    F: Fn(&FileRecord) -> io::Result<K> + Sync,
{
    let keyed: Vec<(&FileRecord, io::Result<K>)> =
        files.into_par_iter().map(|f| (f, key(f))).collect();

    let mut buckets: HashMap<K, Vec<&FileRecord>> = HashMap::new();
    for (file, result) in keyed {
        match result {
            Ok(k) => buckets.entry(k).or_default().push(file),
            Err(err) => warnings.push(ScanWarning::read_error(&file.path, err)),
        }
    }

    buckets.into_iter().filter(|(_, v)| v.len() > 1).collect()
}

/// Full digest of a record, reusing one computed during the scan.
fn full_hash(record: &FileRecord) -> io::Result<ContentHash> {
    match record.content_digest {
        Some(digest) => Ok(digest),
        None => ContentHash::of_file(&record.path),
    }
}

/// Partition files with equal digests into classes of byte-identical files.
///
/// A read failure is charged to the file that failed. When that is a class
/// representative, it leaves the class and the next member takes its place.
fn split_identical<'c>(
    mut files: Vec<&'c FileRecord>,
    warnings: &mut Vec<ScanWarning>,
) -> Vec<Vec<&'c FileRecord>> {
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let mut classes: Vec<Vec<&FileRecord>> = Vec::new();
    'files: for file in files {
        let mut i = 0;
        while i < classes.len() {
            let outcome = compare_files(&classes[i][0].path, &file.path)
                .map_err(|(failed, err)| (failed.to_path_buf(), err));
            match outcome {
                Ok(true) => {
                    classes[i].push(file);
                    continue 'files;
                }
                Ok(false) => i += 1,
                Err((failed, err)) if failed == file.path => {
                    warnings.push(ScanWarning::read_error(failed, err));
                    continue 'files;
                }
                Err((failed, err)) => {
                    warnings.push(ScanWarning::read_error(failed, err));
                    classes[i].remove(0);
                    if classes[i].is_empty() {
                        classes.remove(i);
                    }
                }
            }
        }
        classes.push(vec![file]);
    }

    if classes.len() > 1 {
        debug!(classes = classes.len(), "digest collision split by byte comparison");
    }
    classes
}

/// Compare two files byte by byte.
pub fn files_identical(a: &Path, b: &Path) -> io::Result<bool> {
    compare_files(a, b).map_err(|(_, err)| err)
}

/// Byte comparison that reports which of the two paths failed.
fn compare_files<'p>(a: &'p Path, b: &'p Path) -> Result<bool, (&'p Path, io::Error)> {
    let mut left = File::open(a).map_err(|e| (a, e))?;
    let mut right = File::open(b).map_err(|e| (b, e))?;
    let left_len = left.metadata().map_err(|e| (a, e))?.len();
    let right_len = right.metadata().map_err(|e| (b, e))?.len();
    if left_len != right_len {
        return Ok(false);
    }

    let mut left_buf = vec![0u8; COMPARE_CHUNK];
    let mut right_buf = vec![0u8; COMPARE_CHUNK];
    loop {
        let n = read_chunk(&mut left, &mut left_buf).map_err(|e| (a, e))?;
        let m = read_chunk(&mut right, &mut right_buf).map_err(|e| (b, e))?;
        if n != m || left_buf[..n] != right_buf[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as the file allows; returns the number of bytes read.
fn read_chunk(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_files() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::write(root.join("file1.txt"), "duplicate content here").unwrap();
        fs::write(root.join("file2.txt"), "duplicate content here").unwrap();
        fs::write(root.join("file3.txt"), "unique content").unwrap();

        fs::create_dir(root.join("subdir")).unwrap();
        fs::write(root.join("subdir/file4.txt"), "duplicate content here").unwrap();

        temp
    }

    #[test]
    fn test_partial_hash() {
        let temp = create_test_files();
        let finder = DuplicateFinder::new();

        let hash1 = finder.compute_partial_hash(&temp.path().join("file1.txt")).unwrap();
        let hash2 = finder.compute_partial_hash(&temp.path().join("file2.txt")).unwrap();
        let hash3 = finder.compute_partial_hash(&temp.path().join("file3.txt")).unwrap();

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_files_identical() {
        let temp = create_test_files();
        let root = temp.path();

        assert!(files_identical(&root.join("file1.txt"), &root.join("subdir/file4.txt")).unwrap());
        assert!(!files_identical(&root.join("file1.txt"), &root.join("file3.txt")).unwrap());
        assert!(files_identical(&root.join("file1.txt"), &root.join("missing")).is_err());
    }

    #[test]
    fn test_files_identical_across_chunks() {
        let temp = TempDir::new().unwrap();
        let mut a = vec![7u8; COMPARE_CHUNK * 2 + 5];
        fs::write(temp.path().join("a"), &a).unwrap();
        fs::write(temp.path().join("b"), &a).unwrap();
        *a.last_mut().unwrap() = 8;
        fs::write(temp.path().join("c"), &a).unwrap();

        assert!(files_identical(&temp.path().join("a"), &temp.path().join("b")).unwrap());
        assert!(!files_identical(&temp.path().join("a"), &temp.path().join("c")).unwrap());
    }

    #[test]
    fn test_split_identical_separates_colliding_contents() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("a"), "same").unwrap();
        fs::write(root.join("b"), "diff").unwrap();
        fs::write(root.join("c"), "same").unwrap();

        // Pretend all three share a digest.
        let records = [
            FileRecord::new(root.join("a"), 4, None),
            FileRecord::new(root.join("b"), 4, None),
            FileRecord::new(root.join("c"), 4, None),
        ];
        let mut warnings = Vec::new();
        let classes = split_identical(records.iter().collect(), &mut warnings);

        assert!(warnings.is_empty());
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].len(), 2);
        assert_eq!(classes[0][1].path, root.join("c"));
        assert_eq!(classes[1].len(), 1);
    }

    #[test]
    fn test_compare_files_names_the_failing_side() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("present");
        let missing = temp.path().join("missing");
        fs::write(&present, "x").unwrap();

        let (failed, _) = compare_files(&missing, &present).unwrap_err();
        assert_eq!(failed, missing.as_path());
        let (failed, _) = compare_files(&present, &missing).unwrap_err();
        assert_eq!(failed, missing.as_path());
    }

    #[test]
    fn test_unreadable_representative_is_reported_and_replaced() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("b"), "same").unwrap();
        fs::write(root.join("c"), "same").unwrap();

        // "a" sorts first and vanished after hashing.
        let records = [
            FileRecord::new(root.join("a"), 4, None),
            FileRecord::new(root.join("b"), 4, None),
            FileRecord::new(root.join("c"), 4, None),
        ];
        let mut warnings = Vec::new();
        let classes = split_identical(records.iter().collect(), &mut warnings);

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path, root.join("a"));
        assert_eq!(classes.len(), 1);
        let paths: Vec<_> = classes[0].iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, vec![root.join("b"), root.join("c")]);
    }

    #[test]
    fn test_group_canonical_is_first_path() {
        let records = [
            FileRecord::new("/r/z.txt", 2, None),
            FileRecord::new("/r/a.txt", 2, None),
            FileRecord::new("/r/m/x.txt", 2, None),
        ];
        let group = DuplicateGroup::new(ContentHash::new([1; 32]), 2, records.iter().collect());

        assert_eq!(group.canonical().path, PathBuf::from("/r/a.txt"));
        assert_eq!(group.redundant().len(), 2);
        assert_eq!(group.wasted_bytes, 4);
        assert_eq!(group.deletable_count(), 2);
    }
}
