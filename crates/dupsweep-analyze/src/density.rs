//! Where duplicates live, per immediate subdirectory of the scan root.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

/// Number of duplicate files under one immediate subdirectory of the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryDensity {
    /// The subdirectory, as a full path.
    pub path: PathBuf,
    /// Duplicates found anywhere beneath it.
    pub duplicates: u64,
}

/// Count `paths` per immediate subdirectory of `root`.
///
/// Paths directly inside `root` and paths outside it are not counted.
/// Subdirectories with no duplicates are omitted; the result is ordered by
/// subdirectory name.
pub fn duplicate_density<'p, I>(root: &Path, paths: I) -> Vec<DirectoryDensity>
where
    I: IntoIterator<Item = &'p Path>,
{
    let mut counts: BTreeMap<PathBuf, u64> = BTreeMap::new();

    for path in paths {
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let mut components = relative.components();
        let first = match components.next() {
            Some(Component::Normal(name)) => name,
            _ => continue,
        };
        // A bare file name means the file sits in the root itself.
        if components.next().is_none() {
            continue;
        }
        *counts.entry(root.join(first)).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(path, duplicates)| DirectoryDensity { path, duplicates })
        .collect()
}
