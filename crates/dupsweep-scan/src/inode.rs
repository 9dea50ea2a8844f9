//! Concurrent tracking of file identities seen during a walk.

use dashmap::DashSet;
use dupsweep_core::FileIdentity;

/// Records every `(device, inode)` pair the walk has catalogued.
///
/// Workers on different directories share one tracker; a second path
/// resolving to an already tracked identity is a hard link.
#[derive(Debug, Default)]
pub struct InodeTracker {
    seen: DashSet<FileIdentity>,
}

impl InodeTracker {
    /// Create a new inode tracker.
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Track an identity. Returns `true` if this is the first time seeing it.
    pub fn track(&self, identity: FileIdentity) -> bool {
        self.seen.insert(identity)
    }

    /// Get the number of unique identities tracked.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if no identities have been tracked.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
