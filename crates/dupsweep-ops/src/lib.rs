//! Duplicate removal for dupsweep.
//!
//! Takes the groups found by `dupsweep-analyze` and deletes every copy but
//! the canonical one. Each file is checked against its catalogue record
//! before it is unlinked; anything that fails a check stays on disk and is
//! reported in the [`RemovalOutcome`].

mod error;
mod remove;

pub use error::RemovalError;
pub use remove::{DuplicateRemover, RemovalFailure, RemovalOutcome, RemoveOptions, RemovedFile};
