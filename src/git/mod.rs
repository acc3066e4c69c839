//! Git history and working tree extraction
//!
//! A [`GitScanner`] walks a repository through the [`HistoryProvider`]
//! capability and pushes one [`Chunk`](crate::types::Chunk) per diff fragment
//! with added lines, then one per modified or untracked working tree file.

/// Scan bounds: start and base revisions, depth and path filter
pub mod options;
/// Capability trait over a version-control backend and its record types
pub mod provider;
/// Base and start revision resolution
pub mod refs;
/// libgit2 implementation of the history provider
pub mod repository;
/// Per-repository scan orchestration
pub mod scanner;
/// Remote URL sanitizing and link generation
pub mod url;
/// Commit history walking
pub mod walker;
/// Working tree scanning
pub mod worktree;

#[cfg(test)]
pub(crate) mod test_support;

pub use options::ScanOptions;
pub use provider::{
    CommitIter, CommitRecord, DiffFragment, DiffLine, FileDiff, HistoryProvider, LineOp,
    WorktreeEntry, WorktreeStatus,
};
pub use refs::resolve_base;
pub use repository::Git2Repository;
pub use scanner::GitScanner;
pub use url::{generate_link, sanitize_url};
pub use walker::ORIGIN_REMOTE;
