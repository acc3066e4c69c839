//! Narrow capability over a version-control backend
//!
//! The scanner only needs to list commits with their patches, resolve revisions,
//! read a remote URL and inspect the working tree. Anything that can do that
//! (libgit2, a `git` subprocess, an in-memory fixture) can back a scan.

use crate::error::{GitSourceError, RevisionError};
use chrono::{DateTime, FixedOffset};
use std::path::Path;

/// Operation of a single line inside a diff fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOp {
    Add,
    Delete,
    Context,
}

/// A single line of a diff fragment, including its line terminator if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub op: LineOp,
    pub text: Vec<u8>,
}

impl DiffLine {
    pub fn new(op: LineOp, text: impl Into<Vec<u8>>) -> Self {
        Self {
            op,
            text: text.into(),
        }
    }
}

/// A contiguous block of changed lines within one file of one commit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiffFragment {
    /// First line of the fragment in the new version of the file
    pub new_start: i64,
    pub lines: Vec<DiffLine>,
}

/// Changes to one file in one commit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileDiff {
    /// New path of the file; empty when the file was deleted
    pub path: String,
    pub fragments: Vec<DiffFragment>,
}

/// A commit read from history together with its patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub sha: String,
    pub author_email: String,
    pub author_date: DateTime<FixedOffset>,
    pub changed_files: Vec<FileDiff>,
}

/// Working tree status categories relevant to scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorktreeStatus {
    Modified,
    Untracked,
    Deleted,
}

/// A path reported by the working tree status query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeEntry {
    pub path: String,
    pub status: WorktreeStatus,
}

/// Lazy, newest-to-oldest commit sequence
pub type CommitIter<'a> = Box<dyn Iterator<Item = Result<CommitRecord, GitSourceError>> + 'a>;

/// Read access to a repository's history, refs, remotes and working tree
pub trait HistoryProvider {
    /// Open an existing repository in place
    fn open(path: &Path) -> Result<Self, GitSourceError>
    where
        Self: Sized;

    /// Commits reachable from `start` (a resolved sha), or from HEAD when `None`
    fn commits(&self, start: Option<&str>) -> Result<CommitIter<'_>, GitSourceError>;

    /// Resolve a revision string to a commit sha
    fn resolve_revision(&self, revision: &str) -> Result<String, RevisionError>;

    /// Configured URL of the named remote
    fn remote_url(&self, name: &str) -> Result<String, GitSourceError>;

    /// Sha of HEAD; `Ok(None)` when HEAD is unborn or missing
    fn head(&self) -> Result<Option<String>, RevisionError>;

    /// Paths with uncommitted changes
    fn worktree_status(&self) -> Result<Vec<WorktreeEntry>, GitSourceError>;

    /// Current on-disk content of a working tree file
    fn read_worktree_file(&self, path: &str) -> std::io::Result<Vec<u8>>;
}
