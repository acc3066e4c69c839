//! Uncommitted working tree content

use crate::error::{GitSourceError, RevisionError, WorkingTreeError};
use crate::git::options::ScanOptions;
use crate::git::provider::{HistoryProvider, WorktreeStatus};
use crate::git::scanner::GitScanner;
use crate::git::walker::{TIMESTAMP_FORMAT, sanitized_origin};
use crate::types::{Chunk, GitMetadata, UNSTAGED};
use chrono::Utc;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

impl GitScanner {
    /// Emit the full current content of every modified or untracked file
    ///
    /// Runs when HEAD resolves or is unborn. Files that cannot be read are
    /// skipped; they may have been moved or deleted since the status query.
    pub fn scan_unstaged<P>(
        &self,
        repo: &P,
        options: &ScanOptions,
        tx: &Sender<Chunk>,
        cancel: &CancellationToken,
    ) -> Result<(), GitSourceError>
    where
        P: HistoryProvider + ?Sized,
    {
        let safe_repo = sanitized_origin(repo)?;

        match repo.head() {
            Ok(_) => {}
            Err(RevisionError::NotFound(_)) => {}
            Err(RevisionError::Failed(reason)) => {
                return Err(WorkingTreeError::HeadUnresolvable(reason).into());
            }
        }

        let entries = repo.worktree_status().inspect_err(|e| {
            tracing::error!("error obtaining worktree status: {}", e);
        })?;

        for entry in entries {
            if cancel.is_cancelled() {
                return Err(GitSourceError::Cancelled);
            }
            if entry.status == WorktreeStatus::Deleted {
                continue;
            }
            if !options.filter.pass(&entry.path) {
                continue;
            }

            let data = match repo.read_worktree_file(&entry.path) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("skipping unreadable working tree file {}: {}", entry.path, e);
                    continue;
                }
            };

            let metadata = GitMetadata::new(
                entry.path.as_str(),
                UNSTAGED,
                UNSTAGED,
                Utc::now().format(TIMESTAMP_FORMAT).to_string(),
                safe_repo.as_str(),
                0,
            );
            self.send(tx, self.chunk(data, metadata))?;
        }

        Ok(())
    }
}
