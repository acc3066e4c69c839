use crate::error::{
    AcquisitionError, GitSourceError, RevisionError, TraversalError, WorkingTreeError,
};
use crate::git::provider::{
    CommitIter, CommitRecord, DiffFragment, DiffLine, FileDiff, HistoryProvider, LineOp,
    WorktreeEntry, WorktreeStatus,
};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{
    Delta, DiffLineType, DiffOptions, ErrorCode, Oid, Patch, Repository, Sort, Status,
    StatusOptions,
};
use std::path::{Path, PathBuf};

/// libgit2-backed repository handle
pub struct Git2Repository {
    repo: Repository,
    repo_path: PathBuf,
}

impl Git2Repository {
    /// Get the repository root path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Build a record for one commit; merge commits carry no file diffs
    fn commit_record(&self, commit: &git2::Commit) -> Result<CommitRecord, git2::Error> {
        let author = commit.author();
        let author_email = author.email().unwrap_or("").to_string();
        let author_date = to_datetime(author.when());

        let changed_files = if commit.parent_count() > 1 {
            Vec::new()
        } else {
            self.file_diffs(commit)?
        };

        Ok(CommitRecord {
            sha: commit.id().to_string(),
            author_email,
            author_date,
            changed_files,
        })
    }

    /// Decompose a commit's patch against its first parent into fragments
    fn file_diffs(&self, commit: &git2::Commit) -> Result<Vec<FileDiff>, git2::Error> {
        let tree = commit.tree()?;

        // Root commits diff against the empty tree
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        // Zero context keeps each hunk's new_start on the first changed line
        let mut diff_opts = DiffOptions::new();
        diff_opts
            .context_lines(0)
            .interhunk_lines(0)
            .ignore_whitespace(false);

        let diff =
            self.repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))?;

        let mut files = Vec::with_capacity(diff.deltas().len());
        for idx in 0..diff.deltas().len() {
            let Some(patch) = Patch::from_diff(&diff, idx)? else {
                continue;
            };

            let delta = patch.delta();
            let path = if delta.status() == Delta::Deleted {
                String::new()
            } else {
                delta
                    .new_file()
                    .path()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default()
            };

            let mut fragments = Vec::with_capacity(patch.num_hunks());
            for hunk_idx in 0..patch.num_hunks() {
                let (hunk, line_count) = patch.hunk(hunk_idx)?;
                let mut lines = Vec::with_capacity(line_count);
                for line_idx in 0..line_count {
                    let line = patch.line_in_hunk(hunk_idx, line_idx)?;
                    let op = match line.origin_value() {
                        DiffLineType::Addition => LineOp::Add,
                        DiffLineType::Deletion => LineOp::Delete,
                        _ => LineOp::Context,
                    };
                    lines.push(DiffLine::new(op, line.content()));
                }
                fragments.push(DiffFragment {
                    new_start: i64::from(hunk.new_start()),
                    lines,
                });
            }

            files.push(FileDiff { path, fragments });
        }

        Ok(files)
    }
}

impl HistoryProvider for Git2Repository {
    fn open(path: &Path) -> Result<Self, GitSourceError> {
        let repo = Repository::open(path).map_err(|e| AcquisitionError::OpenFailed {
            path: path.display().to_string(),
            reason: e.message().to_string(),
        })?;

        tracing::info!("Opened git repository at: {}", path.display());

        Ok(Self {
            repo,
            repo_path: path.to_path_buf(),
        })
    }

    fn commits(&self, start: Option<&str>) -> Result<CommitIter<'_>, GitSourceError> {
        let mut revwalk = self.repo.revwalk().map_err(log_unavailable)?;
        revwalk
            .set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
            .map_err(log_unavailable)?;

        match start {
            Some(sha) => {
                let oid = Oid::from_str(sha).map_err(log_unavailable)?;
                revwalk.push(oid).map_err(log_unavailable)?;
            }
            None => match self.repo.head() {
                Ok(_) => revwalk.push_head().map_err(log_unavailable)?,
                Err(e) if is_unborn(&e) => {
                    tracing::debug!(
                        "HEAD is unborn in {}, no history to walk",
                        self.repo_path.display()
                    );
                    return Ok(Box::new(std::iter::empty()));
                }
                Err(e) => return Err(log_unavailable(e)),
            },
        }

        Ok(Box::new(revwalk.map(move |oid| {
            let oid = oid.map_err(log_unavailable)?;
            let commit = self.repo.find_commit(oid).map_err(log_unavailable)?;
            self.commit_record(&commit).map_err(log_unavailable)
        })))
    }

    fn resolve_revision(&self, revision: &str) -> Result<String, RevisionError> {
        match self.repo.revparse_single(revision) {
            Ok(object) => object
                .peel_to_commit()
                .map(|commit| commit.id().to_string())
                .map_err(|e| RevisionError::Failed(e.message().to_string())),
            Err(e) if e.code() == ErrorCode::NotFound => {
                Err(RevisionError::NotFound(revision.to_string()))
            }
            Err(e) => Err(RevisionError::Failed(e.message().to_string())),
        }
    }

    fn remote_url(&self, name: &str) -> Result<String, GitSourceError> {
        let remote = self
            .repo
            .find_remote(name)
            .map_err(|e| TraversalError::RemoteUnavailable {
                remote: name.to_string(),
                reason: e.message().to_string(),
            })?;

        remote.url().map(str::to_string).ok_or_else(|| {
            TraversalError::RemoteUnavailable {
                remote: name.to_string(),
                reason: "remote URL is missing or not valid UTF-8".to_string(),
            }
            .into()
        })
    }

    fn head(&self) -> Result<Option<String>, RevisionError> {
        match self.repo.head() {
            Ok(reference) => Ok(reference.target().map(|oid| oid.to_string())),
            Err(e) if is_unborn(&e) => Ok(None),
            Err(e) => Err(RevisionError::Failed(e.message().to_string())),
        }
    }

    fn worktree_status(&self) -> Result<Vec<WorktreeEntry>, GitSourceError> {
        if self.repo.is_bare() {
            return Err(WorkingTreeError::NoWorkdir.into());
        }

        let mut status_options = StatusOptions::new();
        status_options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut status_options))
            .map_err(|e| WorkingTreeError::StatusFailed(e.message().to_string()))?;

        let mut entries = Vec::with_capacity(statuses.len());
        for entry in statuses.iter() {
            let Some(path) = entry.path() else {
                tracing::debug!("Skipping worktree entry with non UTF-8 path");
                continue;
            };
            if let Some(status) = classify_status(entry.status()) {
                entries.push(WorktreeEntry {
                    path: path.to_string(),
                    status,
                });
            }
        }

        Ok(entries)
    }

    fn read_worktree_file(&self, path: &str) -> std::io::Result<Vec<u8>> {
        let workdir = self.repo.workdir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "repository has no workdir")
        })?;
        std::fs::read(workdir.join(path))
    }
}

fn classify_status(status: Status) -> Option<WorktreeStatus> {
    if status.contains(Status::WT_NEW) {
        Some(WorktreeStatus::Untracked)
    } else if status.intersects(Status::WT_DELETED | Status::INDEX_DELETED) {
        Some(WorktreeStatus::Deleted)
    } else if status.intersects(
        Status::WT_MODIFIED
            | Status::WT_RENAMED
            | Status::WT_TYPECHANGE
            | Status::INDEX_NEW
            | Status::INDEX_MODIFIED
            | Status::INDEX_RENAMED
            | Status::INDEX_TYPECHANGE
            | Status::CONFLICTED,
    ) {
        Some(WorktreeStatus::Modified)
    } else {
        None
    }
}

fn is_unborn(err: &git2::Error) -> bool {
    matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound)
}

fn log_unavailable(err: git2::Error) -> GitSourceError {
    TraversalError::LogUnavailable(err.message().to_string()).into()
}

fn to_datetime(time: git2::Time) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or(Utc.fix());
    DateTime::from_timestamp(time.seconds(), 0)
        .unwrap_or_default()
        .with_timezone(&offset)
}
