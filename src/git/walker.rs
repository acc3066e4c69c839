//! Commit history walking and added-line extraction

use crate::error::{GitSourceError, TraversalError};
use crate::git::options::ScanOptions;
use crate::git::provider::{DiffFragment, HistoryProvider, LineOp};
use crate::git::refs::resolve_base;
use crate::git::scanner::GitScanner;
use crate::git::url::sanitize_url;
use crate::progress::StopReason;
use crate::types::{Chunk, GitMetadata};
use std::path::Path;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

/// Name of the remote whose URL is attached to every chunk
pub const ORIGIN_REMOTE: &str = "origin";

/// Format used for commit and read timestamps in chunk metadata
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

impl GitScanner {
    /// Walk history newest to oldest and emit one chunk per fragment with added lines
    ///
    /// Every visited commit counts toward `max_depth`, including commits whose
    /// files are all filtered out.
    pub fn scan_commits<P>(
        &self,
        repo: &P,
        repo_path: &Path,
        options: &ScanOptions,
        tx: &Sender<Chunk>,
        cancel: &CancellationToken,
    ) -> Result<(), GitSourceError>
    where
        P: HistoryProvider + ?Sized,
    {
        let label = repo_path.display().to_string();

        let start = match options.start_revision.as_deref() {
            Some(revision) => Some(resolve_base(repo, revision)?),
            None => None,
        };
        let base = match options.base_revision.as_deref() {
            Some(revision) => Some(self.resolve_base_hash(repo, &label, revision)?),
            None => None,
        };

        let mut commits = repo.commits(start.as_deref())?;
        let mut safe_repo: Option<String> = None;
        let mut depth = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Err(GitSourceError::Cancelled);
            }
            if options.max_depth > 0 && depth >= options.max_depth {
                self.reporter
                    .traversal_stopped(&label, &StopReason::MaxDepth(depth));
                break;
            }

            let Some(record) = commits.next() else {
                break;
            };
            let record = record?;
            depth += 1;

            if base.as_deref() == Some(record.sha.as_str()) {
                self.reporter
                    .traversal_stopped(&label, &StopReason::BaseRevision(record.sha));
                break;
            }

            let timestamp = record.author_date.format(TIMESTAMP_FORMAT).to_string();

            for file in &record.changed_files {
                if !options.filter.pass(&file.path) {
                    continue;
                }
                if file.path.is_empty() {
                    continue;
                }

                if safe_repo.is_none() {
                    safe_repo = Some(sanitized_origin(repo)?);
                }
                let repository = safe_repo.as_deref().unwrap_or_default();

                for fragment in &file.fragments {
                    let Some(data) = added_lines(fragment) else {
                        continue;
                    };
                    let metadata = GitMetadata::new(
                        file.path.as_str(),
                        record.author_email.as_str(),
                        record.sha.as_str(),
                        timestamp.as_str(),
                        repository,
                        fragment.new_start,
                    );
                    self.send(tx, self.chunk(data, metadata))?;
                }
            }
        }

        Ok(())
    }

    /// Resolve the base revision, comparing literally when no ref matches
    ///
    /// Shallow clones often lack the base ref; the walk then simply never meets it.
    fn resolve_base_hash<P>(
        &self,
        repo: &P,
        label: &str,
        base: &str,
    ) -> Result<String, GitSourceError>
    where
        P: HistoryProvider + ?Sized,
    {
        match resolve_base(repo, base) {
            Ok(sha) => Ok(sha),
            Err(GitSourceError::Traversal(TraversalError::NoBaseRefs(_))) => {
                tracing::warn!(
                    "Base revision {:?} not found in {}, matching commit shas literally",
                    base,
                    label
                );
                Ok(base.to_string())
            }
            Err(e) => Err(e),
        }
    }
}

/// Origin remote URL with credentials removed
pub(crate) fn sanitized_origin<P>(repo: &P) -> Result<String, GitSourceError>
where
    P: HistoryProvider + ?Sized,
{
    let remote = repo.remote_url(ORIGIN_REMOTE)?;
    Ok(sanitize_url(&remote)?)
}

/// Join a fragment's added lines, one per output line; `None` when nothing was added
///
/// Newlines embedded in a line become spaces so each added line stays on one line.
pub(crate) fn added_lines(fragment: &DiffFragment) -> Option<Vec<u8>> {
    let mut data = Vec::new();
    let mut any_added = false;

    for line in fragment.lines.iter().filter(|l| l.op == LineOp::Add) {
        let text = line.text.strip_suffix(b"\n").unwrap_or(&line.text);
        data.extend(text.iter().map(|&b| if b == b'\n' { b' ' } else { b }));
        data.push(b'\n');
        any_added = true;
    }

    any_added.then_some(data)
}
