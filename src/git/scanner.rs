use crate::error::GitSourceError;
use crate::git::options::ScanOptions;
use crate::git::provider::HistoryProvider;
use crate::progress::ScanReporter;
use crate::types::{Chunk, GitMetadata, SourceType};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

/// Turns repository history and working tree state into chunks
///
/// All scan methods block: they walk history synchronously and push chunks with
/// `blocking_send`, so async callers run them under `spawn_blocking`.
pub struct GitScanner {
    source_name: String,
    source_id: i64,
    source_type: SourceType,
    verify: bool,
    pub(crate) reporter: Arc<dyn ScanReporter>,
}

impl GitScanner {
    pub fn new(
        source_name: impl Into<String>,
        source_id: i64,
        verify: bool,
        reporter: Arc<dyn ScanReporter>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            source_id,
            source_type: SourceType::Git,
            verify,
            reporter,
        }
    }

    /// Scan committed history, then the working tree
    ///
    /// A history failure skips the working tree scan. A working tree failure
    /// caused by a dangling reference is reported as a known issue and still
    /// returned as a failure.
    pub fn scan_repo<P>(
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
        let start = Instant::now();
        let label = repo_path.display().to_string();

        self.scan_commits(repo, repo_path, options, tx, cancel)?;

        if let Err(err) = self.scan_unstaged(repo, options, tx, cancel) {
            if err.is_known_upstream_defect() {
                self.reporter.known_issue(&label, &err);
                return Err(GitSourceError::KnownUpstreamDefect(err.to_string()));
            }
            return Err(err);
        }

        self.reporter.scan_finished(&label, start.elapsed());
        Ok(())
    }

    pub(crate) fn chunk(&self, data: Vec<u8>, metadata: GitMetadata) -> Chunk {
        Chunk {
            source_name: self.source_name.clone(),
            source_id: self.source_id,
            source_type: self.source_type,
            data,
            metadata,
            verify: self.verify,
        }
    }

    /// Push a chunk, waiting while the consumer catches up
    pub(crate) fn send(&self, tx: &Sender<Chunk>, chunk: Chunk) -> Result<(), GitSourceError> {
        tx.blocking_send(chunk)
            .map_err(|_| GitSourceError::SinkClosed)
    }
}
