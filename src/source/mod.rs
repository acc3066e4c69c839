//! Multi-repository driver
//!
//! [`GitSource`] acquires every configured repository or directory, scans it
//! and pushes chunks to a shared channel. Each target runs as its own task
//! behind a [`ConcurrencyLimiter`]; a failing target is logged and the run moves
//! on to the rest.

/// Opening and cloning repositories
pub mod acquire;
/// Bound on concurrent repository scans
pub mod limiter;

pub use acquire::{
    AcquiredRepository, BasicAuth, CLONE_DIR_PREFIX, CloneExecutor, GitCliCloner, RepoAcquirer,
    RepoSpec,
};
pub use limiter::ConcurrencyLimiter;

use crate::config::{Config, Credential};
use crate::error::GitSourceError;
use crate::git::options::ScanOptions;
use crate::git::repository::Git2Repository;
use crate::git::scanner::GitScanner;
use crate::git::url::sanitize_url;
use crate::progress::ScanReporter;
use crate::types::Chunk;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// A configured scan target, interpreted when its turn comes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Entry of `connection.repositories`; always cloned
    Repository(String),
    /// Entry of `connection.directories`; a path or URI
    Directory(String),
}

impl Target {
    fn spec(&self, credential: Option<&Credential>) -> Result<RepoSpec, GitSourceError> {
        match self {
            Target::Repository(url) => Ok(RepoSpec::remote(url.as_str(), credential)),
            Target::Directory(entry) => Ok(RepoSpec::from_directory(entry)?),
        }
    }

    /// Credential-free name used when the target cannot be interpreted
    fn fallback_label(&self) -> String {
        let raw = match self {
            Target::Repository(raw) | Target::Directory(raw) => raw,
        };
        sanitize_url(raw).unwrap_or_else(|_| "<unparseable>".to_string())
    }
}

/// State shared by every per-target task
struct ScanContext<C> {
    scanner: GitScanner,
    acquirer: RepoAcquirer<C>,
    limiter: ConcurrencyLimiter,
    options: ScanOptions,
    credential: Option<Credential>,
    reporter: Arc<dyn ScanReporter>,
}

/// Scans every configured repository into a chunk channel
pub struct GitSource<C = GitCliCloner> {
    name: String,
    job_id: i64,
    targets: Vec<Target>,
    ctx: Arc<ScanContext<C>>,
}

impl GitSource<GitCliCloner> {
    /// Source that clones with the `git` executable
    pub fn from_config(
        config: &Config,
        reporter: Arc<dyn ScanReporter>,
    ) -> Result<Self, GitSourceError> {
        Self::with_cloner(config, GitCliCloner::new(), reporter)
    }
}

impl<C> GitSource<C>
where
    C: CloneExecutor + 'static,
{
    pub fn with_cloner(
        config: &Config,
        cloner: C,
        reporter: Arc<dyn ScanReporter>,
    ) -> Result<Self, GitSourceError> {
        config.validate()?;
        let options = ScanOptions::from_config(&config.scan)?;

        let targets = config
            .connection
            .repositories
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .cloned()
            .map(Target::Repository)
            .chain(
                config
                    .connection
                    .directories
                    .iter()
                    .filter(|entry| !entry.trim().is_empty())
                    .cloned()
                    .map(Target::Directory),
            )
            .collect();

        let scanner = GitScanner::new(
            config.source.name.clone(),
            config.source.source_id,
            config.source.verify,
            reporter.clone(),
        );

        Ok(Self {
            name: config.source.name.clone(),
            job_id: config.source.job_id,
            targets,
            ctx: Arc::new(ScanContext {
                scanner,
                acquirer: RepoAcquirer::new(cloner, config.source.clone_root.clone()),
                limiter: ConcurrencyLimiter::new(config.source.concurrency),
                options,
                credential: config.connection.credential.clone(),
                reporter,
            }),
        })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.ctx.limiter
    }

    /// Scan every target, pushing chunks to `tx`
    ///
    /// Every target is attempted. Returns the first failure in configured
    /// target order. A closed channel or cancellation stops targets that have
    /// not started yet.
    pub async fn chunks(
        &self,
        tx: Sender<Chunk>,
        cancel: CancellationToken,
    ) -> Result<(), GitSourceError> {
        let start = Instant::now();
        let total = self.targets.len();
        let run_cancel = cancel.child_token();

        tracing::info!(
            "Starting source {} (job {}) with {} targets, concurrency {}",
            self.name,
            self.job_id,
            total,
            self.ctx.limiter.size()
        );

        let mut tasks = JoinSet::new();
        for (index, target) in self.targets.iter().cloned().enumerate() {
            let ctx = self.ctx.clone();
            let tx = tx.clone();
            let cancel = run_cancel.clone();
            tasks.spawn(async move {
                let label = target.fallback_label();
                let result = ctx.scan_target(index, total, target, tx, cancel.clone()).await;
                if let Err(e) = &result
                    && e.is_fatal_for_run()
                {
                    cancel.cancel();
                }
                (index, label, result)
            });
        }
        drop(tx);

        let mut failures: Vec<(usize, GitSourceError)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, _, Ok(()))) => {}
                Ok((index, label, Err(e))) => {
                    if !matches!(e, GitSourceError::Cancelled) {
                        tracing::error!("Failed to scan {}: {}", label, e);
                    }
                    failures.push((index, e));
                }
                Err(e) => {
                    tracing::error!("Scan task failed: {}", e);
                    failures.push((usize::MAX, GitSourceError::other(e.to_string())));
                }
            }
        }

        tracing::info!(
            "Source {} finished in {:.3}s with {} failed targets",
            self.name,
            start.elapsed().as_secs_f64(),
            failures.len()
        );

        failures.sort_by_key(|(index, _)| *index);
        match failures.into_iter().next() {
            Some((_, e)) => Err(e),
            None => Ok(()),
        }
    }
}

impl<C> ScanContext<C>
where
    C: CloneExecutor + 'static,
{
    async fn scan_target(
        self: Arc<Self>,
        index: usize,
        total: usize,
        target: Target,
        tx: Sender<Chunk>,
        cancel: CancellationToken,
    ) -> Result<(), GitSourceError> {
        let _permit = self.limiter.acquire().await?;
        if cancel.is_cancelled() {
            return Err(GitSourceError::Cancelled);
        }

        let spec = target.spec(self.credential.as_ref());
        let label = match &spec {
            Ok(spec) => spec.label(),
            Err(_) => target.fallback_label(),
        };
        self.reporter
            .repository_started(index, total, &format!("Repo: {}", label));
        let spec = spec?;

        let acquired: AcquiredRepository<Git2Repository> =
            self.acquirer.acquire(&spec, &cancel).await?;

        // The acquired repository (and any ephemeral clone) drops when the scan ends
        let ctx = self.clone();
        tokio::task::spawn_blocking(move || {
            ctx.scanner
                .scan_repo(&acquired.repo, &acquired.path, &ctx.options, &tx, &cancel)
        })
        .await
        .map_err(|e| GitSourceError::other(format!("scan task failed: {}", e)))?
    }
}
