//! # git-chunk-source - Git History and Working Tree Extraction for Secret Scanning
//!
//! Walks the commit history of git repositories and turns every added line into
//! provenance-tagged chunks for a downstream secret detector. Uncommitted files
//! in the working tree are emitted whole.
//!
//! ## Overview
//!
//! For each configured repository the source clones it into an ephemeral
//! directory (or opens a local one in place), walks history newest to oldest,
//! then inspects the working tree. Every chunk carries the file, author email,
//! commit sha, timestamp, credential-free remote URL and starting line.
//!
//! ## Architecture
//!
//! ```text
//! GitSource::chunks
//!    │  one task per target, bounded by ConcurrencyLimiter
//!    ▼
//! RepoAcquirer ── CloneExecutor (git clone) / open in place
//!    │
//!    ▼
//! GitScanner::scan_repo
//!    ├─ scan_commits   (HistoryProvider: commits, refs, remote)
//!    └─ scan_unstaged  (HistoryProvider: status, file contents)
//!    │
//!    ▼
//! mpsc::Sender<Chunk>
//! ```
//!
//! ## Modules
//!
//! - [`source`]: multi-repository driver, acquisition and concurrency limit
//! - [`git`]: history walking, working tree scanning, ref resolution, URL sanitizing
//! - [`filter`]: include/exclude glob path filter
//! - [`progress`]: scan event reporting and percent-complete tracking
//! - [`types`]: chunk and provenance metadata
//! - [`config`]: configuration management with environment variable support
//! - [`error`]: error types
//! - [`paths`]: platform config paths
//!
//! ## Usage Example
//!
//! ```no_run
//! use git_chunk_source::config::Config;
//! use git_chunk_source::progress::Progress;
//! use git_chunk_source::source::GitSource;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::default();
//!     config.connection.directories = vec!["/srv/repos/app".to_string()];
//!
//!     let source = GitSource::from_config(&config, Arc::new(Progress::new()))?;
//!     let (tx, mut rx) =
//!         tokio::sync::mpsc::channel::<git_chunk_source::types::Chunk>(config.source.channel_capacity);
//!
//!     let consumer = tokio::spawn(async move {
//!         while let Some(chunk) = rx.recv().await {
//!             println!("{} {}", chunk.metadata.commit, chunk.metadata.file);
//!         }
//!     });
//!
//!     source.chunks(tx, CancellationToken::new()).await?;
//!     consumer.await?;
//!     Ok(())
//! }
//! ```

/// Configuration management with environment variable overrides
pub mod config;

/// Error types and utilities
pub mod error;

/// Include/exclude glob filtering of repository paths
pub mod filter;

/// Git history and working tree extraction
pub mod git;

/// Platform-specific configuration paths
pub mod paths;

/// Scan event reporting and progress tracking
pub mod progress;

/// Repository acquisition and the multi-repository driver
pub mod source;

/// Chunk and provenance metadata types
pub mod types;
