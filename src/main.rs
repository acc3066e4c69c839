use anyhow::{Context, Result};
use clap::Parser;
use git_chunk_source::config::{Config, Credential};
use git_chunk_source::progress::Progress;
use git_chunk_source::source::GitSource;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

/// Emit added lines and uncommitted files of git repositories as JSON lines
#[derive(Debug, Parser)]
#[command(name = "git-chunk-source", version, long_version = LONG_VERSION)]
struct Args {
    /// Configuration file (defaults to the platform config path)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Remote repository URL to clone and scan (repeatable)
    #[arg(long = "repo")]
    repositories: Vec<String>,

    /// Local repository path or URI to scan (repeatable)
    #[arg(long = "dir")]
    directories: Vec<String>,

    /// Username for cloning remote repositories
    #[arg(long, env = "GIT_CHUNK_SOURCE_USERNAME")]
    username: Option<String>,

    /// Password or token for cloning remote repositories
    #[arg(long, env = "GIT_CHUNK_SOURCE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Maximum commits to walk per repository (0 = unbounded)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Stop before this revision
    #[arg(long)]
    base: Option<String>,

    /// Start walking from this revision instead of HEAD
    #[arg(long)]
    start: Option<String>,

    /// Only scan paths matching this glob (repeatable)
    #[arg(long)]
    include: Vec<String>,

    /// Skip paths matching this glob (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// Maximum repositories scanned at once (0 = number of CPUs)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Ask downstream detectors not to verify findings
    #[arg(long)]
    no_verify: bool,
}

impl Args {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => Config::load_or_default()?,
        };
        config.apply_env_overrides();

        config.connection.repositories.extend(self.repositories.iter().cloned());
        config.connection.directories.extend(self.directories.iter().cloned());

        match (&self.username, &self.token) {
            (Some(username), Some(password)) => {
                config.connection.credential = Some(Credential::BasicAuth {
                    username: username.clone(),
                    password: password.clone(),
                });
            }
            _ if !self.repositories.is_empty() && config.connection.credential.is_none() => {
                config.connection.credential = Some(Credential::Unauthenticated);
            }
            _ => {}
        }

        if let Some(max_depth) = self.max_depth {
            config.scan.max_depth = max_depth;
        }
        if let Some(base) = &self.base {
            config.scan.base_revision = Some(base.clone());
        }
        if let Some(start) = &self.start {
            config.scan.start_revision = Some(start.clone());
        }
        config.scan.include_patterns.extend(self.include.iter().cloned());
        config.scan.exclude_patterns.extend(self.exclude.iter().cloned());
        if let Some(concurrency) = self.concurrency {
            config.source.concurrency = concurrency;
        }
        if self.no_verify {
            config.source.verify = false;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries chunks, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.load_config()?;

    let progress = Arc::new(Progress::new());
    let source = GitSource::from_config(&config, progress)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping scan");
                cancel.cancel();
            }
        });
    }

    let (tx, mut rx) = tokio::sync::mpsc::channel(config.source.channel_capacity);
    let writer = tokio::spawn(async move {
        let mut out = std::io::BufWriter::new(std::io::stdout());
        let mut count = 0usize;
        while let Some(chunk) = rx.recv().await {
            serde_json::to_writer(&mut out, &chunk)?;
            out.write_all(b"\n")?;
            count += 1;
        }
        out.flush()?;
        Ok::<usize, anyhow::Error>(count)
    });

    let result = source.chunks(tx, cancel).await;
    let count = writer.await??;
    tracing::info!("Emitted {} chunks", count);

    result?;
    Ok(())
}
