/// Centralized error types for git-chunk-source using thiserror
///
/// Errors are grouped by the stage that produced them so callers can tell a bad
/// configuration apart from a broken repository or an interrupted run.
use thiserror::Error;

/// Main error type for repository acquisition and scanning
#[derive(Error, Debug)]
pub enum GitSourceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("'git' command not found in $PATH. Make sure git is installed and included in $PATH")]
    GitBinaryMissing,

    #[error("Acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("Traversal error: {0}")]
    Traversal(#[from] TraversalError),

    #[error("Working tree error: {0}")]
    WorkingTree(#[from] WorkingTreeError),

    /// A dangling reference in a malformed repository; logged as a known issue
    /// but still reported as a failed repository scan.
    #[error("Known issue, probably caused by a dangling reference in the repo: {0}")]
    KnownUpstreamDefect(String),

    #[error("Scan was cancelled")]
    Cancelled,

    #[error("Chunk receiver was dropped")]
    SinkClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors related to configuration and repository targets
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Unsupported Git URI: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid path filter pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors related to cloning or opening a repository
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("Failed to create clone directory: {0}")]
    TempDirFailed(String),

    #[error("Failed to clone '{url}': {reason}")]
    CloneFailed { url: String, reason: String },

    #[error("Could not open repo at '{path}': {reason}")]
    OpenFailed { path: String, reason: String },
}

/// Errors that abort a commit history walk
#[derive(Error, Debug)]
pub enum TraversalError {
    #[error("Could not read commit log: {0}")]
    LogUnavailable(String),

    #[error("Error getting repo remote '{remote}': {reason}")]
    RemoteUnavailable { remote: String, reason: String },

    #[error("Repo remote cannot be sanitized as URI: {0}")]
    SanitizeFailed(String),

    #[error("no base refs succeeded for base: {0:?}")]
    NoBaseRefs(String),

    #[error("Failed to resolve revision '{revision}': {reason}")]
    RevisionFailed { revision: String, reason: String },
}

/// Errors raised while scanning uncommitted working tree state
#[derive(Error, Debug)]
pub enum WorkingTreeError {
    #[error("Failed to resolve HEAD: {0}")]
    HeadUnresolvable(String),

    #[error("Repository has no working directory")]
    NoWorkdir,

    #[error("Error obtaining worktree status: {0}")]
    StatusFailed(String),
}

/// Outcome of resolving a single revision string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevisionError {
    #[error("reference not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Failed(String),
}

impl From<anyhow::Error> for GitSourceError {
    fn from(err: anyhow::Error) -> Self {
        GitSourceError::Other(format!("{:#}", err))
    }
}

impl GitSourceError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        GitSourceError::Other(msg.into())
    }

    /// Whether this failure matches the "object not found" defect
    /// raised by dangling references in malformed repositories
    pub fn is_known_upstream_defect(&self) -> bool {
        match self {
            GitSourceError::KnownUpstreamDefect(_) => true,
            other => other.to_string().contains("object not found"),
        }
    }

    /// Whether the whole run must stop instead of moving on to the next repository
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(self, GitSourceError::Cancelled | GitSourceError::SinkClosed)
    }
}
