//! Repository acquisition: open local repositories or clone remote ones
//!
//! Clones land in a uniquely named temporary directory owned by the returned
//! [`AcquiredRepository`]; dropping it removes the directory.

use crate::config::Credential;
use crate::error::{AcquisitionError, ConfigError, GitSourceError};
use crate::git::provider::HistoryProvider;
use crate::git::url::sanitize_url;
use async_trait::async_trait;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Prefix of every ephemeral clone directory
pub const CLONE_DIR_PREFIX: &str = "git-chunk-source-";

/// Username and password (or token) for HTTP basic auth
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where a repository comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSpec {
    /// Cloned into an ephemeral directory before scanning
    Remote {
        url: String,
        credential: Option<BasicAuth>,
    },
    /// Opened in place and never deleted
    Local { path: PathBuf },
}

impl RepoSpec {
    /// Remote repository using the configured connection credential
    pub fn remote(url: impl Into<String>, credential: Option<&Credential>) -> Self {
        let credential = match credential {
            Some(Credential::BasicAuth { username, password }) => Some(BasicAuth {
                username: username.clone(),
                password: password.clone(),
            }),
            Some(Credential::Unauthenticated) | None => None,
        };
        RepoSpec::Remote {
            url: url.into(),
            credential,
        }
    }

    /// Interpret a configured directory entry
    ///
    /// `file://` URIs and plain paths are opened in place. `http(s)://` URIs are
    /// cloned, authenticating with any user-info they carry. Other schemes are
    /// rejected.
    pub fn from_directory(entry: &str) -> Result<Self, ConfigError> {
        let parsed = match Url::parse(entry) {
            Ok(parsed) => parsed,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                return Ok(RepoSpec::Local {
                    path: PathBuf::from(entry),
                });
            }
            Err(e) => {
                return Err(ConfigError::InvalidUrl {
                    url: sanitize_url(entry).unwrap_or_else(|_| "<unparseable>".to_string()),
                    reason: e.to_string(),
                });
            }
        };

        match parsed.scheme() {
            "file" => {
                let host = parsed.host_str().unwrap_or_default();
                Ok(RepoSpec::Local {
                    path: PathBuf::from(format!("{}{}", host, parsed.path())),
                })
            }
            "https" | "http" => {
                let credential = if parsed.username().is_empty() {
                    None
                } else {
                    let password = parsed.password().ok_or_else(|| {
                        ConfigError::MissingCredential(format!(
                            "password must be included in Git repo URL when username is provided: {}",
                            sanitize_url(entry).unwrap_or_default()
                        ))
                    })?;
                    Some(BasicAuth {
                        username: parsed.username().to_string(),
                        password: password.to_string(),
                    })
                };

                let mut url = parsed.clone();
                let _ = url.set_password(None);
                let _ = url.set_username("");
                Ok(RepoSpec::Remote {
                    url: url.to_string(),
                    credential,
                })
            }
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Credential-free description for logs and progress
    pub fn label(&self) -> String {
        match self {
            RepoSpec::Remote { url, .. } => {
                sanitize_url(url).unwrap_or_else(|_| "<unparseable url>".to_string())
            }
            RepoSpec::Local { path } => path.display().to_string(),
        }
    }

    /// Clone URL with the credential embedded; only ever held in memory
    fn authenticated_url(&self) -> Result<Url, ConfigError> {
        let RepoSpec::Remote { url, credential } = self else {
            return Err(ConfigError::InvalidValue {
                key: "repository".to_string(),
                reason: "local repositories are not cloned".to_string(),
            });
        };

        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: sanitize_url(url).unwrap_or_else(|_| "<unparseable>".to_string()),
            reason,
        };

        let mut parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
        if let Some(auth) = credential {
            parsed
                .set_username(&auth.username)
                .map_err(|_| invalid("cannot carry a username".to_string()))?;
            parsed
                .set_password(Some(&auth.password))
                .map_err(|_| invalid("cannot carry a password".to_string()))?;
        }
        Ok(parsed)
    }
}

/// Runs a clone of `url` into an existing empty directory
#[async_trait]
pub trait CloneExecutor: Send + Sync {
    /// Fail with [`GitSourceError::GitBinaryMissing`] when cloning is impossible
    async fn check_available(&self) -> Result<(), GitSourceError>;

    async fn clone_into(&self, url: &Url, dest: &Path) -> Result<(), GitSourceError>;
}

/// Clones with the `git` executable found on `$PATH`
#[derive(Debug, Clone)]
pub struct GitCliCloner {
    program: String,
}

impl Default for GitCliCloner {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl GitCliCloner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific executable instead of `git`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl CloneExecutor for GitCliCloner {
    async fn check_available(&self) -> Result<(), GitSourceError> {
        let status = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => GitSourceError::GitBinaryMissing,
                _ => GitSourceError::Io(e),
            })?;

        if !status.success() {
            return Err(GitSourceError::GitBinaryMissing);
        }
        Ok(())
    }

    async fn clone_into(&self, url: &Url, dest: &Path) -> Result<(), GitSourceError> {
        let safe_url = sanitize_url(url.as_str())?;

        let output = Command::new(&self.program)
            .arg("clone")
            .arg(url.as_str())
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => GitSourceError::GitBinaryMissing,
                _ => AcquisitionError::CloneFailed {
                    url: safe_url.clone(),
                    reason: e.to_string(),
                }
                .into(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AcquisitionError::CloneFailed {
                url: safe_url,
                reason: redact(stderr.trim(), url.password()),
            }
            .into());
        }

        tracing::debug!("Cloned {} into {}", safe_url, dest.display());
        Ok(())
    }
}

/// Remove a password from clone output before it is logged or stored
fn redact(text: &str, password: Option<&str>) -> String {
    match password {
        Some(password) if !password.is_empty() => text.replace(password, "***"),
        _ => text.to_string(),
    }
}

/// A repository ready to scan
///
/// `repo` is declared before `ephemeral` so the handle closes before its
/// directory is removed.
pub struct AcquiredRepository<P> {
    pub repo: P,
    pub path: PathBuf,
    ephemeral: Option<TempDir>,
}

impl<P> AcquiredRepository<P> {
    /// Whether the repository lives in a directory removed on drop
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral.is_some()
    }
}

/// Turns [`RepoSpec`]s into opened repositories
pub struct RepoAcquirer<C> {
    cloner: C,
    clone_root: Option<PathBuf>,
}

impl<C: CloneExecutor> RepoAcquirer<C> {
    pub fn new(cloner: C, clone_root: Option<PathBuf>) -> Self {
        Self { cloner, clone_root }
    }

    pub async fn acquire<P>(
        &self,
        spec: &RepoSpec,
        cancel: &CancellationToken,
    ) -> Result<AcquiredRepository<P>, GitSourceError>
    where
        P: HistoryProvider,
    {
        match spec {
            RepoSpec::Local { path } => {
                let repo = P::open(path)?;
                Ok(AcquiredRepository {
                    repo,
                    path: path.clone(),
                    ephemeral: None,
                })
            }
            RepoSpec::Remote { .. } => self.clone_remote(spec, cancel).await,
        }
    }

    async fn clone_remote<P>(
        &self,
        spec: &RepoSpec,
        cancel: &CancellationToken,
    ) -> Result<AcquiredRepository<P>, GitSourceError>
    where
        P: HistoryProvider,
    {
        self.cloner.check_available().await?;
        let url = spec.authenticated_url()?;

        let mut builder = tempfile::Builder::new();
        builder.prefix(CLONE_DIR_PREFIX);
        let dir = match &self.clone_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| AcquisitionError::TempDirFailed(e.to_string()))?;

        tracing::info!("Cloning {} into {}", spec.label(), dir.path().display());

        // Any early return from here drops `dir` and removes it
        tokio::select! {
            _ = cancel.cancelled() => return Err(GitSourceError::Cancelled),
            result = self.cloner.clone_into(&url, dir.path()) => result?,
        }

        let repo = P::open(dir.path())?;
        Ok(AcquiredRepository {
            repo,
            path: dir.path().to_path_buf(),
            ephemeral: Some(dir),
        })
    }
}
