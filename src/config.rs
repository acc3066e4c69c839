/// Configuration system for git-chunk-source
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, GitSourceError};
use crate::filter::PathFilter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Chunk labelling and run-level knobs
    #[serde(default)]
    pub source: SourceConfig,

    /// Repositories and directories to scan
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// History bounds and path filters
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Source labelling and scheduling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Name stamped on every chunk
    #[serde(default = "default_source_name")]
    pub name: String,

    /// Identifier stamped on every chunk
    #[serde(default)]
    pub source_id: i64,

    /// Job the run belongs to (logged only)
    #[serde(default)]
    pub job_id: i64,

    /// Whether downstream detectors should verify findings
    #[serde(default = "default_verify")]
    pub verify: bool,

    /// Maximum repositories scanned at once, 0 = available parallelism
    #[serde(default)]
    pub concurrency: usize,

    /// Parent directory for ephemeral clones (system temp dir when unset)
    #[serde(default)]
    pub clone_root: Option<PathBuf>,

    /// Buffered chunks between scanners and the consumer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// What to scan and how to authenticate
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectionConfig {
    /// Remote repository URLs, cloned before scanning
    #[serde(default)]
    pub repositories: Vec<String>,

    /// Local repository paths or URIs
    #[serde(default)]
    pub directories: Vec<String>,

    /// Credential used for every entry of `repositories`
    #[serde(default)]
    pub credential: Option<Credential>,
}

/// Authentication for remote repositories
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    BasicAuth { username: String, password: String },
    Unauthenticated,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::BasicAuth { username, .. } => f
                .debug_struct("BasicAuth")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credential::Unauthenticated => f.write_str("Unauthenticated"),
        }
    }
}

/// History bounds and path filters applied to every repository
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScanConfig {
    /// Maximum commits visited per repository, 0 = unbounded
    #[serde(default)]
    pub max_depth: usize,

    /// Stop walking before this revision
    #[serde(default)]
    pub base_revision: Option<String>,

    /// Walk from this revision instead of HEAD
    #[serde(default)]
    pub start_revision: Option<String>,

    /// Only scan paths matching one of these globs (all paths when empty)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Never scan paths matching these globs
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

fn default_source_name() -> String {
    "git".to_string()
}

fn default_verify() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: default_source_name(),
            source_id: 0,
            job_id: 0,
            verify: default_verify(),
            concurrency: 0,
            clone_root: None,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, GitSourceError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or create default
    pub fn load_or_default() -> Result<Self, GitSourceError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::info!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), GitSourceError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), GitSourceError> {
        if self.source.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "source.channel_capacity".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        let repositories: Vec<&String> = self
            .connection
            .repositories
            .iter()
            .filter(|repository| !repository.trim().is_empty())
            .collect();

        if !repositories.is_empty() {
            match &self.connection.credential {
                None => {
                    return Err(ConfigError::MissingCredential(
                        "repositories need basic_auth or an explicit unauthenticated credential"
                            .to_string(),
                    )
                    .into());
                }
                Some(Credential::BasicAuth { username, password })
                    if username.is_empty() || password.is_empty() =>
                {
                    return Err(ConfigError::MissingCredential(
                        "basic_auth requires both username and password".to_string(),
                    )
                    .into());
                }
                Some(_) => {}
            }
        }

        for repository in repositories {
            url::Url::parse(repository).map_err(|e| ConfigError::InvalidUrl {
                // Never echo credentials back in errors
                url: crate::git::url::sanitize_url(repository)
                    .unwrap_or_else(|_| "<unparseable>".to_string()),
                reason: e.to_string(),
            })?;
        }

        PathFilter::new(&self.scan.include_patterns, &self.scan.exclude_patterns)?;

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(name) = std::env::var("GIT_CHUNK_SOURCE_NAME") {
            self.source.name = name;
        }

        if let Ok(verify) = std::env::var("GIT_CHUNK_SOURCE_VERIFY")
            && let Ok(verify) = verify.parse()
        {
            self.source.verify = verify;
        }

        if let Ok(concurrency) = std::env::var("GIT_CHUNK_SOURCE_CONCURRENCY")
            && let Ok(concurrency) = concurrency.parse()
        {
            self.source.concurrency = concurrency;
        }

        if let Ok(root) = std::env::var("GIT_CHUNK_SOURCE_CLONE_ROOT") {
            self.source.clone_root = Some(PathBuf::from(root));
        }

        if let Ok(depth) = std::env::var("GIT_CHUNK_SOURCE_MAX_DEPTH")
            && let Ok(depth) = depth.parse()
        {
            self.scan.max_depth = depth;
        }

        if let Ok(base) = std::env::var("GIT_CHUNK_SOURCE_BASE_REVISION") {
            self.scan.base_revision = Some(base);
        }

        if let Ok(start) = std::env::var("GIT_CHUNK_SOURCE_START_REVISION") {
            self.scan.start_revision = Some(start);
        }

        // Username and token only take effect together
        if let (Ok(username), Ok(password)) = (
            std::env::var("GIT_CHUNK_SOURCE_USERNAME"),
            std::env::var("GIT_CHUNK_SOURCE_TOKEN"),
        ) {
            self.connection.credential = Some(Credential::BasicAuth { username, password });
        }
    }

    /// Create a new Config with defaults and environment overrides
    pub fn new() -> Result<Self, GitSourceError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Number of configured scan targets; blank entries are not targets
    pub fn target_count(&self) -> usize {
        self.connection
            .repositories
            .iter()
            .chain(&self.connection.directories)
            .filter(|entry| !entry.trim().is_empty())
            .count()
    }
}
