//! Chunk and provenance types emitted to the downstream scanner

use serde::{Serialize, Serializer};

/// Marker used for both the commit and the author of working tree chunks
pub const UNSTAGED: &str = "unstaged";

/// Kind of source that produced a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    Git,
}

/// Provenance of a single chunk inside a git repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitMetadata {
    /// Repository-relative file path
    pub file: String,
    /// Author email, or `"unstaged"` for working tree content
    pub email: String,
    /// Commit sha, or `"unstaged"` for working tree content
    pub commit: String,
    /// Author date of the commit, or the wall-clock time the file was read
    pub timestamp: String,
    /// Origin remote URL with any user-info removed
    pub repository: String,
    /// First line of the fragment in the new file (0 for whole files)
    pub line: i64,
}

impl GitMetadata {
    pub fn new(
        file: impl Into<String>,
        email: impl Into<String>,
        commit: impl Into<String>,
        timestamp: impl Into<String>,
        repository: impl Into<String>,
        line: i64,
    ) -> Self {
        Self {
            file: file.into(),
            email: email.into(),
            commit: commit.into(),
            timestamp: timestamp.into(),
            repository: repository.into(),
            line,
        }
    }

    /// Whether this chunk came from the uncommitted working tree
    pub fn is_unstaged(&self) -> bool {
        self.commit == UNSTAGED
    }

    /// Browsable link to the file at this commit, when the remote is a web host
    pub fn link(&self) -> Option<String> {
        if self.is_unstaged() || !self.repository.starts_with("http") {
            return None;
        }
        Some(crate::git::url::generate_link(
            &self.repository,
            &self.commit,
            &self.file,
        ))
    }
}

/// One unit of extracted content forwarded for secret scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub source_name: String,
    pub source_id: i64,
    pub source_type: SourceType,
    #[serde(serialize_with = "serialize_lossy")]
    pub data: Vec<u8>,
    pub metadata: GitMetadata,
    pub verify: bool,
}

impl Chunk {
    /// Chunk data as text, replacing invalid UTF-8 sequences
    pub fn data_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

fn serialize_lossy<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(data))
}
