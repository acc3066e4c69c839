//! Glob-based path filtering for history and working tree scans

use crate::error::ConfigError;
use globset::{Glob, GlobMatcher};

/// Include/exclude filter applied to repository-relative file paths
///
/// An empty include list admits every path. Exclusions win over inclusions.
///
/// # Examples
///
/// ```
/// use git_chunk_source::filter::PathFilter;
///
/// let filter = PathFilter::new(&["src/**".to_string()], &["**/*.lock".to_string()]).unwrap();
/// assert!(filter.pass("src/main.rs"));
/// assert!(!filter.pass("src/Cargo.lock"));
/// assert!(!filter.pass("docs/readme.md"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<GlobMatcher>,
    exclude: Vec<GlobMatcher>,
}

impl PathFilter {
    /// A filter that passes every path
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Compile include and exclude glob patterns
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        Ok(Self {
            include: compile_patterns(include)?,
            exclude: compile_patterns(exclude)?,
        })
    }

    /// Check whether a path should be scanned
    pub fn pass(&self, path: &str) -> bool {
        if !self.include.is_empty() && !matches_any_matcher(path, &self.include) {
            return false;
        }
        !matches_any_matcher(path, &self.exclude)
    }

    /// True when no patterns were configured
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// Compile glob patterns into matchers, failing on the first invalid pattern
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<GlobMatcher>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Glob::new(pattern)
                .map(|g| g.compile_matcher())
                .map_err(|e| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

/// Check if a path matches any of the precompiled glob matchers
fn matches_any_matcher(path: &str, matchers: &[GlobMatcher]) -> bool {
    matchers.iter().any(|matcher| {
        if matcher.is_match(path) {
            return true;
        }

        let path_no_slash = path.trim_start_matches('/');
        if matcher.is_match(path_no_slash) {
            return true;
        }

        // Let "config/**" match "nested/config/app.yml"
        let path_parts: Vec<&str> = path_no_slash.split('/').collect();
        (1..path_parts.len()).any(|i| matcher.is_match(path_parts[i..].join("/")))
    })
}
