use crate::config::ScanConfig;
use crate::error::ConfigError;
use crate::filter::PathFilter;

/// Bounds for a single repository scan
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Revision to start walking from (defaults to HEAD)
    pub start_revision: Option<String>,
    /// Stop before this revision; it contributes no chunks
    pub base_revision: Option<String>,
    /// Maximum commits to visit, 0 = unbounded
    pub max_depth: usize,
    pub filter: PathFilter,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_revision(mut self, revision: impl Into<String>) -> Self {
        self.start_revision = Some(revision.into());
        self
    }

    pub fn with_base_revision(mut self, revision: impl Into<String>) -> Self {
        self.base_revision = Some(revision.into());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Build options from the `[scan]` configuration section
    pub fn from_config(scan: &ScanConfig) -> Result<Self, ConfigError> {
        let filter = PathFilter::new(&scan.include_patterns, &scan.exclude_patterns)?;
        Ok(Self {
            start_revision: non_empty(&scan.start_revision),
            base_revision: non_empty(&scan.base_revision),
            max_depth: scan.max_depth,
            filter,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
