//! Progress and scan event reporting
//!
//! Reporters are handed to the scanner and the source explicitly. The default
//! method bodies log through `tracing`, so an implementation only overrides the
//! events it cares about.

use crate::error::GitSourceError;
use std::sync::Mutex;
use std::time::Duration;

/// Why a history walk stopped before the end of the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// `max_depth` commits were visited
    MaxDepth(usize),
    /// The base revision was reached
    BaseRevision(String),
}

/// Receiver of scan lifecycle events
pub trait ScanReporter: Send + Sync {
    /// A repository (1 of `total` configured targets) is about to be scanned
    fn repository_started(&self, index: usize, total: usize, label: &str);

    fn traversal_stopped(&self, repository: &str, reason: &StopReason) {
        match reason {
            StopReason::MaxDepth(depth) => {
                tracing::debug!("reached max depth {} in {}", depth, repository)
            }
            StopReason::BaseRevision(sha) => {
                tracing::debug!("reached base commit {} in {}", sha, repository)
            }
        }
    }

    fn known_issue(&self, repository: &str, error: &GitSourceError) {
        tracing::error!(
            "known issue: probably caused by a dangling reference in {}: {}",
            repository,
            error
        );
    }

    fn scan_finished(&self, repository: &str, elapsed: Duration) {
        tracing::debug!(
            "Scanning complete for {}. Scan time: {:.3}s",
            repository,
            elapsed.as_secs_f64()
        );
    }
}

/// Point-in-time view of a [`Progress`] tracker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    pub sections_completed: usize,
    pub sections_total: usize,
    pub percent_complete: f64,
    pub message: String,
}

/// Percent-complete tracker fed by `repository_started` events
#[derive(Debug, Default)]
pub struct Progress {
    state: Mutex<ProgressSnapshot>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_progress_complete(&self, index: usize, total: usize, message: &str) {
        let percent_complete = if total == 0 {
            100.0
        } else {
            (index as f64 / total as f64) * 100.0
        };

        // A poisoned lock only means another reporter panicked mid-update
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = ProgressSnapshot {
            sections_completed: index,
            sections_total: total,
            percent_complete,
            message: message.to_string(),
        };
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ScanReporter for Progress {
    fn repository_started(&self, index: usize, total: usize, label: &str) {
        self.set_progress_complete(index, total, label);
        tracing::info!("[{}/{}] {}", index + 1, total, label);
    }
}
