use crate::error::GitSourceError;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting gate bounding how many repositories are scanned at once
///
/// Each scan holds an [`OwnedSemaphorePermit`] for its whole lifetime, so the
/// slot is released on every exit path when the permit drops.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    size: usize,
}

impl ConcurrencyLimiter {
    /// Gate admitting `size` scans, or one per available CPU when `size` is 0
    pub fn new(size: usize) -> Self {
        let size = if size == 0 { Self::default_size() } else { size };
        Self {
            semaphore: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn default_size() -> usize {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots not currently held
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a free slot
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, GitSourceError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| GitSourceError::Cancelled)
    }
}

impl Default for ConcurrencyLimiter {
    fn default() -> Self {
        Self::new(0)
    }
}
