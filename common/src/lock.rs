// Run lock: at most one pipeline run in flight per process
//
// The schedule can in principle fire while a slow run is still working the
// git workspace. Overlapping runs would race on the same checkout, so a
// trigger that arrives while the lock is held is skipped rather than queued.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::debug;

/// Process-local lock guarding the single shared workspace
#[derive(Clone)]
pub struct RunLock {
    semaphore: Arc<Semaphore>,
}

impl RunLock {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    /// Try to acquire the lock without waiting
    ///
    /// Returns None when a run is already in flight.
    pub fn try_acquire(&self) -> Option<RunGuard> {
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => {
                debug!("Run lock acquired");
                Some(RunGuard {
                    _permit: permit,
                    acquired_at: Instant::now(),
                })
            }
            Err(_) => None,
        }
    }
}

impl Default for RunLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that releases the run lock when dropped
pub struct RunGuard {
    _permit: OwnedSemaphorePermit,
    acquired_at: Instant,
}

impl RunGuard {
    /// Time elapsed since lock acquisition
    pub fn elapsed(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}
