//! First-wins failure capture for one snapshot attempt
//!
//! The monitor is shared between the orchestrating thread, region workers
//! and the timeout guard. Any of them may report a failure; only the first
//! one is kept. Everyone else uses [`ErrorMonitor::check`] as a cooperative
//! cancellation point.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::error::SnapshotFailure;

/// Holds at most one failure and a monotonic aborted flag
#[derive(Debug, Default)]
pub struct ErrorMonitor {
    failure: Mutex<Option<SnapshotFailure>>,
    // Lets check() skip the lock on the hot path
    aborted: AtomicBool,
}

impl ErrorMonitor {
    /// Create an empty monitor
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure if none is stored yet.
    ///
    /// Returns `true` if this failure became the attempt's failure.
    pub fn receive(&self, failure: SnapshotFailure) -> bool {
        let mut slot = self.failure.lock();
        if let Some(existing) = slot.as_ref() {
            debug!(
                target: "tablesnap::snapshot",
                kept = %existing,
                dropped = %failure,
                "Discarding failure, attempt already aborted"
            );
            return false;
        }
        *slot = Some(failure);
        self.aborted.store(true, Ordering::Release);
        true
    }

    /// Return the stored failure, if any
    pub fn check(&self) -> Result<(), SnapshotFailure> {
        if !self.aborted.load(Ordering::Acquire) {
            return Ok(());
        }
        match self.failure.lock().as_ref() {
            Some(f) => Err(f.clone()),
            None => Ok(()),
        }
    }

    /// True once any failure has been received
    pub fn has_failure(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// Clone of the stored failure
    pub fn failure(&self) -> Option<SnapshotFailure> {
        self.failure.lock().clone()
    }
}
