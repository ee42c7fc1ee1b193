//! Per-attempt context handed to every collaborator call

use std::sync::Arc;
use tracing::error;

use crate::error::{Error, Result, SnapshotFailure};
use crate::monitor::ErrorMonitor;
use crate::status::TaskStatus;
use crate::types::SnapshotDescription;

/// Request, failure slot and progress record of one snapshot attempt.
///
/// Cloning shares the same monitor and status.
#[derive(Debug, Clone)]
pub struct AttemptContext {
    snapshot: Arc<SnapshotDescription>,
    monitor: Arc<ErrorMonitor>,
    status: Arc<TaskStatus>,
}

impl AttemptContext {
    /// Fresh context with its own monitor and status record
    pub fn new(snapshot: SnapshotDescription) -> Self {
        let status = Arc::new(TaskStatus::new(format!(
            "Taking {} snapshot on table: {}",
            snapshot.snapshot_type, snapshot.table
        )));
        Self::with_status(snapshot, status)
    }

    /// Context reporting into an existing status record
    pub fn with_status(snapshot: SnapshotDescription, status: Arc<TaskStatus>) -> Self {
        AttemptContext {
            snapshot: Arc::new(snapshot),
            monitor: Arc::new(ErrorMonitor::new()),
            status,
        }
    }

    /// The request being served
    pub fn snapshot(&self) -> &SnapshotDescription {
        &self.snapshot
    }

    /// Shared failure slot
    pub fn monitor(&self) -> &Arc<ErrorMonitor> {
        &self.monitor
    }

    /// Shared progress record
    pub fn status(&self) -> &Arc<TaskStatus> {
        &self.status
    }

    /// Cooperative cancellation point
    pub fn check(&self) -> Result<()> {
        self.monitor.check().map_err(Error::Aborted)
    }

    /// Wrap `err`, offer it to the monitor and return the attempt's failure.
    ///
    /// The returned value is whatever the monitor holds afterwards, which is
    /// an earlier failure if one was already recorded.
    pub fn fail(&self, err: &Error) -> SnapshotFailure {
        let failure = SnapshotFailure::from_error(&self.snapshot, err);
        if self.monitor.receive(failure.clone()) {
            error!(
                target: "tablesnap::snapshot",
                snapshot = %self.snapshot.name,
                kind = %failure.kind(),
                "{}",
                failure
            );
        }
        self.monitor.failure().unwrap_or(failure)
    }

    /// Ask the attempt to stop
    pub fn interrupt(&self, reason: &str) -> bool {
        self.monitor
            .receive(SnapshotFailure::interrupted(&self.snapshot, reason))
    }
}
