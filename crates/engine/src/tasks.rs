//! In-process registry of snapshot status records

use parking_lot::Mutex;
use std::sync::Arc;

use tablesnap_core::{AttemptContext, SnapshotDescription, TaskStatus};

/// Keeps every status record handed out until it is purged
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Mutex<Vec<Arc<TaskStatus>>>,
}

impl TaskRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and remember a status record
    pub fn create_status(&self, description: impl Into<String>) -> Arc<TaskStatus> {
        let status = Arc::new(TaskStatus::new(description));
        self.tasks.lock().push(Arc::clone(&status));
        status
    }

    /// Context for `snapshot` whose status record is tracked here
    pub fn begin(&self, snapshot: SnapshotDescription) -> AttemptContext {
        let status = self.create_status(format!(
            "Taking {} snapshot on table: {}",
            snapshot.snapshot_type, snapshot.table
        ));
        AttemptContext::with_status(snapshot, status)
    }

    /// All tracked records, oldest first
    pub fn tasks(&self) -> Vec<Arc<TaskStatus>> {
        self.tasks.lock().clone()
    }

    /// Drop completed and aborted records. Returns how many were dropped.
    pub fn purge_finished(&self) -> usize {
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|t| !t.state().is_finished());
        before - tasks.len()
    }

    /// Number of tracked records
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// True if nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}
