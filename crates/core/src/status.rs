//! Human-readable progress record for a snapshot attempt
//!
//! Read by monitoring only; the orchestrator never makes control decisions
//! from it.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;

/// Lifecycle state of a status record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Attempt in progress
    Running,
    /// Attempt finished successfully
    Complete,
    /// Attempt failed; terminal
    Aborted,
}

impl TaskState {
    /// True for `Complete` and `Aborted`
    pub fn is_finished(&self) -> bool {
        !matches!(self, TaskState::Running)
    }
}

/// One entry in the status history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// When the message was recorded
    pub at: DateTime<Utc>,
    /// State after this entry
    pub state: TaskState,
    /// Message text
    pub message: String,
}

#[derive(Debug)]
struct StatusInner {
    state: TaskState,
    history: Vec<StatusEntry>,
}

/// Progress record with a terminal aborted state.
///
/// Once aborted, further `set_status`/`mark_complete` calls are ignored.
#[derive(Debug)]
pub struct TaskStatus {
    description: String,
    started_at: DateTime<Utc>,
    inner: Mutex<StatusInner>,
}

impl TaskStatus {
    /// Create a running record
    pub fn new(description: impl Into<String>) -> Self {
        let started_at = Utc::now();
        TaskStatus {
            description: description.into(),
            started_at,
            inner: Mutex::new(StatusInner {
                state: TaskState::Running,
                history: Vec::new(),
            }),
        }
    }

    /// What this task is
    pub fn description(&self) -> &str {
        &self.description
    }

    /// When the record was created
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Replace the current message. Returns `false` if the record is aborted.
    pub fn set_status(&self, message: impl Into<String>) -> bool {
        self.transition(TaskState::Running, message.into())
    }

    /// Mark the task complete with a final message
    pub fn mark_complete(&self, message: impl Into<String>) -> bool {
        self.transition(TaskState::Complete, message.into())
    }

    /// Abort with a reason. Always recorded; an aborted record stays aborted.
    pub fn abort(&self, message: impl Into<String>) {
        let mut inner = self.inner.lock();
        inner.state = TaskState::Aborted;
        inner.history.push(StatusEntry {
            at: Utc::now(),
            state: TaskState::Aborted,
            message: message.into(),
        });
    }

    fn transition(&self, state: TaskState, message: String) -> bool {
        let mut inner = self.inner.lock();
        if inner.state == TaskState::Aborted {
            debug!(
                target: "tablesnap::snapshot",
                task = %self.description,
                ignored = %message,
                "Status is aborted, ignoring update"
            );
            return false;
        }
        // Once complete, only an abort may follow
        let state = if inner.state == TaskState::Complete {
            TaskState::Complete
        } else {
            state
        };
        inner.state = state;
        inner.history.push(StatusEntry {
            at: Utc::now(),
            state,
            message,
        });
        true
    }

    /// Current state
    pub fn state(&self) -> TaskState {
        self.inner.lock().state
    }

    /// Most recent message (empty before the first update)
    pub fn status(&self) -> String {
        self.inner
            .lock()
            .history
            .last()
            .map(|e| e.message.clone())
            .unwrap_or_default()
    }

    /// Copy of all recorded entries, oldest first
    pub fn history(&self) -> Vec<StatusEntry> {
        self.inner.lock().history.clone()
    }
}
