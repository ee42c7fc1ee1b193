//! Error types for tablesnap
//!
//! Two layers of errors exist:
//!
//! - [`Error`]: what a single step (a collaborator call, a layout check)
//!   returns. Propagated with `?` inside one step.
//! - [`SnapshotFailure`]: the attempt-level failure. Exactly one of these is
//!   remembered per attempt by the [`ErrorMonitor`](crate::ErrorMonitor) and
//!   handed back to whoever requested the snapshot.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::types::SnapshotDescription;

/// Result type alias for tablesnap step operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by individual snapshot steps
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The snapshot request itself is not acceptable
    #[error("Invalid snapshot request: {0}")]
    InvalidRequest(String),

    /// Source table does not exist on disk
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Source table has no descriptor file
    #[error("No table descriptor found for table {table}")]
    MissingTableDescriptor {
        /// Table that was searched
        table: String,
    },

    /// A snapshot directory does not have the expected shape
    #[error("Snapshot verification failed: {0}")]
    Verification(String),

    /// A per-region step failed
    #[error("{step} failed for region {region}: {source}")]
    RegionStep {
        /// Encoded name of the region
        region: String,
        /// Human-readable step name
        step: &'static str,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },

    /// The attempt was already aborted when this step checked in
    #[error("{0}")]
    Aborted(SnapshotFailure),

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl Error {
    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a verification error
    pub fn verification(msg: impl Into<String>) -> Self {
        Self::Verification(msg.into())
    }

    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Annotate this error with the region and step it came from.
    ///
    /// Aborts pass through untouched: they already carry the attempt's
    /// stored failure and must not be re-described.
    pub fn in_region(self, region: impl Into<String>, step: &'static str) -> Self {
        match self {
            Error::Aborted(_) => self,
            other => Error::RegionStep {
                region: region.into(),
                step,
                source: Box::new(other),
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<SnapshotFailure> for Error {
    fn from(f: SnapshotFailure) -> Self {
        Error::Aborted(f)
    }
}

/// Classification of an attempt-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A collaborator (or validation) step raised an error
    Collaborator,
    /// The deadline elapsed before the attempt finished
    Timeout,
    /// Someone asked the attempt to stop
    Interrupted,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Collaborator => write!(f, "collaborator"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// The single failure remembered for a snapshot attempt.
///
/// Cheap to clone so it can be handed to the status record, the caller and
/// every worker that observes the abort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SnapshotFailure {
    kind: FailureKind,
    snapshot: String,
    message: String,
}

impl SnapshotFailure {
    /// Wrap a step error for the given snapshot
    pub fn from_error(snapshot: &SnapshotDescription, err: &Error) -> Self {
        if let Error::Aborted(existing) = err {
            return existing.clone();
        }
        let snapshot = snapshot.describe();
        SnapshotFailure {
            kind: FailureKind::Collaborator,
            message: format!("Failed snapshot {} due to exception:{}", snapshot, err),
            snapshot,
        }
    }

    /// Deadline elapsed
    pub fn timeout(snapshot: &SnapshotDescription, elapsed: Duration, deadline: Duration) -> Self {
        let snapshot = snapshot.describe();
        SnapshotFailure {
            kind: FailureKind::Timeout,
            message: format!(
                "Timeout elapsed! Snapshot {} ran {}ms, deadline was {}ms",
                snapshot,
                elapsed.as_millis(),
                deadline.as_millis()
            ),
            snapshot,
        }
    }

    /// External stop request
    pub fn interrupted(snapshot: &SnapshotDescription, reason: &str) -> Self {
        let snapshot = snapshot.describe();
        SnapshotFailure {
            kind: FailureKind::Interrupted,
            message: format!("Snapshot {} interrupted: {}", snapshot, reason),
            snapshot,
        }
    }

    /// Failure classification
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Rendered identity of the snapshot that failed
    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    /// Human-readable reason
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True if this failure came from the deadline
    pub fn is_timeout(&self) -> bool {
        self.kind == FailureKind::Timeout
    }
}
