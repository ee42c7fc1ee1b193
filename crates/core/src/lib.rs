//! Core types and traits for tablesnap
//!
//! This crate defines the foundational pieces shared by every layer:
//! - SnapshotDescription: the immutable snapshot request
//! - RegionInfo / ServerName: placement input
//! - Error / SnapshotFailure: step-level and attempt-level errors
//! - ErrorMonitor: first-wins failure slot
//! - TaskStatus: progress record with a terminal aborted state
//! - AttemptContext: the value passed into every collaborator call
//! - Collaborator traits: region, edits, references, table descriptor

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collaborators;
pub mod context;
pub mod error;
pub mod monitor;
pub mod status;
pub mod types;

pub use collaborators::{
    FileReferenceWriter, RecoveredEditsCopier, RegionMaterializer, SnapshotCollaborators,
    TableDescriptorCopier,
};
pub use context::AttemptContext;
pub use error::{Error, FailureKind, Result, SnapshotFailure};
pub use monitor::ErrorMonitor;
pub use status::{StatusEntry, TaskState, TaskStatus};
pub use types::{
    RegionInfo, RegionLocation, ServerName, SnapshotDescription, SnapshotType,
    SNAPSHOT_FORMAT_VERSION,
};
