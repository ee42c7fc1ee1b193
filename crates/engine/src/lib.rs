//! Snapshot engine for tablesnap
//!
//! This crate drives a snapshot attempt over the storage layer:
//! - DisabledTableSnapshot: per-region orchestration for an offline table
//! - TimeoutGuard: deadline that aborts the attempt through its monitor
//! - SnapshotProcedure / SnapshotRunner: prepare, execute, verify, commit
//! - SnapshotConfig: `tablesnap.toml`
//! - TaskRegistry: status records of in-process attempts

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod procedure;
pub mod snapshot;
pub mod tasks;
pub mod timeout;

pub use config::{ConfigError, SnapshotConfig, CONFIG_FILE_NAME, DEFAULT_TIMEOUT_MS};
pub use procedure::{CompletedSnapshot, SnapshotProcedure, SnapshotRunner};
pub use snapshot::{distinct_locations, DisabledTableSnapshot, SnapshotOutcome};
pub use tasks::TaskRegistry;
pub use timeout::TimeoutGuard;
