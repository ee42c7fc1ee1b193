//! tablesnap - offline snapshots of disabled tables
//!
//! A snapshot of a disabled table is assembled straight from the table's
//! directories: one region directory per region holding its region info,
//! its recovered edits and empty references to its store files, plus a copy
//! of the table descriptor. Nothing is flushed and no server is contacted.
//!
//! # Quick Start
//!
//! ```ignore
//! use tablesnap::{
//!     discover_regions, filesystem_collaborators, DisabledTableSnapshot, ServerName,
//!     SnapshotConfig, SnapshotDescription, SnapshotLayout, SnapshotRunner,
//! };
//!
//! let layout = SnapshotLayout::from_root("/var/lib/tables");
//! let config = SnapshotConfig::default();
//! let server = ServerName::new("localhost", 16020, 0);
//! let locations = discover_regions(&layout, "orders", &server)?;
//!
//! let procedure = DisabledTableSnapshot::new(
//!     layout.clone(),
//!     filesystem_collaborators(&layout),
//!     SnapshotDescription::new("orders-nightly", "orders"),
//!     &config,
//! );
//! let completed = SnapshotRunner::new(&config).take(&procedure, &locations)?;
//! ```
//!
//! # Architecture
//!
//! - `tablesnap-core`: request types, errors, failure monitor, status record
//! - `tablesnap-storage`: on-disk layout and filesystem collaborators
//! - `tablesnap-engine`: orchestrator, timeout guard, runner, config

pub use tablesnap_core::*;
pub use tablesnap_engine::*;
pub use tablesnap_storage::*;
