//! Filesystem layer for tablesnap
//!
//! This crate handles everything that touches disk:
//!
//! - Layout: where tables, regions, working and committed snapshots live
//! - Collaborators: region materializer, recovered-edits copier, store file
//!   reference writer, table descriptor copier
//! - Working directory lifecycle: prepare, commit, discard
//! - Verification of a snapshot directory's shape
//! - Live table writer and region discovery

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod edits;
pub mod layout;
pub mod references;
pub mod region;
pub mod table;
pub mod tableinfo;
pub mod verify;
pub mod workdir;

use std::sync::Arc;

use tablesnap_core::SnapshotCollaborators;

pub use edits::FsRecoveredEditsCopier;
pub use layout::SnapshotLayout;
pub use references::FsReferenceWriter;
pub use region::{read_region_info, FsRegionMaterializer};
pub use table::{discover_regions, TableStore};
pub use tableinfo::FsTableDescriptorCopier;
pub use verify::{inspect_snapshot, verify_snapshot, VerifiedSnapshot};
pub use workdir::{list_snapshots, read_snapshot_info, WorkingDirectory};

/// Filesystem implementations of every collaborator, reading under `layout`
pub fn filesystem_collaborators(layout: &SnapshotLayout) -> SnapshotCollaborators {
    SnapshotCollaborators {
        regions: Arc::new(FsRegionMaterializer),
        edits: Arc::new(FsRecoveredEditsCopier),
        references: Arc::new(FsReferenceWriter),
        table_descriptor: Arc::new(FsTableDescriptorCopier::new(layout.clone())),
    }
}
