//! Boundary traits for the per-region and per-table copy steps
//!
//! The orchestrator only sequences these calls. Implementations own the
//! actual file work and report failures either by returning an error or by
//! observing [`AttemptContext::check`] between units of work.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::context::AttemptContext;
use crate::error::Result;
use crate::types::RegionInfo;

/// Materializes a region's on-disk representation inside the snapshot
pub trait RegionMaterializer: Send + Sync {
    /// Create the region directory under `snapshot_dir` and return its path
    fn create(
        &self,
        ctx: &AttemptContext,
        snapshot_dir: &Path,
        region: &RegionInfo,
    ) -> Result<PathBuf>;
}

/// Copies write-ahead-log edits not yet applied to data files
pub trait RecoveredEditsCopier: Send + Sync {
    /// Copy edits from the live region into the snapshot region
    fn copy(
        &self,
        ctx: &AttemptContext,
        source_region_dir: &Path,
        snapshot_region_dir: &Path,
    ) -> Result<()>;
}

/// Writes lightweight references to a region's data files
pub trait FileReferenceWriter: Send + Sync {
    /// Create one reference per data file of the live region
    fn reference(
        &self,
        ctx: &AttemptContext,
        source_region_dir: &Path,
        snapshot_region_dir: &Path,
    ) -> Result<()>;
}

/// Copies the table-level descriptor once per snapshot
pub trait TableDescriptorCopier: Send + Sync {
    /// Copy the descriptor of `ctx.snapshot().table` into `snapshot_dir`
    fn copy(&self, ctx: &AttemptContext, snapshot_dir: &Path) -> Result<()>;
}

/// The full set of collaborators an orchestrator drives
#[derive(Clone)]
pub struct SnapshotCollaborators {
    /// Region descriptor materializer
    pub regions: Arc<dyn RegionMaterializer>,
    /// Recovery-log edit copier
    pub edits: Arc<dyn RecoveredEditsCopier>,
    /// Data-file reference writer
    pub references: Arc<dyn FileReferenceWriter>,
    /// Table descriptor copier
    pub table_descriptor: Arc<dyn TableDescriptorCopier>,
}

impl std::fmt::Debug for SnapshotCollaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCollaborators").finish_non_exhaustive()
    }
}
