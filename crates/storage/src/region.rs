//! Region descriptor materialization

use std::path::{Path, PathBuf};
use tracing::debug;

use tablesnap_core::{AttemptContext, RegionInfo, RegionMaterializer, Result};

use crate::layout::{write_atomic, REGION_INFO_FILE};

/// Creates `<snapshot_dir>/<encoded region>/.regioninfo`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRegionMaterializer;

impl RegionMaterializer for FsRegionMaterializer {
    fn create(
        &self,
        _ctx: &AttemptContext,
        snapshot_dir: &Path,
        region: &RegionInfo,
    ) -> Result<PathBuf> {
        let region_dir = snapshot_dir.join(region.encoded_name());
        write_region_info(&region_dir, region)?;
        debug!(
            target: "tablesnap::storage",
            region = %region.encoded_name(),
            path = %region_dir.display(),
            "Materialized region"
        );
        Ok(region_dir)
    }
}

/// Create `region_dir` and write its `.regioninfo`.
///
/// Safe to repeat: an existing directory is reused and the file replaced.
pub fn write_region_info(region_dir: &Path, region: &RegionInfo) -> Result<()> {
    std::fs::create_dir_all(region_dir)?;
    let json = serde_json::to_vec_pretty(region)?;
    write_atomic(&region_dir.join(REGION_INFO_FILE), &json)?;
    Ok(())
}

/// Read the `.regioninfo` of a region directory
pub fn read_region_info(region_dir: &Path) -> Result<RegionInfo> {
    let bytes = std::fs::read(region_dir.join(REGION_INFO_FILE))?;
    Ok(serde_json::from_slice(&bytes)?)
}
