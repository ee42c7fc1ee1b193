//! Live table directories
//!
//! `TableStore` lays out tables the way the snapshot collaborators expect
//! to read them, and `discover_regions` reads the region set back for
//! callers that have no placement service to ask.

use std::path::PathBuf;
use tracing::debug;

use tablesnap_core::{Error, RegionInfo, RegionLocation, Result, ServerName};

use crate::layout::{
    list_visible_dirs, table_info_file_name, write_atomic, SnapshotLayout, RECOVERED_EDITS_DIR,
};
use crate::region::{read_region_info, write_region_info};

/// Writer for live table directories
#[derive(Debug, Clone)]
pub struct TableStore {
    layout: SnapshotLayout,
}

impl TableStore {
    /// Store rooted at `layout`
    pub fn new(layout: SnapshotLayout) -> Self {
        TableStore { layout }
    }

    /// Layout this store writes into
    pub fn layout(&self) -> &SnapshotLayout {
        &self.layout
    }

    /// Create a table with its first descriptor file
    pub fn create_table(&self, table: &str, descriptor: &[u8]) -> Result<PathBuf> {
        let desc_dir = self.layout.table_desc_dir(table);
        std::fs::create_dir_all(&desc_dir)?;
        write_atomic(&desc_dir.join(table_info_file_name(1)), descriptor)?;
        Ok(self.layout.table_dir(table))
    }

    /// Add a region directory with its `.regioninfo`
    pub fn add_region(&self, region: &RegionInfo) -> Result<PathBuf> {
        if !self.layout.table_dir(&region.table).is_dir() {
            return Err(Error::TableNotFound(region.table.clone()));
        }
        let dir = self.layout.region_dir(region);
        write_region_info(&dir, region)?;
        Ok(dir)
    }

    /// Write a store file under a region's family
    pub fn write_store_file(
        &self,
        region: &RegionInfo,
        family: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        let family_dir = self.layout.region_dir(region).join(family);
        std::fs::create_dir_all(&family_dir)?;
        let path = family_dir.join(name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Write a recovered edits file for a region
    pub fn write_recovered_edit(
        &self,
        region: &RegionInfo,
        sequence_id: u64,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        let edits_dir = self.layout.region_dir(region).join(RECOVERED_EDITS_DIR);
        std::fs::create_dir_all(&edits_dir)?;
        let path = edits_dir.join(format!("{:019}", sequence_id));
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Regions of `table` found on disk, each paired with `server`.
///
/// Directories without a readable `.regioninfo` are skipped.
pub fn discover_regions(
    layout: &SnapshotLayout,
    table: &str,
    server: &ServerName,
) -> Result<Vec<RegionLocation>> {
    let table_dir = layout.table_dir(table);
    if !table_dir.is_dir() {
        return Err(Error::TableNotFound(table.to_string()));
    }
    let mut regions = Vec::new();
    for dir in list_visible_dirs(&table_dir)? {
        match read_region_info(&dir) {
            Ok(region) => regions.push((region, server.clone())),
            Err(e) => debug!(
                target: "tablesnap::storage",
                dir = %dir.display(),
                error = %e,
                "Skipping directory without region info"
            ),
        }
    }
    regions.sort();
    Ok(regions)
}
