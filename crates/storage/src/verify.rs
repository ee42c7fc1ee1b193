//! Shape check of a snapshot directory before it is trusted
//!
//! A snapshot is usable only if:
//! 1. `.snapshotinfo` matches the request
//! 2. the table descriptor file is present
//! 3. there is exactly one region directory per expected region
//! 4. each region directory's `.regioninfo` decodes to that region

use std::collections::BTreeSet;
use std::path::Path;

use tablesnap_core::{Error, RegionInfo, Result, SnapshotDescription};

use crate::layout::{list_visible_dirs, table_info_file_name, SNAPSHOT_INFO_FILE};
use crate::region::read_region_info;
use crate::workdir::read_snapshot_info;

/// Summary of a verified snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSnapshot {
    /// The stored request
    pub description: SnapshotDescription,
    /// Regions found, sorted
    pub regions: Vec<RegionInfo>,
}

/// Verify `dir` against the request and the expected region set
pub fn verify_snapshot(
    dir: &Path,
    snapshot: &SnapshotDescription,
    expected: &BTreeSet<RegionInfo>,
) -> Result<VerifiedSnapshot> {
    let verified = inspect_snapshot(dir)?;
    if &verified.description != snapshot {
        return Err(Error::verification(format!(
            "{} describes {} but {} was requested",
            SNAPSHOT_INFO_FILE,
            verified.description.describe(),
            snapshot.describe()
        )));
    }

    let found: BTreeSet<RegionInfo> = verified.regions.iter().cloned().collect();
    if let Some(missing) = expected.difference(&found).next() {
        return Err(Error::verification(format!(
            "region {} missing from snapshot {}",
            missing,
            snapshot.name
        )));
    }
    if let Some(extra) = found.difference(expected).next() {
        return Err(Error::verification(format!(
            "unexpected region {} in snapshot {}",
            extra, snapshot.name
        )));
    }
    Ok(verified)
}

/// Read back a snapshot directory without an expectation of its regions
pub fn inspect_snapshot(dir: &Path) -> Result<VerifiedSnapshot> {
    if !dir.is_dir() {
        return Err(Error::verification(format!(
            "snapshot directory {} does not exist",
            dir.display()
        )));
    }
    let description = read_snapshot_info(dir)
        .map_err(|e| Error::verification(format!("unreadable {}: {}", SNAPSHOT_INFO_FILE, e)))?;

    if !dir.join(table_info_file_name(1)).is_file() {
        return Err(Error::verification(format!(
            "table descriptor missing from {}",
            dir.display()
        )));
    }

    let mut regions = Vec::new();
    for region_dir in list_visible_dirs(dir)? {
        let name = region_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let region = read_region_info(&region_dir)
            .map_err(|e| Error::verification(format!("region directory {}: {}", name, e)))?;
        if region.encoded_name() != name {
            return Err(Error::verification(format!(
                "region directory {} holds region {}",
                name, region
            )));
        }
        if region.table != description.table {
            return Err(Error::verification(format!(
                "region {} belongs to table {}, not {}",
                region, region.table, description.table
            )));
        }
        regions.push(region);
    }
    regions.sort();

    Ok(VerifiedSnapshot {
        description,
        regions,
    })
}
