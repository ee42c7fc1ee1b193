//! Table descriptor copy

use std::path::{Path, PathBuf};
use tracing::debug;

use tablesnap_core::{AttemptContext, Error, Result, TableDescriptorCopier};

use crate::layout::{parse_table_info_seq, table_info_file_name, write_atomic, SnapshotLayout};

/// Copies the newest `.tableinfo` of the snapshotted table
#[derive(Debug, Clone)]
pub struct FsTableDescriptorCopier {
    layout: SnapshotLayout,
}

impl FsTableDescriptorCopier {
    /// Copier reading tables under `layout`
    pub fn new(layout: SnapshotLayout) -> Self {
        FsTableDescriptorCopier { layout }
    }
}

impl TableDescriptorCopier for FsTableDescriptorCopier {
    fn copy(&self, ctx: &AttemptContext, snapshot_dir: &Path) -> Result<()> {
        let table = &ctx.snapshot().table;
        let source = latest_table_info(&self.layout, table)?;
        let bytes = std::fs::read(&source)?;
        ctx.check()?;
        let dest = snapshot_dir.join(table_info_file_name(1));
        write_atomic(&dest, &bytes)?;
        debug!(
            target: "tablesnap::storage",
            table = %table,
            source = %source.display(),
            "Copied table descriptor"
        );
        Ok(())
    }
}

/// Newest descriptor file of `table`
pub fn latest_table_info(layout: &SnapshotLayout, table: &str) -> Result<PathBuf> {
    let desc_dir = layout.table_desc_dir(table);
    if !layout.table_dir(table).is_dir() {
        return Err(Error::TableNotFound(table.to_string()));
    }
    if !desc_dir.is_dir() {
        return Err(Error::MissingTableDescriptor {
            table: table.to_string(),
        });
    }

    let mut latest: Option<(u64, PathBuf)> = None;
    for entry in std::fs::read_dir(&desc_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(seq) = parse_table_info_seq(&name) {
            if latest.as_ref().map_or(true, |(best, _)| seq > *best) {
                latest = Some((seq, entry.path()));
            }
        }
    }
    latest
        .map(|(_, path)| path)
        .ok_or_else(|| Error::MissingTableDescriptor {
            table: table.to_string(),
        })
}
