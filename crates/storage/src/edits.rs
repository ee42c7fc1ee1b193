//! Copy of recovered WAL edits into a snapshot region

use std::path::{Path, PathBuf};
use tracing::debug;

use tablesnap_core::{AttemptContext, RecoveredEditsCopier, Result};

use crate::layout::RECOVERED_EDITS_DIR;

/// Copies `<region>/recovered.edits/<seqid>` files into the snapshot region
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRecoveredEditsCopier;

impl RecoveredEditsCopier for FsRecoveredEditsCopier {
    fn copy(
        &self,
        ctx: &AttemptContext,
        source_region_dir: &Path,
        snapshot_region_dir: &Path,
    ) -> Result<()> {
        let source = source_region_dir.join(RECOVERED_EDITS_DIR);
        let edits = list_edit_files(&source)?;
        if edits.is_empty() {
            debug!(
                target: "tablesnap::storage",
                region = %source_region_dir.display(),
                "No recovered edits to copy"
            );
            return Ok(());
        }

        let dest = snapshot_region_dir.join(RECOVERED_EDITS_DIR);
        std::fs::create_dir_all(&dest)?;
        for edit in edits {
            ctx.check()?;
            // list_edit_files only returns named files
            let Some(name) = edit.file_name() else {
                continue;
            };
            let bytes = std::fs::copy(&edit, dest.join(name))?;
            debug!(
                target: "tablesnap::storage",
                edit = %edit.display(),
                bytes,
                "Copied recovered edit"
            );
        }
        Ok(())
    }
}

/// Edit files of a `recovered.edits` directory, sorted by sequence id.
///
/// Only regular files whose names are all digits count; in-progress
/// `.temp` files and anything else are skipped. A missing directory yields
/// an empty list.
pub fn list_edit_files(edits_dir: &Path) -> Result<Vec<PathBuf>> {
    if !edits_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(edits_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
