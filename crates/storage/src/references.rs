//! Store file references
//!
//! A reference is an empty file carrying the store file's name under the
//! same family directory. Restores resolve it back to the live (or archived)
//! store file, so no data bytes are copied here.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::debug;

use tablesnap_core::{AttemptContext, FileReferenceWriter, Result};

use crate::layout::{list_visible_dirs, RECOVERED_EDITS_DIR};

/// Writes one empty reference per store file of every family
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReferenceWriter;

impl FileReferenceWriter for FsReferenceWriter {
    fn reference(
        &self,
        ctx: &AttemptContext,
        source_region_dir: &Path,
        snapshot_region_dir: &Path,
    ) -> Result<()> {
        for family in list_family_dirs(source_region_dir)? {
            ctx.check()?;
            let store_files = list_store_files(&family)?;
            if store_files.is_empty() {
                continue;
            }
            // list_family_dirs only returns named directories
            let Some(family_name) = family.file_name() else {
                continue;
            };
            let dest = snapshot_region_dir.join(family_name);
            std::fs::create_dir_all(&dest)?;
            for store_file in &store_files {
                if let Some(name) = store_file.file_name() {
                    create_reference(&dest.join(name))?;
                }
            }
            debug!(
                target: "tablesnap::storage",
                family = %family_name.to_string_lossy(),
                files = store_files.len(),
                "Referenced store files"
            );
        }
        Ok(())
    }
}

fn create_reference(path: &Path) -> Result<()> {
    // Existing reference from an earlier try of the same region is fine
    OpenOptions::new().create(true).write(true).open(path)?;
    Ok(())
}

/// Family directories of a live region, sorted by name
pub fn list_family_dirs(region_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut families = list_visible_dirs(region_dir)?;
    families.retain(|dir| dir.file_name().map_or(true, |n| n != RECOVERED_EDITS_DIR));
    Ok(families)
}

/// Store files of one family directory, sorted by name
pub fn list_store_files(family_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(family_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() && !entry.file_name().to_string_lossy().starts_with('.') {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
