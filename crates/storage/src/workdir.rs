//! Snapshot working directory lifecycle
//!
//! A working directory is private to one attempt until it is committed.
//! Commit is a single rename into the snapshots directory followed by an
//! fsync of the parent, so a reader either sees the whole snapshot or none
//! of it.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use tablesnap_core::{Error, Result, SnapshotDescription};

use crate::layout::{sync_dir, write_atomic, SnapshotLayout, SNAPSHOT_INFO_FILE, WORKING_DIR};

/// Working directory of one snapshot attempt
#[derive(Debug, Clone)]
pub struct WorkingDirectory {
    path: PathBuf,
    completed: PathBuf,
}

impl WorkingDirectory {
    /// Paths for `snapshot` under `layout` (nothing is created)
    pub fn new(layout: &SnapshotLayout, snapshot: &SnapshotDescription) -> Self {
        WorkingDirectory {
            path: layout.working_snapshot_dir(&snapshot.name),
            completed: layout.completed_snapshot_dir(&snapshot.name),
        }
    }

    /// Working directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the snapshot lands on commit
    pub fn completed_path(&self) -> &Path {
        &self.completed
    }

    /// Start from an empty working directory holding only `.snapshotinfo`.
    ///
    /// Leftovers from an earlier failed attempt of the same name are removed.
    pub fn prepare(&self, snapshot: &SnapshotDescription) -> Result<()> {
        if self.completed.exists() {
            return Err(Error::invalid_request(format!(
                "snapshot '{}' already exists at {}",
                snapshot.name,
                self.completed.display()
            )));
        }
        if self.path.exists() {
            debug!(
                target: "tablesnap::storage",
                path = %self.path.display(),
                "Removing stale working directory"
            );
            std::fs::remove_dir_all(&self.path)?;
        }
        std::fs::create_dir_all(&self.path)?;
        write_snapshot_info(&self.path, snapshot)
    }

    /// Atomically promote the working directory to a committed snapshot
    pub fn commit(&self) -> Result<PathBuf> {
        if self.completed.exists() {
            return Err(Error::invalid_operation(format!(
                "cannot commit over existing snapshot {}",
                self.completed.display()
            )));
        }
        if let Some(parent) = self.completed.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(&self.path, &self.completed)?;
        if let Some(parent) = self.completed.parent() {
            sync_dir(parent)?;
        }
        info!(
            target: "tablesnap::storage",
            path = %self.completed.display(),
            "Committed snapshot"
        );
        Ok(self.completed.clone())
    }

    /// Remove the working directory. Missing is fine.
    pub fn discard(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_dir_all(&self.path)?;
            debug!(
                target: "tablesnap::storage",
                path = %self.path.display(),
                "Discarded working directory"
            );
        }
        Ok(())
    }
}

/// Write `.snapshotinfo` into `dir`
pub fn write_snapshot_info(dir: &Path, snapshot: &SnapshotDescription) -> Result<()> {
    let json = serde_json::to_vec_pretty(snapshot)?;
    write_atomic(&dir.join(SNAPSHOT_INFO_FILE), &json)?;
    Ok(())
}

/// Read `.snapshotinfo` from `dir`
pub fn read_snapshot_info(dir: &Path) -> Result<SnapshotDescription> {
    let bytes = std::fs::read(dir.join(SNAPSHOT_INFO_FILE))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Names of committed snapshots, sorted
pub fn list_snapshots(layout: &SnapshotLayout) -> Result<Vec<String>> {
    let dir = layout.snapshots_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.file_type()?.is_dir() && name != WORKING_DIR && !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
