//! Root directory structure
//!
//! All tables and snapshots live under one root directory:
//!
//! ```text
//! root/
//! ├── data/
//! │   └── <table>/
//! │       ├── .tabledesc/.tableinfo.0000000001
//! │       └── <encoded region>/
//! │           ├── .regioninfo
//! │           ├── recovered.edits/<seqid>
//! │           └── <family>/<store file>
//! └── .snapshots/
//!     ├── .tmp/<snapshot>/      # working directories
//!     └── <snapshot>/           # committed snapshots
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tablesnap_core::RegionInfo;

/// Directory holding table data
pub const DATA_DIR: &str = "data";
/// Directory holding snapshots
pub const SNAPSHOTS_DIR: &str = ".snapshots";
/// Sub-directory of `SNAPSHOTS_DIR` holding in-progress snapshots
pub const WORKING_DIR: &str = ".tmp";
/// Per-table directory holding descriptor files
pub const TABLE_DESC_DIR: &str = ".tabledesc";
/// Prefix of table descriptor files
pub const TABLE_INFO_PREFIX: &str = ".tableinfo.";
/// Region descriptor file name
pub const REGION_INFO_FILE: &str = ".regioninfo";
/// Snapshot description file name
pub const SNAPSHOT_INFO_FILE: &str = ".snapshotinfo";
/// Per-region directory of unapplied WAL edits
pub const RECOVERED_EDITS_DIR: &str = "recovered.edits";

/// Paths within a tablesnap root directory
#[derive(Debug, Clone)]
pub struct SnapshotLayout {
    root: PathBuf,
}

impl SnapshotLayout {
    /// Create paths from root directory
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        SnapshotLayout {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all tables
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    /// Directory of one table
    pub fn table_dir(&self, table: &str) -> PathBuf {
        self.data_dir().join(table)
    }

    /// Descriptor directory of one table
    pub fn table_desc_dir(&self, table: &str) -> PathBuf {
        self.table_dir(table).join(TABLE_DESC_DIR)
    }

    /// Live directory of one region
    pub fn region_dir(&self, region: &RegionInfo) -> PathBuf {
        self.table_dir(&region.table).join(region.encoded_name())
    }

    /// Directory holding committed snapshots
    pub fn snapshots_dir(&self) -> PathBuf {
        self.root.join(SNAPSHOTS_DIR)
    }

    /// Directory holding in-progress snapshots
    pub fn working_root(&self) -> PathBuf {
        self.snapshots_dir().join(WORKING_DIR)
    }

    /// Working directory of one snapshot
    pub fn working_snapshot_dir(&self, snapshot: &str) -> PathBuf {
        self.working_root().join(snapshot)
    }

    /// Committed directory of one snapshot
    pub fn completed_snapshot_dir(&self, snapshot: &str) -> PathBuf {
        self.snapshots_dir().join(snapshot)
    }

    /// Create the top-level directories
    pub fn create_directories(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.data_dir())?;
        std::fs::create_dir_all(self.working_root())?;
        Ok(())
    }
}

/// File name of the table descriptor with sequence id `seq`
pub fn table_info_file_name(seq: u64) -> String {
    format!("{}{:010}", TABLE_INFO_PREFIX, seq)
}

/// Parse the sequence id out of a `.tableinfo.NNNNNNNNNN` name
pub fn parse_table_info_seq(name: &str) -> Option<u64> {
    let digits = name.strip_prefix(TABLE_INFO_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Write `bytes` to `path` with write-fsync-rename.
///
/// Either the complete file exists at `path` afterwards or it doesn't.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let temp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&temp_path, path)?;
    sync_dir(parent)
}

/// Sub-directories of `dir` whose names don't start with `.`, sorted
pub fn list_visible_dirs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() && !entry.file_name().to_string_lossy().starts_with('.') {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// fsync a directory so renames inside it are durable
pub fn sync_dir(dir: &Path) -> io::Result<()> {
    let dir = File::open(dir)?;
    dir.sync_all()
}
