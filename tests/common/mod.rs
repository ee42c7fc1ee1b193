//! Shared test utilities for the integration suites.
//!
//! Import via `mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tablesnap::{
    filesystem_collaborators, AttemptContext, DisabledTableSnapshot, Error, FileReferenceWriter,
    FsReferenceWriter, FsRegionMaterializer, FsTableDescriptorCopier, RegionInfo, RegionLocation,
    RegionMaterializer, Result, ServerName, SnapshotCollaborators, SnapshotConfig,
    SnapshotDescription, SnapshotLayout, TableDescriptorCopier, TableStore,
};
use tempfile::TempDir;

pub const TABLE: &str = "T";

// ============================================================================
// Fixture
// ============================================================================

/// A root directory holding table `T` with `n` regions, each with one store
/// file and one recovered edit.
pub struct Fixture {
    pub tmp: TempDir,
    pub layout: SnapshotLayout,
    pub store: TableStore,
    pub regions: Vec<RegionInfo>,
}

impl Fixture {
    pub fn new(n: usize) -> Self {
        let tmp = TempDir::new().unwrap();
        let layout = SnapshotLayout::from_root(tmp.path());
        layout.create_directories().unwrap();
        let store = TableStore::new(layout.clone());
        store.create_table(TABLE, b"{\"families\":[\"cf\"]}").unwrap();

        let mut regions = Vec::with_capacity(n);
        for i in 0..n {
            let start = if i == 0 {
                Vec::new()
            } else {
                format!("row-{:04}", i).into_bytes()
            };
            let end = if i + 1 == n {
                Vec::new()
            } else {
                format!("row-{:04}", i + 1).into_bytes()
            };
            let region = RegionInfo::new(TABLE, start, end, 1_700_000_000_000);
            store.add_region(&region).unwrap();
            store
                .write_store_file(&region, "cf", &format!("hfile-{}", i), b"cells")
                .unwrap();
            store
                .write_recovered_edit(&region, 100 + i as u64, b"edit")
                .unwrap();
            regions.push(region);
        }
        Fixture {
            tmp,
            layout,
            store,
            regions,
        }
    }

    /// Every region on the same server
    pub fn locations(&self) -> Vec<RegionLocation> {
        self.regions
            .iter()
            .map(|r| (r.clone(), server(1)))
            .collect()
    }

    pub fn collaborators(&self) -> SnapshotCollaborators {
        filesystem_collaborators(&self.layout)
    }

    pub fn attempt(
        &self,
        snapshot: SnapshotDescription,
        collaborators: SnapshotCollaborators,
        config: &SnapshotConfig,
    ) -> DisabledTableSnapshot {
        DisabledTableSnapshot::new(self.layout.clone(), collaborators, snapshot, config)
    }

    pub fn working_dir(&self, name: &str) -> PathBuf {
        self.layout.working_snapshot_dir(name)
    }
}

pub fn server(n: u16) -> ServerName {
    ServerName::new(format!("rs{}.example.com", n), 16020, n as u64)
}

pub fn request(name: &str) -> SnapshotDescription {
    SnapshotDescription::new(name, TABLE).with_creation_time(1_700_000_000_000)
}

/// Names of the visible sub-directories of `dir`, sorted
pub fn region_dirs(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().unwrap().is_dir())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| !n.starts_with('.'))
        .collect();
    names.sort();
    names
}

/// Every file under `dir` relative to it, sorted
pub fn tree(dir: &Path) -> Vec<String> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            let path = entry.path();
            if entry.file_type().unwrap().is_dir() {
                walk(base, &path, out);
            } else {
                out.push(path.strip_prefix(base).unwrap().display().to_string());
            }
        }
    }
    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}

pub fn injected(msg: &str) -> Error {
    Error::Io(std::io::Error::new(std::io::ErrorKind::Other, msg.to_string()))
}

// ============================================================================
// Test collaborators
// ============================================================================

/// Reference writer that fails for one region
pub struct FailingReferences {
    pub fail_for: String,
}

impl FileReferenceWriter for FailingReferences {
    fn reference(&self, ctx: &AttemptContext, source: &Path, dest: &Path) -> Result<()> {
        let is_target = dest.file_name().map_or(false, |n| n == self.fail_for.as_str());
        if is_target {
            return Err(injected("store file reference refused"));
        }
        FsReferenceWriter.reference(ctx, source, dest)
    }
}

/// Materializer that fails for one region
pub struct FailingMaterializer {
    pub fail_for: String,
}

impl RegionMaterializer for FailingMaterializer {
    fn create(&self, ctx: &AttemptContext, dir: &Path, region: &RegionInfo) -> Result<PathBuf> {
        if region.encoded_name() == self.fail_for {
            return Err(injected("region info write refused"));
        }
        FsRegionMaterializer.create(ctx, dir, region)
    }
}

/// Materializer that sleeps before each region
pub struct SlowMaterializer {
    pub delay: Duration,
}

impl RegionMaterializer for SlowMaterializer {
    fn create(&self, ctx: &AttemptContext, dir: &Path, region: &RegionInfo) -> Result<PathBuf> {
        std::thread::sleep(self.delay);
        FsRegionMaterializer.create(ctx, dir, region)
    }
}

/// Two regions fail; `second` only after `first` has been recorded
pub struct OrderedFailures {
    pub first: String,
    pub second: String,
}

impl RegionMaterializer for OrderedFailures {
    fn create(&self, ctx: &AttemptContext, dir: &Path, region: &RegionInfo) -> Result<PathBuf> {
        let encoded = region.encoded_name();
        if encoded == self.first {
            return Err(injected("first failure"));
        }
        if encoded == self.second {
            let waited = Instant::now();
            while !ctx.monitor().has_failure() && waited.elapsed() < Duration::from_secs(5) {
                std::thread::sleep(Duration::from_millis(1));
            }
            return Err(injected("second failure"));
        }
        FsRegionMaterializer.create(ctx, dir, region)
    }
}

/// Table descriptor copier that counts its calls
pub struct CountingTableDescriptor {
    pub inner: FsTableDescriptorCopier,
    pub calls: Arc<AtomicUsize>,
}

impl CountingTableDescriptor {
    pub fn install(collaborators: &mut SnapshotCollaborators, layout: &SnapshotLayout) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        collaborators.table_descriptor = Arc::new(CountingTableDescriptor {
            inner: FsTableDescriptorCopier::new(layout.clone()),
            calls: Arc::clone(&calls),
        });
        calls
    }
}

impl TableDescriptorCopier for CountingTableDescriptor {
    fn copy(&self, ctx: &AttemptContext, snapshot_dir: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.copy(ctx, snapshot_dir)
    }
}
