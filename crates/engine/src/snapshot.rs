//! Snapshot of a disabled table
//!
//! The table is offline, so nothing has to be flushed or coordinated with
//! servers. Every region is materialized straight from the filesystem:
//!
//! 1. Arm the timeout guard
//! 2. Deduplicate the placement input into distinct regions and servers
//! 3. Per region: write region info, copy recovered edits, reference store files
//! 4. Copy the table descriptor once every region is done
//! 5. Disarm the guard, then mark the status record complete if no failure arrived
//!
//! Any failure is wrapped once, offered to the attempt's monitor (first
//! failure wins) and the status record is aborted. The caller always gets
//! the stored first failure back.

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use tablesnap_core::{
    AttemptContext, Error, RegionInfo, RegionLocation, Result, ServerName, SnapshotCollaborators,
    SnapshotDescription, SnapshotFailure,
};
use tablesnap_storage::tableinfo::latest_table_info;
use tablesnap_storage::{SnapshotLayout, WorkingDirectory};

use crate::config::SnapshotConfig;
use crate::procedure::{abort, SnapshotProcedure};
use crate::timeout::TimeoutGuard;

/// Result of a successful `run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOutcome {
    /// Snapshot name
    pub snapshot: String,
    /// Distinct regions written
    pub regions: BTreeSet<RegionInfo>,
    /// Distinct servers that reported them
    pub servers: BTreeSet<ServerName>,
    /// Working directory holding the result
    pub working_dir: PathBuf,
    /// Wall time of the attempt
    pub elapsed: Duration,
}

/// Orchestrates one snapshot attempt of a disabled table
#[derive(Debug)]
pub struct DisabledTableSnapshot {
    layout: SnapshotLayout,
    collaborators: SnapshotCollaborators,
    ctx: AttemptContext,
    working: WorkingDirectory,
    deadline: Duration,
    region_workers: usize,
}

impl DisabledTableSnapshot {
    /// Attempt for `snapshot` with a fresh context
    pub fn new(
        layout: SnapshotLayout,
        collaborators: SnapshotCollaborators,
        snapshot: SnapshotDescription,
        config: &SnapshotConfig,
    ) -> Self {
        Self::with_context(layout, collaborators, AttemptContext::new(snapshot), config)
    }

    /// Attempt reporting through an existing context
    pub fn with_context(
        layout: SnapshotLayout,
        collaborators: SnapshotCollaborators,
        ctx: AttemptContext,
        config: &SnapshotConfig,
    ) -> Self {
        let working = WorkingDirectory::new(&layout, ctx.snapshot());
        DisabledTableSnapshot {
            deadline: config.timeout_for(ctx.snapshot()),
            region_workers: config.region_workers.max(1),
            layout,
            collaborators,
            ctx,
            working,
        }
    }

    /// Deadline enforced by `run`
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Ask a running attempt to stop at its next check
    pub fn interrupt(&self, reason: &str) -> bool {
        self.ctx.interrupt(reason)
    }

    /// Snapshot every region in `locations` into the working directory.
    pub fn run(
        &self,
        locations: &[RegionLocation],
    ) -> std::result::Result<SnapshotOutcome, SnapshotFailure> {
        let started = Instant::now();
        let snapshot = self.ctx.snapshot();
        info!(
            target: "tablesnap::snapshot",
            snapshot = %snapshot.name,
            table = %snapshot.table,
            locations = locations.len(),
            deadline_ms = self.deadline.as_millis() as u64,
            "Starting snapshot"
        );

        let guard = TimeoutGuard::for_context(&self.ctx, self.deadline);
        let result = guard.start().and_then(|()| self.snapshot_regions(locations));
        guard.complete();
        // The deadline may have fired between the last check and complete()
        let result = result.and_then(|found| self.ctx.check().map(|()| found));

        match result {
            Ok((regions, servers)) => {
                self.ctx.status().set_status(format!(
                    "Snapshot {} of table {} completed",
                    snapshot.name, snapshot.table
                ));
                self.ctx.status().mark_complete("Snapshot is completed");
                let elapsed = started.elapsed();
                info!(
                    target: "tablesnap::snapshot",
                    snapshot = %snapshot.name,
                    regions = regions.len(),
                    servers = servers.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Snapshot finished"
                );
                Ok(SnapshotOutcome {
                    snapshot: snapshot.name.clone(),
                    regions,
                    servers,
                    working_dir: self.working.path().to_path_buf(),
                    elapsed,
                })
            }
            Err(e) => Err(self.abort(&e)),
        }
    }

    fn snapshot_regions(
        &self,
        locations: &[RegionLocation],
    ) -> Result<(BTreeSet<RegionInfo>, BTreeSet<ServerName>)> {
        let snapshot = self.ctx.snapshot();
        let (regions, servers) = distinct_locations(locations)?;
        self.ctx.status().set_status(format!(
            "Starting to snapshot {} regions of table {}",
            regions.len(),
            snapshot.table
        ));

        let ordered: Vec<&RegionInfo> = regions.iter().collect();
        if self.region_workers <= 1 || ordered.len() <= 1 {
            for region in &ordered {
                self.ctx.check()?;
                self.snapshot_region_or_fail(region)?;
            }
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.region_workers.min(ordered.len()))
                .thread_name(|i| format!("tablesnap-region-{}", i))
                .build()
                .map_err(|e| Error::invalid_operation(format!("region worker pool: {}", e)))?;
            pool.install(|| {
                ordered.par_iter().try_for_each(|region| {
                    self.ctx.check()?;
                    self.snapshot_region_or_fail(region)
                })
            })?;
            // Tasks that stopped quietly on check() still leave the failure here
            self.ctx.check()?;
        }

        self.collaborators
            .table_descriptor
            .copy(&self.ctx, self.working.path())?;
        Ok((regions, servers))
    }

    /// Deliver a region failure at once so parallel workers see it.
    fn snapshot_region_or_fail(&self, region: &RegionInfo) -> Result<()> {
        self.snapshot_region(region)
            .map_err(|e| Error::Aborted(self.ctx.fail(&e)))
    }

    fn snapshot_region(&self, region: &RegionInfo) -> Result<()> {
        let encoded = region.encoded_name();
        debug!(
            target: "tablesnap::snapshot",
            region = %encoded,
            "Snapshotting region"
        );

        let snapshot_region_dir = self
            .collaborators
            .regions
            .create(&self.ctx, self.working.path(), region)
            .map_err(|e| e.in_region(&encoded, "materialize region"))?;
        self.ctx.check()?;

        let source_region_dir = self.layout.region_dir(region);
        self.collaborators
            .edits
            .copy(&self.ctx, &source_region_dir, &snapshot_region_dir)
            .map_err(|e| e.in_region(&encoded, "copy recovered edits"))?;
        self.ctx.check()?;

        self.collaborators
            .references
            .reference(&self.ctx, &source_region_dir, &snapshot_region_dir)
            .map_err(|e| e.in_region(&encoded, "reference store files"))?;
        self.ctx.check()?;

        self.ctx.status().set_status(format!(
            "Completed referencing store files for region {} of table {}",
            encoded,
            self.ctx.snapshot().table
        ));
        Ok(())
    }

    fn abort(&self, err: &Error) -> SnapshotFailure {
        abort(&self.ctx, err)
    }
}

impl SnapshotProcedure for DisabledTableSnapshot {
    fn context(&self) -> &AttemptContext {
        &self.ctx
    }

    fn working_directory(&self) -> &WorkingDirectory {
        &self.working
    }

    fn prepare(&self) -> std::result::Result<(), SnapshotFailure> {
        let snapshot = self.ctx.snapshot();
        self.ctx
            .status()
            .set_status(format!("Preparing snapshot {}", snapshot.describe()));
        let prepared = snapshot
            .validate()
            .and_then(|()| latest_table_info(&self.layout, &snapshot.table))
            .and_then(|_| self.working.prepare(snapshot));
        prepared.map_err(|e| self.abort(&e))
    }

    fn execute(
        &self,
        locations: &[RegionLocation],
    ) -> std::result::Result<SnapshotOutcome, SnapshotFailure> {
        self.run(locations)
    }
}

/// Distinct regions and servers of the placement input.
///
/// Empty input is an invalid request. A region reported by more than one
/// server is kept once; the disagreement is only logged.
pub fn distinct_locations(
    locations: &[RegionLocation],
) -> Result<(BTreeSet<RegionInfo>, BTreeSet<ServerName>)> {
    if locations.is_empty() {
        return Err(Error::invalid_request("no region locations to snapshot"));
    }
    let mut owners: BTreeMap<&RegionInfo, &ServerName> = BTreeMap::new();
    let mut servers = BTreeSet::new();
    for (region, server) in locations {
        if let Some(previous) = owners.insert(region, server) {
            if previous != server {
                warn!(
                    target: "tablesnap::snapshot",
                    region = %region.encoded_name(),
                    first = %previous,
                    second = %server,
                    "Region reported by more than one server"
                );
            }
        }
        servers.insert(server.clone());
    }
    let regions = owners.into_keys().cloned().collect();
    Ok((regions, servers))
}
