//! Two-phase snapshot procedure and the runner that drives it
//!
//! `prepare` sets up an empty working directory, `execute` fills it. The
//! runner then verifies the result and commits it by rename, or discards
//! the working directory when any phase fails.

use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use tablesnap_core::{
    AttemptContext, Error, RegionInfo, RegionLocation, ServerName, SnapshotDescription,
    SnapshotFailure,
};
use tablesnap_storage::{verify_snapshot, WorkingDirectory};

use crate::config::SnapshotConfig;
use crate::snapshot::SnapshotOutcome;

/// A snapshot attempt split into setup and execution
pub trait SnapshotProcedure: Send + Sync {
    /// Context shared with every collaborator of this attempt
    fn context(&self) -> &AttemptContext;

    /// Where the attempt writes until it is committed
    fn working_directory(&self) -> &WorkingDirectory;

    /// Validate the request and create a fresh working directory
    fn prepare(&self) -> Result<(), SnapshotFailure>;

    /// Write every region and the table descriptor
    fn execute(&self, locations: &[RegionLocation]) -> Result<SnapshotOutcome, SnapshotFailure>;
}

/// A verified, committed snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSnapshot {
    /// The request that produced it
    pub description: SnapshotDescription,
    /// Committed directory
    pub path: PathBuf,
    /// Regions in the snapshot, sorted
    pub regions: Vec<RegionInfo>,
    /// Servers that reported them, sorted
    pub servers: Vec<ServerName>,
    /// Wall time from prepare to commit
    pub elapsed: Duration,
}

/// Drives a procedure through prepare, execute, verify and commit
#[derive(Debug, Clone, Copy)]
pub struct SnapshotRunner {
    discard_failed_working_dir: bool,
}

impl Default for SnapshotRunner {
    fn default() -> Self {
        Self::new(&SnapshotConfig::default())
    }
}

impl SnapshotRunner {
    /// Runner following `config`
    pub fn new(config: &SnapshotConfig) -> Self {
        SnapshotRunner {
            discard_failed_working_dir: config.discard_failed_working_dir,
        }
    }

    /// Take the snapshot end to end.
    ///
    /// On failure the status record is aborted and, unless configured
    /// otherwise, the working directory is removed.
    pub fn take<P: SnapshotProcedure + ?Sized>(
        &self,
        procedure: &P,
        locations: &[RegionLocation],
    ) -> Result<CompletedSnapshot, SnapshotFailure> {
        let started = Instant::now();
        let result = self.take_inner(procedure, locations, started);
        if result.is_err() {
            self.cleanup(procedure);
        }
        result
    }

    fn take_inner<P: SnapshotProcedure + ?Sized>(
        &self,
        procedure: &P,
        locations: &[RegionLocation],
        started: Instant,
    ) -> Result<CompletedSnapshot, SnapshotFailure> {
        procedure.prepare()?;
        let outcome = procedure.execute(locations)?;

        let ctx = procedure.context();
        let working = procedure.working_directory();
        let committed = verify_snapshot(working.path(), ctx.snapshot(), &outcome.regions)
            .and_then(|_| working.commit())
            .map_err(|e| abort(ctx, &e))?;

        let completed = CompletedSnapshot {
            description: ctx.snapshot().clone(),
            path: committed,
            regions: outcome.regions.into_iter().collect(),
            servers: outcome.servers.into_iter().collect(),
            elapsed: started.elapsed(),
        };
        ctx.status().set_status(format!(
            "Snapshot {} committed to {}",
            completed.description.name,
            completed.path.display()
        ));
        info!(
            target: "tablesnap::snapshot",
            snapshot = %completed.description.name,
            path = %completed.path.display(),
            regions = completed.regions.len(),
            elapsed_ms = completed.elapsed.as_millis() as u64,
            "Snapshot committed"
        );
        Ok(completed)
    }

    fn cleanup<P: SnapshotProcedure + ?Sized>(&self, procedure: &P) {
        if !self.discard_failed_working_dir {
            return;
        }
        let working = procedure.working_directory();
        if let Err(e) = working.discard() {
            warn!(
                target: "tablesnap::snapshot",
                path = %working.path().display(),
                error = %e,
                "Failed to discard working directory"
            );
        }
    }
}

/// Record `err` as the attempt failure and abort the status record
pub(crate) fn abort(ctx: &AttemptContext, err: &Error) -> SnapshotFailure {
    let failure = ctx.fail(err);
    ctx.status().abort(format!(
        "Snapshot of table {} failed because {}",
        ctx.snapshot().table,
        failure
    ));
    failure
}
