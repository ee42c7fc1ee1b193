//! Deadline enforcement for one snapshot attempt
//!
//! A `TimeoutGuard` owns a single waiter thread:
//! - `start()` spawns it; it sleeps on a condvar until the deadline
//! - `complete()` wakes it and joins it; after that the guard cannot fire
//! - expiry delivers a timeout failure to the attempt's `ErrorMonitor`
//!
//! Firing and completion both transition `state` under the same lock, so
//! exactly one of them wins.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use tablesnap_core::{
    AttemptContext, Error, ErrorMonitor, Result, SnapshotDescription, SnapshotFailure,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
    Idle,
    Running,
    Fired,
    Completed,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<GuardState>,
    wake: Condvar,
    snapshot: SnapshotDescription,
    monitor: Arc<ErrorMonitor>,
    deadline: Duration,
}

impl Shared {
    /// Deliver the timeout. Caller holds `state` and has seen `Running` or `Idle`.
    fn fire(&self, state: &mut GuardState, elapsed: Duration) {
        *state = GuardState::Fired;
        let failure = SnapshotFailure::timeout(&self.snapshot, elapsed, self.deadline);
        warn!(
            target: "tablesnap::timeout",
            snapshot = %self.snapshot.name,
            elapsed_ms = elapsed.as_millis() as u64,
            deadline_ms = self.deadline.as_millis() as u64,
            "Snapshot deadline elapsed"
        );
        self.monitor.receive(failure);
    }
}

/// One-shot deadline bound to an error monitor
pub struct TimeoutGuard {
    shared: Arc<Shared>,
    started_at: Mutex<Option<Instant>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TimeoutGuard {
    /// Guard delivering into `monitor` on behalf of `snapshot`
    pub fn new(
        snapshot: SnapshotDescription,
        monitor: Arc<ErrorMonitor>,
        deadline: Duration,
    ) -> Self {
        TimeoutGuard {
            shared: Arc::new(Shared {
                state: Mutex::new(GuardState::Idle),
                wake: Condvar::new(),
                snapshot,
                monitor,
                deadline,
            }),
            started_at: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    /// Guard for the attempt behind `ctx`
    pub fn for_context(ctx: &AttemptContext, deadline: Duration) -> Self {
        Self::new(ctx.snapshot().clone(), Arc::clone(ctx.monitor()), deadline)
    }

    /// Configured deadline
    pub fn deadline(&self) -> Duration {
        self.shared.deadline
    }

    /// Arm the guard.
    ///
    /// Fails if the guard was already started, fired or completed.
    pub fn start(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        if *state != GuardState::Idle {
            return Err(Error::invalid_operation(format!(
                "timeout guard for snapshot {} already {:?}",
                self.shared.snapshot.name, *state
            )));
        }

        let started = Instant::now();
        if self.shared.deadline.is_zero() {
            self.shared.fire(&mut state, Duration::ZERO);
            *self.started_at.lock() = Some(started);
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let handle = std::thread::Builder::new()
            .name(format!("tablesnap-timeout-{}", self.shared.snapshot.name))
            .spawn(move || wait_for_deadline(&shared, started))?;

        *state = GuardState::Running;
        *self.started_at.lock() = Some(started);
        *self.handle.lock() = Some(handle);
        debug!(
            target: "tablesnap::timeout",
            snapshot = %self.shared.snapshot.name,
            deadline_ms = self.shared.deadline.as_millis() as u64,
            "Timeout guard armed"
        );
        Ok(())
    }

    /// Disarm the guard and wait for its thread. Safe to call repeatedly.
    pub fn complete(&self) {
        {
            let mut state = self.shared.state.lock();
            if matches!(*state, GuardState::Idle | GuardState::Running) {
                *state = GuardState::Completed;
            }
            self.shared.wake.notify_all();
        }
        if let Some(handle) = self.handle.lock().take() {
            // A panicked waiter has nothing left to deliver
            let _ = handle.join();
        }
    }

    /// Fire now, unless already fired or completed. Returns whether it fired.
    pub fn trigger(&self) -> bool {
        let mut state = self.shared.state.lock();
        if !matches!(*state, GuardState::Idle | GuardState::Running) {
            return false;
        }
        let elapsed = self
            .started_at
            .lock()
            .map(|s| s.elapsed())
            .unwrap_or_default();
        self.shared.fire(&mut state, elapsed);
        self.shared.wake.notify_all();
        true
    }

    /// Whether the deadline failure was delivered
    pub fn has_fired(&self) -> bool {
        *self.shared.state.lock() == GuardState::Fired
    }
}

fn wait_for_deadline(shared: &Shared, started: Instant) {
    let mut state = shared.state.lock();
    loop {
        if *state != GuardState::Running {
            return;
        }
        let elapsed = started.elapsed();
        if elapsed >= shared.deadline {
            shared.fire(&mut state, elapsed);
            return;
        }
        // Spurious wakeups just loop back to the checks above
        shared.wake.wait_for(&mut state, shared.deadline - elapsed);
    }
}

impl Drop for TimeoutGuard {
    fn drop(&mut self) {
        self.complete();
    }
}

impl std::fmt::Debug for TimeoutGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutGuard")
            .field("snapshot", &self.shared.snapshot.name)
            .field("deadline", &self.shared.deadline)
            .field("state", &*self.shared.state.lock())
            .finish()
    }
}
