//! Failure capture: exactly one failure, aborted status, no table descriptor.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tablesnap::{
    AttemptContext, FailureKind, RecoveredEditsCopier, Result, SnapshotConfig, SnapshotProcedure,
    TaskState,
};

use crate::common::*;

struct FailingEdits;

impl RecoveredEditsCopier for FailingEdits {
    fn copy(
        &self,
        _ctx: &AttemptContext,
        _source: &std::path::Path,
        _dest: &std::path::Path,
    ) -> Result<()> {
        Err(injected("edits unreadable"))
    }
}

#[test]
fn materializer_failure_on_any_region() {
    for workers in [1, 3] {
        for index in 0..3 {
            let fixture = Fixture::new(3);
            let target = fixture.regions[index].encoded_name();
            let mut collaborators = fixture.collaborators();
            collaborators.regions = Arc::new(FailingMaterializer {
                fail_for: target.clone(),
            });
            let calls = CountingTableDescriptor::install(&mut collaborators, &fixture.layout);
            let config = SnapshotConfig::default().with_region_workers(workers);
            let attempt = fixture.attempt(request("S1"), collaborators, &config);
            attempt.prepare().unwrap();

            let failure = attempt.run(&fixture.locations()).unwrap_err();

            assert!(failure.message().contains("materialize region failed"));
            assert!(failure.message().contains(&target));
            assert_eq!(attempt.context().status().state(), TaskState::Aborted);
            assert_eq!(calls.load(Ordering::SeqCst), 0, "workers={} index={}", workers, index);
        }
    }
}

#[test]
fn edits_failure_is_annotated_with_step() {
    let fixture = Fixture::new(1);
    let mut collaborators = fixture.collaborators();
    collaborators.edits = Arc::new(FailingEdits);
    let calls = CountingTableDescriptor::install(&mut collaborators, &fixture.layout);
    let attempt = fixture.attempt(request("S1"), collaborators, &SnapshotConfig::default());
    attempt.prepare().unwrap();

    let failure = attempt.run(&fixture.locations()).unwrap_err();

    assert_eq!(failure.kind(), FailureKind::Collaborator);
    assert!(failure
        .message()
        .starts_with("Failed snapshot { ss=S1 table=T type=DISABLED } due to exception:"));
    assert!(failure.message().contains("copy recovered edits failed"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn concurrent_failures_keep_the_first() {
    let fixture = Fixture::new(2);
    let first = fixture.regions[1].encoded_name();
    let second = fixture.regions[0].encoded_name();
    let mut collaborators = fixture.collaborators();
    collaborators.regions = Arc::new(OrderedFailures {
        first: first.clone(),
        second: second.clone(),
    });
    let calls = CountingTableDescriptor::install(&mut collaborators, &fixture.layout);
    let config = SnapshotConfig::default().with_region_workers(2);
    let attempt = fixture.attempt(request("S1"), collaborators, &config);
    attempt.prepare().unwrap();

    let failure = attempt.run(&fixture.locations()).unwrap_err();

    assert!(failure.message().contains("first failure"));
    assert!(failure.message().contains(&first));
    assert!(!failure.message().contains("second failure"));
    assert_eq!(attempt.context().monitor().failure(), Some(failure));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn repeated_runs_agree_on_first_failure() {
    // Same ordering, same winner
    let mut messages = Vec::new();
    for _ in 0..5 {
        let fixture = Fixture::new(4);
        let first = fixture.regions[3].encoded_name();
        let second = fixture.regions[0].encoded_name();
        let mut collaborators = fixture.collaborators();
        collaborators.regions = Arc::new(OrderedFailures { first, second });
        let config = SnapshotConfig::default().with_region_workers(4);
        let attempt = fixture.attempt(request("S1"), collaborators, &config);
        attempt.prepare().unwrap();
        let failure = attempt.run(&fixture.locations()).unwrap_err();
        messages.push(failure.message().to_string());
    }
    messages.dedup();
    assert_eq!(messages.len(), 1);
}

#[test]
fn interrupt_before_run() {
    let fixture = Fixture::new(2);
    let mut collaborators = fixture.collaborators();
    let calls = CountingTableDescriptor::install(&mut collaborators, &fixture.layout);
    let attempt = fixture.attempt(request("S1"), collaborators, &SnapshotConfig::default());
    attempt.prepare().unwrap();
    assert!(attempt.interrupt("shutting down"));

    let failure = attempt.run(&fixture.locations()).unwrap_err();

    assert_eq!(failure.kind(), FailureKind::Interrupted);
    assert!(failure.message().contains("shutting down"));
    assert!(region_dirs(&fixture.working_dir("S1")).is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn empty_location_list_is_rejected() {
    let fixture = Fixture::new(1);
    let attempt = fixture.attempt(request("S1"), fixture.collaborators(), &SnapshotConfig::default());
    attempt.prepare().unwrap();

    let failure = attempt.run(&[]).unwrap_err();

    assert_eq!(failure.kind(), FailureKind::Collaborator);
    assert!(failure.message().contains("no region locations"));
    assert_eq!(attempt.context().status().state(), TaskState::Aborted);
}
