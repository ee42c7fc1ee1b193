//! Prepare, execute, verify and commit through `SnapshotRunner`.

use std::sync::Arc;

use tablesnap::layout::table_info_file_name;
use tablesnap::{
    discover_regions, inspect_snapshot, list_snapshots, read_region_info, DisabledTableSnapshot,
    FailureKind, SnapshotConfig, SnapshotProcedure, SnapshotRunner, TaskRegistry, TaskState,
    CONFIG_FILE_NAME,
};

use crate::common::*;

#[test]
fn committed_snapshot_verifies() {
    let fixture = Fixture::new(3);
    let attempt = fixture.attempt(request("nightly"), fixture.collaborators(), &SnapshotConfig::default());

    let completed = SnapshotRunner::default()
        .take(&attempt, &fixture.locations())
        .unwrap();

    assert_eq!(completed.path, fixture.layout.completed_snapshot_dir("nightly"));
    assert!(!fixture.working_dir("nightly").exists());
    assert_eq!(list_snapshots(&fixture.layout).unwrap(), vec!["nightly".to_string()]);

    let verified = inspect_snapshot(&completed.path).unwrap();
    assert_eq!(verified.description, request("nightly"));
    let mut expected = fixture.regions.clone();
    expected.sort();
    assert_eq!(verified.regions, expected);
    assert_eq!(completed.regions, expected);

    let descriptor = std::fs::read(completed.path.join(table_info_file_name(1))).unwrap();
    assert_eq!(descriptor, b"{\"families\":[\"cf\"]}");

    for region in &fixture.regions {
        let dir = completed.path.join(region.encoded_name());
        assert_eq!(&read_region_info(&dir).unwrap(), region);
    }
}

#[test]
fn failed_attempt_leaves_nothing_behind() {
    let fixture = Fixture::new(2);
    let mut collaborators = fixture.collaborators();
    collaborators.references = Arc::new(FailingReferences {
        fail_for: fixture.regions[0].encoded_name(),
    });
    let attempt = fixture.attempt(request("S1"), collaborators, &SnapshotConfig::default());

    let failure = SnapshotRunner::default()
        .take(&attempt, &fixture.locations())
        .unwrap_err();

    assert_eq!(failure.kind(), FailureKind::Collaborator);
    assert!(!fixture.working_dir("S1").exists());
    assert!(!fixture.layout.completed_snapshot_dir("S1").exists());
    assert!(list_snapshots(&fixture.layout).unwrap().is_empty());
}

#[test]
fn failed_attempt_kept_for_inspection() {
    let fixture = Fixture::new(2);
    let config = SnapshotConfig::default().with_discard_failed_working_dir(false);
    let attempt = fixture.attempt(request("S1").with_timeout_ms(0), fixture.collaborators(), &config);

    let failure = SnapshotRunner::new(&config)
        .take(&attempt, &fixture.locations())
        .unwrap_err();

    assert!(failure.is_timeout());
    assert!(fixture.working_dir("S1").join(".snapshotinfo").is_file());
}

#[test]
fn retry_after_failure_replaces_stale_working_dir() {
    let fixture = Fixture::new(2);
    let config = SnapshotConfig::default().with_discard_failed_working_dir(false);
    let mut collaborators = fixture.collaborators();
    collaborators.references = Arc::new(FailingReferences {
        fail_for: fixture.regions[1].encoded_name(),
    });
    let broken = fixture.attempt(request("S1"), collaborators, &config);
    assert!(SnapshotRunner::new(&config)
        .take(&broken, &fixture.locations())
        .is_err());

    let retry = fixture.attempt(request("S1"), fixture.collaborators(), &config);
    let completed = SnapshotRunner::new(&config)
        .take(&retry, &fixture.locations())
        .unwrap();
    assert_eq!(completed.regions.len(), 2);
    assert_eq!(retry.context().status().state(), TaskState::Complete);
}

#[test]
fn registry_tracks_attempts() {
    let fixture = Fixture::new(1);
    let registry = TaskRegistry::new();
    let config = SnapshotConfig::default();

    let ok = DisabledTableSnapshot::with_context(
        fixture.layout.clone(),
        fixture.collaborators(),
        registry.begin(request("ok")),
        &config,
    );
    SnapshotRunner::new(&config)
        .take(&ok, &fixture.locations())
        .unwrap();

    let bad = DisabledTableSnapshot::with_context(
        fixture.layout.clone(),
        fixture.collaborators(),
        registry.begin(request("ok")),
        &config,
    );
    assert!(SnapshotRunner::new(&config)
        .take(&bad, &fixture.locations())
        .is_err());

    let states: Vec<TaskState> = registry.tasks().iter().map(|t| t.state()).collect();
    assert_eq!(states, vec![TaskState::Complete, TaskState::Aborted]);
    assert_eq!(registry.purge_finished(), 2);
    assert!(registry.is_empty());
}

#[test]
fn discovered_regions_and_config_file() {
    let fixture = Fixture::new(5);
    let path = fixture.layout.root().join(CONFIG_FILE_NAME);
    SnapshotConfig::default()
        .with_region_workers(3)
        .write_to_file(&path)
        .unwrap();
    let config = SnapshotConfig::from_file(&path).unwrap();

    let locations = discover_regions(&fixture.layout, TABLE, &server(7)).unwrap();
    assert_eq!(locations.len(), 5);

    let attempt = fixture.attempt(request("from-disk"), fixture.collaborators(), &config);
    let completed = SnapshotRunner::new(&config).take(&attempt, &locations).unwrap();
    assert_eq!(completed.servers, vec![server(7)]);
    assert_eq!(completed.regions.len(), 5);
}
