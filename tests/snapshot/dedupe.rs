//! Duplicate placement input must not change the output.

use proptest::prelude::*;

use tablesnap::{distinct_locations, RegionLocation, SnapshotConfig, SnapshotProcedure};

use crate::common::*;

#[test]
fn duplicate_regions_produce_identical_output() {
    let fixture = Fixture::new(3);

    let once = fixture.attempt(request("once"), fixture.collaborators(), &SnapshotConfig::default());
    once.prepare().unwrap();
    let once_outcome = once.run(&fixture.locations()).unwrap();

    let mut doubled: Vec<RegionLocation> = fixture.locations();
    doubled.push((fixture.regions[1].clone(), server(1)));
    doubled.push((fixture.regions[2].clone(), server(2)));
    doubled.push((fixture.regions[0].clone(), server(1)));
    let twice = fixture.attempt(request("twice"), fixture.collaborators(), &SnapshotConfig::default());
    twice.prepare().unwrap();
    let twice_outcome = twice.run(&doubled).unwrap();

    assert_eq!(once_outcome.regions, twice_outcome.regions);
    assert_eq!(twice_outcome.servers.len(), 2);

    let strip = |paths: Vec<String>| -> Vec<String> {
        paths.into_iter().filter(|p| p != ".snapshotinfo").collect()
    };
    assert_eq!(
        strip(tree(&fixture.working_dir("once"))),
        strip(tree(&fixture.working_dir("twice")))
    );
}

fn location(region: u8, server_id: u8) -> RegionLocation {
    (
        tablesnap::RegionInfo::new(TABLE, vec![region], vec![region + 1], 1),
        server(server_id as u16),
    )
}

proptest! {
    #[test]
    fn dedupe_is_idempotent(input in prop::collection::vec((0u8..16, 0u8..3), 1..40)) {
        let locations: Vec<RegionLocation> =
            input.iter().map(|&(r, s)| location(r, s)).collect();
        let (regions, servers) = distinct_locations(&locations).unwrap();

        // Each distinct region once, in order
        let mut expected: Vec<u8> = input.iter().map(|&(r, _)| r).collect();
        expected.sort();
        expected.dedup();
        prop_assert_eq!(regions.len(), expected.len());

        // Feeding the input twice changes nothing
        let mut doubled = locations.clone();
        doubled.extend(locations.iter().cloned());
        let (regions2, servers2) = distinct_locations(&doubled).unwrap();
        prop_assert_eq!(regions, regions2);
        prop_assert_eq!(servers, servers2);
    }
}
