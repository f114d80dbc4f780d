//! Tests of the debugging output.
#![cfg(feature = "debug")]

use platoon_sim::{platoon, FundamentalDiagram, ScenarioBuilder};

#[test]
fn records_one_entry_per_vehicle() {
    let fd = FundamentalDiagram::default();
    let mut sim = ScenarioBuilder::new(fd)
        .link(20000.0, 1)
        .lane_vehicles(0, 0, platoon(&fd, 4, 25.0))
        .build()
        .unwrap();
    sim.step();

    let frame = sim.debug();
    let entries = frame.as_array().unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries[0]["gap"].is_null());
    assert_eq!(entries[1]["vehicle"], 1);
}
