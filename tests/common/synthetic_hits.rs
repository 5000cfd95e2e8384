#![allow(dead_code)]

use traj_walker::{DetectorGeometry, Hit, PlaneHits, PlaneId, PlaneResult, TrajId};

pub const NUM_WIRES: u32 = 64;
pub const MAX_TICK: f32 = 500.0;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One hit per wire in `wires`, at the time given by `time`.
pub fn line_hits(wires: std::ops::RangeInclusive<u32>, time: impl Fn(u32) -> f32) -> Vec<Hit> {
    wide_line_hits(wires, 1.0, time)
}

/// Like [`line_hits`] with a custom time RMS.
pub fn wide_line_hits(wires: std::ops::RangeInclusive<u32>, rms: f32, time: impl Fn(u32) -> f32) -> Vec<Hit> {
    wires.map(|w| Hit::new(w, time(w), rms, 100.0)).collect()
}

/// Builds a unit-scale plane, dropping hits that duplicate another hit on
/// the same wire and time.
pub fn plane_from(hits: Vec<Hit>) -> PlaneHits {
    plane_with_dead_wires(hits, &[])
}

pub fn plane_with_dead_wires(mut hits: Vec<Hit>, dead_wires: &[u32]) -> PlaneHits {
    hits.sort_by(|a, b| a.wire.cmp(&b.wire).then(a.peak_time.total_cmp(&b.peak_time)));
    hits.dedup_by(|a, b| a.wire == b.wire && (a.peak_time - b.peak_time).abs() < 1e-3);
    PlaneHits::new(PlaneId::new(0, 0, 2), DetectorGeometry::unit_scale(), NUM_WIRES, MAX_TICK, hits, dead_wires)
        .expect("synthetic hits stay inside the plane")
}

/// Asserts that every hit is owned by at most one trajectory and that the
/// ownership table matches the hits the trajectories use.
pub fn assert_exclusive_ownership(result: &PlaneResult) {
    let mut seen: Vec<Option<TrajId>> = vec![None; result.hit_owners.len()];
    for traj in &result.trajectories {
        for hit in traj.used_hits() {
            assert!(seen[hit].is_none(), "hit {hit} used by {:?} and {:?}", seen[hit], traj.id);
            seen[hit] = Some(traj.id);
        }
    }
    assert_eq!(seen, result.hit_owners, "ownership table disagrees with trajectories");
}
