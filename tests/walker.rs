mod common;

use common::synthetic_hits::{
    assert_exclusive_ownership, init_logger, line_hits, plane_from, plane_with_dead_wires,
    wide_line_hits,
};
use traj_walker::angle::distance;
use traj_walker::traj::AlgFlag;
use traj_walker::{PlaneHits, PlaneResult, TrajClusterer, TrajParams};

fn run(plane: &PlaneHits) -> PlaneResult {
    TrajClusterer::new(TrajParams::default()).reconstruct_plane(plane)
}

/// Flat for wires 0..=10, then rising 0.6 ticks per wire up to wire 20.
fn kinked_plane() -> PlaneHits {
    let time = |w: u32| 50.0 + 0.6 * w.saturating_sub(10) as f32;
    plane_from(wide_line_hits(0..=20, 2.0, time))
}

fn steep_track_is_one_trajectory(slope: f32) {
    init_logger();
    let plane = plane_from(wide_line_hits(10..=25, 0.4 * slope, |w| slope * w as f32 - 30.0));
    let result = run(&plane);

    assert!(result.aborted.is_none());
    assert_eq!(result.trajectories.len(), 1, "slope {slope}: {:#?}", result.trajectories);
    let traj = &result.trajectories[0];
    assert_eq!(traj.n_pts_with_charge(), 16);
    assert_eq!(traj.pass, 0);
    assert_eq!(result.n_owned_hits(), 16);
    assert_exclusive_ownership(&result);
}

#[test]
fn steep_track_at_slope_six() {
    steep_track_is_one_trajectory(6.0);
}

#[test]
fn steep_track_at_slope_ten() {
    steep_track_is_one_trajectory(10.0);
}

#[test]
fn walk_crosses_dead_wires() {
    init_logger();
    let hits = line_hits(5..=25, |w| 2.0 * w as f32 + 10.0)
        .into_iter()
        .filter(|h| !(12..=14).contains(&h.wire))
        .collect::<Vec<_>>();
    assert_eq!(hits.len(), 18);

    let result = run(&plane_with_dead_wires(hits.clone(), &[12, 13, 14]));
    assert!(result.aborted.is_none());
    assert_eq!(result.trajectories.len(), 1);
    assert_eq!(result.trajectories[0].n_pts_with_charge(), 18);
    assert_exclusive_ownership(&result);

    // The same gap on live wires breaks the track.
    let live = run(&plane_from(hits));
    assert!(live.trajectories.len() >= 2);
    assert!(live.trajectories.iter().all(|t| t.n_pts_with_charge() < 18));
}

#[test]
fn masked_tail_escalates_to_the_next_pass() {
    init_logger();
    let mut hits = line_hits(6..=13, |_| 50.0);
    hits.extend(line_hits(0..=5, |w| if w % 2 == 0 { 50.3 } else { 49.7 }));
    let plane = plane_from(hits);
    let mut params = TrajParams::default();
    params.passes[0].max_chi = 0.01;

    let result = TrajClusterer::new(params).reconstruct_plane(&plane);
    assert!(result.aborted.is_none());
    assert_eq!(result.trajectories.len(), 1, "{:#?}", result.trajectories);
    let traj = &result.trajectories[0];
    assert_eq!(traj.pass, 1);
    assert_eq!(traj.n_pts_with_charge(), 14);
    assert!(traj.flags.contains(AlgFlag::Recovered));
    assert!(traj.flags.contains(AlgFlag::ChiMask));
    assert!(result.stats.escalations > 0);
    assert_exclusive_ownership(&result);
}

#[test]
fn reverse_walk_picks_up_hits_behind_the_seed() {
    init_logger();
    let hits = line_hits(0..=20, |w| 2.0 * w as f32 + 10.0)
        .into_iter()
        .filter(|h| h.wire != 19)
        .collect::<Vec<_>>();
    let plane = plane_from(hits);

    let result = run(&plane);
    assert!(result.aborted.is_none());
    assert_eq!(result.trajectories.len(), 1);
    let traj = &result.trajectories[0];
    assert_eq!(traj.n_pts_with_charge(), 20);
    assert!(traj.flags.contains(AlgFlag::ReverseProp));
    assert_exclusive_ownership(&result);

    let params = TrajParams {
        reverse_propagate: false,
        ..TrajParams::default()
    };
    let forward_only = TrajClusterer::new(params).reconstruct_plane(&plane);
    assert_eq!(forward_only.trajectories.len(), 1);
    let traj = &forward_only.trajectories[0];
    assert_eq!(traj.n_pts_with_charge(), 19);
    assert!(!traj.flags.contains(AlgFlag::ReverseProp));
    // Sorted by wire, the wire-20 hit is last.
    assert_eq!(forward_only.hit_owners[19], None);
}

#[test]
fn kink_splits_the_track_and_joins_the_pieces_at_a_vertex() {
    init_logger();
    let result = run(&kinked_plane());
    assert!(result.aborted.is_none());

    let real: Vec<_> = result.trajectories.iter().filter(|t| !t.is_junk()).collect();
    assert_eq!(real.len(), 2, "{:#?}", result.trajectories);
    assert!(real.iter().any(|t| t.flags.contains(AlgFlag::Kink)));
    assert!(result.stats.kinks >= 1);
    assert_eq!(result.n_owned_hits(), 21);

    let vtx = result
        .vertices
        .iter()
        .min_by(|a, b| distance(&a.pos, &[10.0, 50.0]).total_cmp(&distance(&b.pos, &[10.0, 50.0])))
        .expect("a vertex at the kink");
    assert!(distance(&vtx.pos, &[10.0, 50.0]) < 2.0, "vertex at {:?}", vtx.pos);
    assert_exclusive_ownership(&result);
}

#[test]
fn kink_with_zero_trim_count_from_config() {
    init_logger();
    let params: TrajParams = serde_json::from_str(r#"{ "kink": { "trim_pts": 0 } }"#).unwrap();
    let result = TrajClusterer::new(params).reconstruct_plane(&kinked_plane());
    assert!(result.aborted.is_none());
    assert!(result.stats.kinks >= 1);
    assert_exclusive_ownership(&result);
}
