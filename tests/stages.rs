mod common;

use common::synthetic_hits::{init_logger, line_hits, plane_from};
use traj_walker::stages::{build_trajectories, find_junk_trajectories, resolve_vertices};
use traj_walker::{GroupContext, TrajParams};

#[test]
fn vertexing_twice_changes_nothing() {
    init_logger();
    let mut hits = line_hits(0..=10, |w| 2.0 * w as f32);
    hits.extend(line_hits(10..=20, |w| 20.0 - (w as f32 - 10.0)));
    let plane = plane_from(hits);
    let params = TrajParams::default();

    let mut ctx = GroupContext::new(&plane, &params);
    build_trajectories(&mut ctx).unwrap();
    find_junk_trajectories(&mut ctx).unwrap();
    resolve_vertices(&mut ctx).unwrap();

    let n_traj = ctx.trajectories.len();
    let vertices: Vec<_> = ctx.vertices.iter().map(|v| (v.id, v.pos, v.n_traj)).collect();
    let links: Vec<_> = ctx.trajectories.iter().map(|t| (t.id, t.vtx)).collect();
    assert!(!vertices.is_empty());

    resolve_vertices(&mut ctx).unwrap();
    assert_eq!(ctx.trajectories.len(), n_traj);
    assert_eq!(ctx.vertices.iter().map(|v| (v.id, v.pos, v.n_traj)).collect::<Vec<_>>(), vertices);
    assert_eq!(ctx.trajectories.iter().map(|t| (t.id, t.vtx)).collect::<Vec<_>>(), links);
    ctx.check().unwrap();
}

#[test]
fn disabled_vertexing_leaves_ends_free() {
    init_logger();
    let mut hits = line_hits(0..=10, |w| 2.0 * w as f32);
    hits.extend(line_hits(10..=20, |w| 20.0 - (w as f32 - 10.0)));
    let plane = plane_from(hits);
    let mut params = TrajParams::default();
    params.vertex.enabled = false;

    let mut ctx = GroupContext::new(&plane, &params);
    build_trajectories(&mut ctx).unwrap();
    resolve_vertices(&mut ctx).unwrap();
    assert!(ctx.vertices.is_empty());
    assert!(ctx.trajectories.iter().all(|t| t.vtx == [None, None]));
}

#[test]
fn committed_trajectories_own_their_hits() {
    init_logger();
    let plane = plane_from(line_hits(10..=20, |w| 3.0 * w as f32 + 5.0));
    let params = TrajParams::default();
    let mut ctx = GroupContext::new(&plane, &params);
    build_trajectories(&mut ctx).unwrap();

    assert_eq!(ctx.stats.accepted, 1);
    let traj = &ctx.trajectories[0];
    for hit in traj.used_hits() {
        assert_eq!(ctx.owners.owner(hit), traj_walker::traj::HitOwner::Owned(traj.id));
    }
    ctx.check().unwrap();
}
