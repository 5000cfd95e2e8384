//! Track-like/shower-like grouping of committed trajectories.
//!
//! Trajectories that pass within `doca_cut` of each other without sharing a
//! vertex are linked in an intersection graph. Each connected component with
//! enough intersection points gets a coarse axis (principal axis of the
//! intersection points); the trajectory reaching furthest along that axis with
//! the smallest angular deviation is the primary, every other member becomes
//! a shower-like secondary with the primary as parent.

use crate::angle::{along_distance, angle_between_dirless, distance};
use crate::driver::GroupContext;
use crate::traj::{principal_axis, AlgFlag, TrajClass, Trajectory};
use log::debug;
use std::collections::VecDeque;

/// Closest approach between the charged points of two trajectories and the
/// midpoint of the closest pair.
pub fn closest_approach(a: &Trajectory, b: &Trajectory) -> Option<(f32, [f32; 2])> {
    let mut best: Option<(f32, [f32; 2])> = None;
    for pa in a.pts.iter().filter(|p| p.has_charge()) {
        for pb in b.pts.iter().filter(|p| p.has_charge()) {
            let d = distance(&pa.pos, &pb.pos);
            if best.map_or(true, |(bd, _)| d < bd) {
                let mid = [(pa.pos[0] + pb.pos[0]) * 0.5, (pa.pos[1] + pb.pos[1]) * 0.5];
                best = Some((d, mid));
            }
        }
    }
    best
}

fn share_vertex(a: &Trajectory, b: &Trajectory) -> bool {
    a.vtx
        .iter()
        .flatten()
        .any(|v| b.vtx.iter().flatten().any(|w| w == v))
}

/// Extent of the trajectory along `axis`, scaled by the cosine of its
/// orientation difference to the axis.
fn axis_score(traj: &Trajectory, origin: &[f32; 2], axis: &[f32; 2]) -> f32 {
    let (lo, hi) = traj
        .pts
        .iter()
        .filter(|p| p.has_charge())
        .map(|p| along_distance(&p.pos, origin, axis))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), s| (lo.min(s), hi.max(s)));
    if lo > hi {
        return 0.0;
    }
    let dev = traj
        .overall_dir()
        .map_or(std::f32::consts::FRAC_PI_2, |d| angle_between_dirless(&d, axis));
    (hi - lo) * dev.cos()
}

/// Labels primaries and secondaries in every intersecting group.
pub fn classify_trajectories(ctx: &mut GroupContext<'_>) {
    let cp = ctx.params.classify.clone();
    if !cp.enabled {
        return;
    }
    let members: Vec<usize> = (0..ctx.trajectories.len())
        .filter(|&i| !ctx.trajectories[i].is_junk())
        .collect();
    let n = members.len();

    let mut adjacency: Vec<Vec<(usize, [f32; 2])>> = vec![Vec::new(); n];
    for a in 0..n {
        for b in (a + 1)..n {
            let ta = &ctx.trajectories[members[a]];
            let tb = &ctx.trajectories[members[b]];
            if share_vertex(ta, tb) {
                continue;
            }
            if let Some((d, mid)) = closest_approach(ta, tb) {
                if d < cp.doca_cut {
                    adjacency[a].push((b, mid));
                    adjacency[b].push((a, mid));
                }
            }
        }
    }

    let mut seen = vec![false; n];
    for start in 0..n {
        if seen[start] || adjacency[start].is_empty() {
            continue;
        }
        seen[start] = true;
        let mut component = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for &(next, _) in &adjacency[node] {
                if !seen[next] {
                    seen[next] = true;
                    component.push(next);
                    queue.push_back(next);
                }
            }
        }

        let points: Vec<([f32; 2], f32)> = component
            .iter()
            .flat_map(|&a| {
                adjacency[a]
                    .iter()
                    .filter(move |(b, _)| a < *b)
                    .map(|(_, mid)| (*mid, 1.0))
            })
            .collect();
        if points.len() < cp.min_intersections {
            continue;
        }
        let Some((origin, axis)) = principal_axis(&points) else {
            continue;
        };

        let mut primary = component[0];
        let mut best_score = f32::NEG_INFINITY;
        for &m in &component {
            let score = axis_score(&ctx.trajectories[members[m]], &origin, &axis);
            if score > best_score {
                best_score = score;
                primary = m;
            }
        }

        let primary_id = ctx.trajectories[members[primary]].id;
        for &m in &component {
            let traj = &mut ctx.trajectories[members[m]];
            if m == primary {
                traj.class = TrajClass::TrackLike;
                traj.parent = None;
                traj.flags.insert(AlgFlag::Primary);
                traj.flags.remove(AlgFlag::Secondary);
            } else {
                traj.class = TrajClass::ShowerLike;
                traj.parent = Some(primary_id);
                traj.flags.insert(AlgFlag::Secondary);
                traj.flags.remove(AlgFlag::Primary);
            }
        }
        ctx.stats.primaries += 1;
        ctx.stats.secondaries += component.len() - 1;
        debug!(
            "{}: primary {:?} with {} secondaries ({} intersections)",
            ctx.hits.plane(),
            primary_id,
            component.len() - 1,
            points.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traj::{TrajPoint, VertexId};

    fn line(from: [f32; 2], to: [f32; 2], n: usize) -> Trajectory {
        let mut t = Trajectory::new(Default::default(), 0);
        let dir = [to[0] - from[0], to[1] - from[1]];
        let len = (dir[0] * dir[0] + dir[1] * dir[1]).sqrt();
        for i in 0..n {
            let f = i as f32 / (n - 1) as f32;
            let pos = [from[0] + f * dir[0], from[1] + f * dir[1]];
            let mut p = TrajPoint {
                pos,
                hit_pos: pos,
                chg: 1.0,
                hits: vec![i],
                use_hit: vec![true],
                ..Default::default()
            };
            p.set_dir([dir[0] / len, dir[1] / len]);
            t.pts.push(p);
        }
        t.set_end_points();
        t
    }

    #[test]
    fn closest_approach_reports_the_midpoint() {
        let a = line([0.0, 0.0], [10.0, 0.0], 11);
        let b = line([5.0, 2.0], [5.0, 10.0], 9);
        let (d, mid) = closest_approach(&a, &b).unwrap();
        assert!((d - 2.0).abs() < 1e-5);
        assert!((mid[0] - 5.0).abs() < 1e-5 && (mid[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shared_vertex_is_detected() {
        let mut a = line([0.0, 0.0], [10.0, 0.0], 11);
        let mut b = line([10.0, 0.0], [10.0, 10.0], 11);
        assert!(!share_vertex(&a, &b));
        a.vtx[1] = Some(VertexId(0));
        b.vtx[0] = Some(VertexId(0));
        assert!(share_vertex(&a, &b));
    }

    #[test]
    fn long_aligned_trajectory_scores_highest() {
        let long = line([0.0, 0.0], [40.0, 0.0], 41);
        let short = line([10.0, 3.0], [15.0, 3.0], 6);
        let cross = line([20.0, -3.0], [22.0, 3.0], 4);
        let axis = [1.0, 0.0];
        let origin = [0.0, 0.0];
        let s_long = axis_score(&long, &origin, &axis);
        assert!(s_long > axis_score(&short, &origin, &axis));
        assert!(s_long > axis_score(&cross, &origin, &axis));
    }
}
