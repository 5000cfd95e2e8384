use super::attach;
use crate::driver::GroupContext;
use crate::error::ReconError;
use crate::traj::{AlgFlag, Trajectory, VertexId};
use log::debug;

/// Splits trajectory `it` after point `ipt`.
///
/// The original keeps points `..=ipt`; the tail moves to a new trajectory
/// with a fresh ID, takes over the original's end-1 vertex, and inherits its
/// pass and flags. Ownership of the tail hits is reassigned. Returns the
/// index of the new trajectory, or `None` when either side would have fewer
/// than `min_split_pts` points with charge.
pub fn split_traj(ctx: &mut GroupContext<'_>, it: usize, ipt: usize) -> Result<Option<usize>, ReconError> {
    let min_pts = ctx.params.vertex.min_split_pts.max(1);
    let traj = ctx
        .trajectories
        .get(it)
        .ok_or(ReconError::PointIndexOutOfRange {
            index: it,
            len: ctx.trajectories.len(),
        })?;
    if ipt >= traj.pts.len() {
        return Err(ReconError::PointIndexOutOfRange {
            index: ipt,
            len: traj.pts.len(),
        });
    }
    let head = traj.pts[..=ipt].iter().filter(|p| p.has_charge()).count();
    let tail = traj.pts[ipt + 1..].iter().filter(|p| p.has_charge()).count();
    if head < min_pts || tail < min_pts {
        return Ok(None);
    }

    let new_id = ctx.next_traj_id();
    let old = &mut ctx.trajectories[it];
    let old_id = old.id;
    let mut fresh = Trajectory::new(old.plane, old.pass);
    fresh.id = new_id;
    fresh.pts = old.pts.split_off(ipt + 1);
    fresh.step_dir = old.step_dir;
    fresh.vtx = [None, old.vtx[1].take()];
    fresh.flags = old.flags;
    fresh.flags.insert(AlgFlag::Split);
    old.flags.insert(AlgFlag::Split);
    old.set_end_points();
    fresh.set_end_points();

    for hit in fresh.used_hits() {
        ctx.owners.reassign(hit, old_id, new_id)?;
    }
    debug!(
        "{}: split {:?} after point {} into {:?}",
        ctx.hits.plane(),
        old_id,
        ipt,
        new_id
    );
    ctx.trajectories.push(fresh);
    ctx.stats.splits += 1;
    Ok(Some(ctx.trajectories.len() - 1))
}

/// Attaches trajectories passing near vertex `vid`, except those in `skip`.
///
/// A trajectory whose closest charged point lies within its pass's vertex
/// tolerance is attached by the near end when that point is within
/// `end_pt_slack` charged points of the end; otherwise it is split at that
/// point and both new ends are attached.
pub fn attach_nearby(ctx: &mut GroupContext<'_>, vid: VertexId, skip: &[usize]) -> Result<(), ReconError> {
    let Some(vpos) = ctx.vertices.get(vid.0 as usize).map(|v| v.pos) else {
        return Ok(());
    };
    let slack = ctx.params.vertex.end_pt_slack;
    let n_before = ctx.trajectories.len();

    for it in 0..n_before {
        if skip.contains(&it) {
            continue;
        }
        let traj = &ctx.trajectories[it];
        if traj.is_junk() || traj.vtx.contains(&Some(vid)) {
            continue;
        }
        let tol = ctx.params.pass(traj.pass).vtx_end_tol;
        let Some((ipt, d)) = traj.closest_point(&vpos) else {
            continue;
        };
        if d > tol {
            continue;
        }
        let charged = traj.charged_indices();
        let Some(k) = charged.iter().position(|&i| i == ipt) else {
            continue;
        };
        let near_end = if k <= slack {
            Some(0)
        } else if charged.len() - 1 - k <= slack {
            Some(1)
        } else {
            None
        };
        match near_end {
            Some(end) => {
                if traj.vtx[end].is_none() {
                    attach(ctx, vid, it, end);
                }
            }
            None => {
                if let Some(fresh) = split_traj(ctx, it, ipt)? {
                    attach(ctx, vid, it, 1);
                    attach(ctx, vid, fresh, 0);
                }
            }
        }
    }
    Ok(())
}
