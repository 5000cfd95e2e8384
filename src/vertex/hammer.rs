use super::{add_vertex, attach, split_traj};
use crate::angle::{angle_between_dirless, distance};
use crate::driver::GroupContext;
use crate::error::ReconError;
use crate::traj::{AlgFlag, VertexTopology};
use log::debug;

/// Struck point of a hammer candidate.
struct Strike {
    traj: usize,
    point: usize,
    doca: f32,
}

/// Finds free trajectory ends landing inside another trajectory and splits
/// the struck trajectory there, forming a three-way vertex.
///
/// The charged points within `hammer_end_excl` of either end of the struck
/// trajectory are not scanned, and the two directions must differ by more
/// than `hammer_ang_cut` (orientation only).
pub fn find_hammer_vertices(ctx: &mut GroupContext<'_>) -> Result<(), ReconError> {
    let vp = ctx.params.vertex.clone();
    let mut ia = 0;
    while ia < ctx.trajectories.len() {
        for end in 0..2 {
            let ta = &ctx.trajectories[ia];
            if ta.is_junk() || ta.pts.is_empty() || ta.vtx[end].is_some() {
                continue;
            }
            let ep = ta.end_point(end).pos;
            let other_end = ta.end_point(1 - end).pos;
            let dir_a = ta.end_point(end).dir;

            let Some(strike) = closest_interior_point(ctx, ia, &ep, vp.hammer_end_excl) else {
                continue;
            };
            if strike.doca >= vp.hammer_doca {
                continue;
            }
            let struck = &ctx.trajectories[strike.traj].pts[strike.point];
            let struck_pos = struck.pos;
            if distance(&other_end, &struck_pos) <= strike.doca {
                continue;
            }
            if angle_between_dirless(&dir_a, &struck.dir) <= vp.hammer_ang_cut {
                continue;
            }
            let Some(fresh) = split_traj(ctx, strike.traj, strike.point)? else {
                continue;
            };
            let err = ctx.trajectories[ia].end_point(end).hit_pos_err2.sqrt().max(strike.doca);
            let vid = add_vertex(ctx, struck_pos, [err, err], VertexTopology::Hammer);
            attach(ctx, vid, strike.traj, 1);
            attach(ctx, vid, fresh, 0);
            attach(ctx, vid, ia, end);
            ctx.trajectories[ia].flags.insert(AlgFlag::Hammer);
            ctx.stats.hammers += 1;
            debug!(
                "{}: hammer vertex {:?}: {:?} strikes {:?} at ({:.1}, {:.1})",
                ctx.hits.plane(),
                vid,
                ctx.trajectories[ia].id,
                ctx.trajectories[strike.traj].id,
                struck_pos[0],
                struck_pos[1]
            );
        }
        ia += 1;
    }
    Ok(())
}

fn closest_interior_point(ctx: &GroupContext<'_>, skip: usize, pos: &[f32; 2], excl: usize) -> Option<Strike> {
    let mut best: Option<Strike> = None;
    for (ib, tb) in ctx.trajectories.iter().enumerate() {
        if ib == skip || tb.is_junk() {
            continue;
        }
        let charged = tb.charged_indices();
        if charged.len() < 2 * excl + 1 {
            continue;
        }
        for &ipt in &charged[excl..charged.len() - excl] {
            let d = distance(&tb.pts[ipt].pos, pos);
            if best.as_ref().map_or(true, |b| d < b.doca) {
                best = Some(Strike {
                    traj: ib,
                    point: ipt,
                    doca: d,
                });
            }
        }
    }
    best
}
