use crate::angle::{along_distance, distance, unit};
use crate::driver::GroupContext;
use crate::error::ReconError;
use crate::hits::PlaneHits;
use crate::params::TrajParams;
use crate::traj::{principal_axis, AlgFlag, HitOwnership, TrajPoint, Trajectory};
use log::debug;
use std::collections::VecDeque;

/// Groups free hits by transitive closure: two hits join when they sit on the
/// same or neighbouring wires within `proximity` of each other.
pub fn group_free_hits(hits: &PlaneHits, owners: &HitOwnership, proximity: f32) -> Vec<Vec<usize>> {
    let mut seen = vec![false; hits.len()];
    let mut groups = Vec::new();
    for start in 0..hits.len() {
        if seen[start] || !owners.is_free(start) {
            continue;
        }
        seen[start] = true;
        let mut group = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(idx) = queue.pop_front() {
            let pos = hits.hit_pos(idx);
            let wire = hits.hit(idx).wire as i64;
            for w in (wire - 1)..=(wire + 1) {
                let Some(range) = hits.wire_hits(w).range() else {
                    continue;
                };
                for other in range {
                    if seen[other] || !owners.is_free(other) {
                        continue;
                    }
                    if distance(&pos, &hits.hit_pos(other)) <= proximity {
                        seen[other] = true;
                        group.push(other);
                        queue.push_back(other);
                    }
                }
            }
        }
        groups.push(group);
    }
    groups
}

/// One-shot trajectory over a hit group.
///
/// Groups large enough for a line fit are binned in path length along their
/// principal axis, one point per occupied bin; smaller groups keep one point
/// per hit. Returns `None` when fewer than two points result. The hits are
/// marked used but not reserved.
pub fn junk_trajectory(hits: &PlaneHits, params: &TrajParams, group: &[usize]) -> Option<Trajectory> {
    let jp = &params.junk;
    if group.len() < jp.min_hits.max(2) {
        return None;
    }
    let cloud: Vec<([f32; 2], f32)> = group
        .iter()
        .map(|&h| (hits.hit_pos(h), hits.hit_charge(h)))
        .collect();

    let (origin, axis) = if group.len() >= jp.line_fit_min_hits {
        principal_axis(&cloud)?
    } else {
        let a = cloud[0].0;
        let b = cloud[cloud.len() - 1].0;
        let mut dir = unit([b[0] - a[0], b[1] - a[1]]).unwrap_or([1.0, 0.0]);
        if dir[0] < 0.0 {
            dir = [-dir[0], -dir[1]];
        }
        (a, dir)
    };

    let mut placed: Vec<(f32, usize)> = group
        .iter()
        .map(|&h| (along_distance(&hits.hit_pos(h), &origin, &axis), h))
        .collect();
    placed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let bins: Vec<Vec<usize>> = if group.len() >= jp.line_fit_min_hits {
        let s_min = placed[0].0;
        let bin_len = jp.bin_len.max(1e-3);
        let mut bins: Vec<(i64, Vec<usize>)> = Vec::new();
        for (s, h) in &placed {
            let bin = ((s - s_min) / bin_len).floor() as i64;
            match bins.last_mut() {
                Some((b, members)) if *b == bin => members.push(*h),
                _ => bins.push((bin, vec![*h])),
            }
        }
        bins.into_iter().map(|(_, members)| members).collect()
    } else {
        placed.iter().map(|(_, h)| vec![*h]).collect()
    };
    if bins.len() < 2 {
        return None;
    }

    let pass = params.n_passes().saturating_sub(1);
    let pass_params = params.pass(pass);
    let mut work = Trajectory::new(hits.plane(), pass);
    work.step_dir = if axis[0] >= 0.0 { 1 } else { -1 };
    let total: f32 = cloud.iter().map(|(_, q)| q).sum();
    let avg_chg = total / bins.len() as f32;

    for (step, members) in bins.into_iter().enumerate() {
        let (pos, chg) = hits.charge_centroid(members.iter().copied())?;
        let max_err = members
            .iter()
            .map(|&h| hits.hit_time_err(h))
            .fold(0.0f32, f32::max);
        let err = pass_params.hit_err_fac * max_err;
        let s = along_distance(&pos, &origin, &axis);
        let mut tp = TrajPoint {
            pos: [origin[0] + s * axis[0], origin[1] + s * axis[1]],
            hit_pos: pos,
            hit_pos_err2: err * err,
            use_hit: vec![true; members.len()],
            hits: members,
            chg,
            avg_chg,
            chg_ratio: if avg_chg > 0.0 { chg / avg_chg } else { 1.0 },
            step,
            ..Default::default()
        };
        tp.set_dir(axis);
        tp.delta = tp.hit_delta();
        tp.n_fit = cloud.len();
        work.pts.push(tp);
    }
    work.flags.insert(AlgFlag::Junk);
    work.set_end_points();
    Some(work)
}

/// Salvages leftover free hits into low-confidence trajectories.
pub fn find_junk_trajectories(ctx: &mut GroupContext<'_>) -> Result<(), ReconError> {
    if !ctx.params.junk.enabled {
        return Ok(());
    }
    let groups = group_free_hits(ctx.hits, &ctx.owners, ctx.params.junk.proximity);
    for group in groups {
        let Some(work) = junk_trajectory(ctx.hits, ctx.params, &group) else {
            continue;
        };
        for hit in work.used_hits() {
            ctx.owners.reserve(hit)?;
        }
        let id = ctx.commit(work)?;
        ctx.stats.junk += 1;
        debug!("{}: junk trajectory {:?} from {} hits", ctx.hits.plane(), id, group.len());
    }
    Ok(())
}
