//! Quality control applied while and after a trajectory is stepped: kink
//! detection, masked-hit recovery, acceptance, tail trimming, and salvage of
//! leftover hits.

mod junk;

pub use junk::{find_junk_trajectories, group_free_hits, junk_trajectory};

use crate::angle::angle_between;
use crate::params::TrajParams;
use crate::traj::{fit_points, AlgFlag, HitOwnership, TrajPoint, Trajectory};
use log::debug;

/// Releases the used hits of one point and clears its charge. Candidates stay
/// listed, so the point reads as masked.
pub fn release_point(owners: &mut HitOwnership, tp: &mut TrajPoint) {
    for hit in tp.used_hits() {
        owners.release(hit);
    }
    tp.clear_used();
}

pub fn release_points(owners: &mut HitOwnership, pts: &mut [TrajPoint]) {
    for tp in pts {
        release_point(owners, tp);
    }
}

/// Drops points after the last point with charge.
pub fn trim_trailing_chargeless(work: &mut Trajectory) {
    work.set_end_points();
    if work.n_pts_with_charge() == 0 {
        work.pts.clear();
        return;
    }
    work.pts.truncate(work.end_pt[1] + 1);
}

/// Releases and removes every point from `from` onwards.
fn cut_tail(owners: &mut HitOwnership, work: &mut Trajectory, from: usize) {
    if from >= work.pts.len() {
        return;
    }
    release_points(owners, &mut work.pts[from..]);
    work.pts.truncate(from);
    trim_trailing_chargeless(work);
}

/// Checks the trailing points for a kink and trims them if one is found.
///
/// The last `fit_pts` charged points are refit on their own and the direction
/// compared with a point `skip_pts` further back. A kink is either an angle
/// above the pass cut, or above half the cut with a significant angle (in
/// units of the refit's angle error) and a good refit chi-square.
pub fn gotta_kink(owners: &mut HitOwnership, work: &mut Trajectory, params: &TrajParams) -> bool {
    let kp = &params.kink;
    let pass = params.pass(work.pass);
    let charged = work.charged_indices();
    let n = charged.len();
    if kp.fit_pts < 2 || n < kp.min_pts.max(kp.fit_pts + kp.skip_pts + 1) {
        return false;
    }
    let window = &charged[n - kp.fit_pts..];
    let last = charged[n - 1];
    let Some(fit) = fit_points(&work.pts, window, &work.pts[last]) else {
        return false;
    };
    let ref_idx = charged[n - 1 - kp.fit_pts - kp.skip_pts];
    let dang = angle_between(&fit.dir, &work.pts[ref_idx].dir);

    let hard = dang > pass.kink_ang_cut;
    let soft = dang > 0.5 * pass.kink_ang_cut
        && fit.ang_err > 0.0
        && dang / fit.ang_err > kp.significance
        && fit.chi_dof < kp.max_chi;
    if !hard && !soft {
        return false;
    }

    let trim = kp.trim_pts.clamp(1, n - 1);
    let from = charged[n - trim];
    cut_tail(owners, work, from);
    if let Some(tp) = work.pts.last_mut() {
        tp.kink_ang = dang;
    }
    work.flags.insert(AlgFlag::Kink);
    debug!("kink angle {:.3} rad, trimmed {} points", dang, trim);
    true
}

/// Masked-hit recovery test on the trailing points of a walk.
///
/// A point is masked when it has candidates but no charge, and skipped when it
/// has no charge at all. Recovery is wanted when enough points are masked and
/// either the trajectory is short or masked points make up a small enough
/// share of the skipped ones.
pub fn needs_recovery(work: &Trajectory, params: &TrajParams) -> bool {
    let rp = &params.recovery;
    let tail_start = work.pts.len().saturating_sub(rp.check_pts);
    let tail = &work.pts[tail_start..];
    let masked = tail
        .iter()
        .filter(|p| !p.hits.is_empty() && !p.has_charge())
        .count();
    let skipped = tail.iter().filter(|p| !p.has_charge()).count();
    if masked < rp.min_masked.max(1) {
        return false;
    }
    work.n_pts_with_charge() < rp.short_traj_pts
        || masked as f32 / skipped as f32 <= rp.max_masked_density
}

/// Minimum charged-point count of the trajectory's pass.
pub fn accepts(work: &Trajectory, params: &TrajParams) -> bool {
    work.n_pts_with_charge() >= params.pass(work.pass).min_pts
}

/// Trims irregular tails at both ends of an accepted trajectory.
pub fn trim_end_pts(owners: &mut HitOwnership, work: &mut Trajectory, params: &TrajParams) {
    trim_tail(owners, work, params);
    work.reverse();
    trim_tail(owners, work, params);
    work.reverse();
}

/// Removes up to `max_tail_pts` trailing charged points that follow a step
/// gap or whose fit chi-square jumps above the body median.
fn trim_tail(owners: &mut HitOwnership, work: &mut Trajectory, params: &TrajParams) {
    let tp = &params.trim;
    let charged = work.charged_indices();
    let n = charged.len();
    if tp.max_tail_pts == 0 || n < tp.max_tail_pts + 3 {
        return;
    }
    let tail = n - tp.max_tail_pts;

    for k in tail.max(1)..n {
        let gap = work.pts[charged[k]].step.abs_diff(work.pts[charged[k - 1]].step);
        if gap > tp.max_step_gap {
            cut_tail(owners, work, charged[k]);
            work.flags.insert(AlgFlag::TrimGap);
            return;
        }
    }

    let mut body: Vec<f32> = charged[..tail].iter().map(|&i| work.pts[i].fit_chi).collect();
    body.sort_by(|a, b| a.total_cmp(b));
    let median = body[body.len() / 2];
    let limit = (tp.max_chi_ratio * median).max(tp.min_chi);
    if let Some(k) = (tail..n).find(|&k| work.pts[charged[k]].fit_chi > limit) {
        cut_tail(owners, work, charged[k]);
        work.flags.insert(AlgFlag::TrimChi);
    }
}
