use super::TrajBuilder;
use crate::angle::distance;
use crate::error::ReconError;
use crate::hits::WireHits;
use crate::params::PassParams;
use crate::quality;
use crate::traj::{fit_points, AlgFlag, HitOwnership, Trajectory};
use log::{debug, warn};

impl TrajBuilder<'_> {
    /// Walks the work trajectory away from its last point until a stopping
    /// condition fires or the step ceiling is reached.
    ///
    /// Trailing points without charge are left in place; the caller inspects
    /// them for masked-hit recovery before trimming.
    pub(super) fn step(
        &self,
        owners: &mut HitOwnership,
        work: &mut Trajectory,
    ) -> Result<(), ReconError> {
        let pass = self.params.pass(work.pass).clone();
        let large_cos = pass.large_angle_cos();

        for _ in 0..self.params.max_steps {
            let Some(last) = work.pts.last() else {
                return Ok(());
            };
            let large_angle = last.dir[0].abs() < large_cos;
            let step = if large_angle {
                1.0
            } else {
                let target = last.pos[0].round() + last.dir[0].signum();
                (target - last.pos[0]) / last.dir[0]
            };
            let mut tp = last.projected(step);
            if !self.hits.in_range(&tp.pos) {
                return Ok(());
            }

            let search = self.add_hits(owners, &mut tp, &pass, step, large_angle);
            let used = self.find_use_hits(owners, &mut tp, &pass, large_angle)?;
            work.pts.push(tp);
            let ipt = work.pts.len() - 1;
            if used {
                self.update_traj(owners, work, ipt, &pass);
            }

            if work.pts[ipt].has_charge() {
                work.set_end_points();
                if quality::gotta_kink(owners, work, self.params) {
                    debug!("kink at step {}, stopping", work.pts.last().map_or(0, |p| p.step));
                    return Ok(());
                }
            } else {
                let signal = search.signal || !work.pts[ipt].hits.is_empty();
                if self.gap_exceeded(work, ipt, &pass, signal, large_angle) {
                    return Ok(());
                }
            }
        }
        warn!(
            "walk stopped at the step ceiling ({} steps)",
            self.params.max_steps
        );
        Ok(())
    }

    /// Skipped wires between point `ipt` and the last point with charge exceed
    /// the pass tolerance. At large angle the path length is converted to
    /// missing hits using the observed spacing of the charged points.
    fn gap_exceeded(
        &self,
        work: &Trajectory,
        ipt: usize,
        pass: &PassParams,
        signal: bool,
        large_angle: bool,
    ) -> bool {
        let Some(last_chg) = work.pts[..ipt].iter().rposition(|p| p.has_charge()) else {
            return true;
        };
        let from = &work.pts[last_chg];
        let here = &work.pts[ipt];
        let gap = if large_angle {
            let dead = self.hits.dead_wires_between(from.pos[0], here.pos[0]);
            distance(&from.pos, &here.pos) / self.hit_spacing(work, last_chg) - dead as f32
        } else {
            let dw = (here.wire() - from.wire()).unsigned_abs() as usize;
            let mut dead = self.hits.dead_wires_between(from.pos[0], here.pos[0]);
            if self.hits.wire_hits(here.wire()) == WireHits::Dead {
                dead += 1;
            }
            dw.saturating_sub(dead) as f32
        };
        let limit = if signal {
            pass.max_wire_skip_with_signal
        } else {
            pass.max_wire_skip_no_signal
        };
        gap > limit as f32
    }

    /// Mean path length between successive charged points up to `upto`,
    /// never below one wire spacing.
    fn hit_spacing(&self, work: &Trajectory, upto: usize) -> f32 {
        let recent: Vec<[f32; 2]> = work.pts[..=upto]
            .iter()
            .rev()
            .filter(|p| p.has_charge())
            .take(self.params.max_pts_fit.max(2))
            .map(|p| p.pos)
            .collect();
        if recent.len() < 2 {
            return 1.0;
        }
        let total: f32 = recent.windows(2).map(|w| distance(&w[0], &w[1])).sum();
        (total / (recent.len() - 1) as f32).max(1.0)
    }

    /// Refits the trajectory at the new point `ipt`.
    ///
    /// The fit window grows by one point per step up to `max_pts_fit`. When
    /// the chi-square is too high the window shrinks down to the pass minimum;
    /// if that still fails the point's hits are released and masked.
    fn update_traj(
        &self,
        owners: &mut HitOwnership,
        work: &mut Trajectory,
        ipt: usize,
        pass: &PassParams,
    ) {
        let charged = work.charged_indices();
        let n_chg = charged.len();
        let prev_fit = work.pts[..ipt]
            .iter()
            .rev()
            .find(|p| p.has_charge())
            .map_or(1, |p| p.n_fit);
        let floor = pass.min_pts_fit.max(2).min(n_chg);
        let mut n_fit = (prev_fit + 1).min(n_chg).min(self.params.max_pts_fit).max(floor);

        loop {
            let window = &charged[n_chg - n_fit..];
            match fit_points(&work.pts, window, &work.pts[ipt]) {
                Some(fit) if fit.chi_dof <= pass.max_chi => {
                    let tp = &mut work.pts[ipt];
                    tp.pos = fit.pos;
                    tp.set_dir(fit.dir);
                    tp.ang_err = fit.ang_err;
                    tp.n_fit = fit.n_used;
                    tp.fit_chi = fit.chi_dof;
                    tp.delta = tp.hit_delta();
                    break;
                }
                _ if n_fit > floor => {
                    n_fit -= 1;
                    work.flags.insert(AlgFlag::FitShrunk);
                }
                _ => {
                    quality::release_point(owners, &mut work.pts[ipt]);
                    work.flags.insert(AlgFlag::ChiMask);
                    return;
                }
            }
        }
        self.update_delta_rms(work, ipt);
        self.update_charge(work, ipt);
    }

    fn update_delta_rms(&self, work: &mut Trajectory, ipt: usize) {
        let n_fit = work.pts[ipt].n_fit;
        let deltas: Vec<f32> = work.pts[..=ipt]
            .iter()
            .rev()
            .filter(|p| p.has_charge())
            .take(n_fit)
            .map(|p| p.delta)
            .collect();
        let rms = if deltas.is_empty() {
            0.0
        } else {
            (deltas.iter().map(|d| d * d).sum::<f32>() / deltas.len() as f32).sqrt()
        };
        work.pts[ipt].delta_rms = rms.max(self.params.min_delta_rms);
    }

    /// Charge ratio against the average of the previous charged points, then
    /// the running average including this point.
    fn update_charge(&self, work: &mut Trajectory, ipt: usize) {
        let window = self.params.chg_avg_pts.max(1);
        let prev: Vec<f32> = work.pts[..ipt]
            .iter()
            .rev()
            .filter(|p| p.has_charge())
            .take(window)
            .map(|p| p.chg)
            .collect();
        let chg = work.pts[ipt].chg;
        let prev_avg = if prev.is_empty() {
            chg
        } else {
            prev.iter().sum::<f32>() / prev.len() as f32
        };
        let n = prev.len().min(window - 1);
        let avg = (prev.iter().take(n).sum::<f32>() + chg) / (n + 1) as f32;
        let tp = &mut work.pts[ipt];
        tp.chg_ratio = if prev_avg > 0.0 { chg / prev_avg } else { 1.0 };
        tp.avg_chg = avg;
    }
}
