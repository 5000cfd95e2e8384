use super::TrajBuilder;
use crate::angle::unit;
use crate::error::ReconError;
use crate::traj::{fit_points, HitOwnership, TrajPoint, Trajectory};

impl TrajBuilder<'_> {
    /// Two hits overlap in time within `seed_time_sigmas` of their summed RMS.
    pub fn seed_compatible(&self, ihit: usize, jhit: usize) -> bool {
        let a = self.hits.hit(ihit);
        let b = self.hits.hit(jhit);
        let window = self.params.seed_time_sigmas * (a.rms + b.rms);
        (a.peak_time - b.peak_time).abs() <= window
    }

    /// Builds the two-point seed trajectory and reserves both hits.
    ///
    /// Returns `None` when either hit is taken or the two hits coincide.
    pub(super) fn start_traj(
        &self,
        owners: &mut HitOwnership,
        ihit: usize,
        jhit: usize,
        pass: usize,
    ) -> Result<Option<Trajectory>, ReconError> {
        if ihit == jhit || !owners.is_free(ihit) || !owners.is_free(jhit) {
            return Ok(None);
        }
        let pi = self.hits.hit_pos(ihit);
        let pj = self.hits.hit_pos(jhit);
        let Some(dir) = unit([pj[0] - pi[0], pj[1] - pi[1]]) else {
            return Ok(None);
        };
        let seed_len = ((pj[0] - pi[0]).powi(2) + (pj[1] - pi[1]).powi(2)).sqrt();
        let pass_params = self.params.pass(pass);

        let qi = self.hits.hit_charge(ihit);
        let qj = self.hits.hit_charge(jhit);
        let avg_chg = 0.5 * (qi + qj);

        let mut work = Trajectory::new(self.hits.plane(), pass);
        work.step_dir = if dir[0] >= 0.0 { 1 } else { -1 };
        for (step, (hit, pos, chg)) in [(ihit, pi, qi), (jhit, pj, qj)].into_iter().enumerate() {
            let err = pass_params.hit_err_fac * self.hits.hit_time_err(hit);
            let mut tp = TrajPoint {
                pos,
                hit_pos: pos,
                hit_pos_err2: err * err,
                ang_err: std::f32::consts::SQRT_2 * err / seed_len.max(1.0),
                hits: vec![hit],
                use_hit: vec![true],
                n_fit: step + 1,
                chg,
                avg_chg,
                chg_ratio: 1.0,
                delta_rms: self.params.min_delta_rms,
                step,
                ..Default::default()
            };
            tp.set_dir(dir);
            work.pts.push(tp);
        }
        owners.reserve(ihit)?;
        owners.reserve(jhit)?;
        work.set_end_points();
        Ok(Some(work))
    }

    /// Refits the last point over the widest allowed window. Used after the
    /// trajectory is reversed so the walk back starts from a full-length fit
    /// instead of the two-point seed direction.
    pub(super) fn refit_end(&self, work: &mut Trajectory) {
        let charged = work.charged_indices();
        let Some(&last) = charged.last() else {
            return;
        };
        let n_fit = charged.len().min(self.params.max_pts_fit);
        let window = &charged[charged.len() - n_fit..];
        let Some(fit) = fit_points(&work.pts, window, &work.pts[last]) else {
            return;
        };
        let tp = &mut work.pts[last];
        tp.pos = fit.pos;
        tp.set_dir(fit.dir);
        tp.ang_err = fit.ang_err;
        tp.n_fit = fit.n_used;
        tp.fit_chi = fit.chi_dof;
        work.pts.truncate(last + 1);
    }
}
