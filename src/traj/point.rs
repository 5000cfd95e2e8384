use crate::angle::{angle_of, perp_distance};
use serde::Serialize;

/// One step of a trajectory: a fitted position and direction plus the hits
/// found near it.
///
/// `hits` and `use_hit` are parallel arrays: `hits[i]` is a candidate hit
/// index into the plane collection and `use_hit[i]` says whether it
/// contributes charge. `chg` is zero exactly when no candidate is used.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajPoint {
    /// Fitted position (wire, scaled time).
    pub pos: [f32; 2],
    /// Charge-weighted position of the used hits.
    pub hit_pos: [f32; 2],
    /// Squared position error of `hit_pos`.
    pub hit_pos_err2: f32,
    /// Unit direction along the step direction.
    pub dir: [f32; 2],
    pub ang: f32,
    pub ang_err: f32,
    pub hits: Vec<usize>,
    pub use_hit: Vec<bool>,
    /// Closest candidate outside the delta cut but inside the big-delta bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub big_delta_hit: Option<usize>,
    /// Points used in the fit that produced `pos`/`dir`.
    pub n_fit: usize,
    pub fit_chi: f32,
    pub chg: f32,
    pub avg_chg: f32,
    pub chg_ratio: f32,
    /// Distance of `hit_pos` from the fitted line.
    pub delta: f32,
    pub delta_rms: f32,
    pub kink_ang: f32,
    /// Step counter; successive points differ by one unless steps were merged.
    pub step: usize,
}

impl TrajPoint {
    pub fn has_charge(&self) -> bool {
        self.chg > 0.0
    }

    pub fn wire(&self) -> i64 {
        self.pos[0].round() as i64
    }

    pub fn used_hits(&self) -> impl Iterator<Item = usize> + '_ {
        self.hits
            .iter()
            .zip(self.use_hit.iter())
            .filter(|(_, used)| **used)
            .map(|(hit, _)| *hit)
    }

    pub fn n_used(&self) -> usize {
        self.use_hit.iter().filter(|u| **u).count()
    }

    pub fn set_dir(&mut self, dir: [f32; 2]) {
        self.dir = dir;
        self.ang = angle_of(&dir);
    }

    /// New point one step ahead of `self`, carrying direction, fit and
    /// charge history but no hits.
    pub fn projected(&self, step: f32) -> TrajPoint {
        TrajPoint {
            pos: [
                self.pos[0] + self.dir[0] * step,
                self.pos[1] + self.dir[1] * step,
            ],
            hit_pos: [0.0, 0.0],
            hit_pos_err2: 0.0,
            dir: self.dir,
            ang: self.ang,
            ang_err: self.ang_err,
            hits: Vec::new(),
            use_hit: Vec::new(),
            big_delta_hit: None,
            n_fit: self.n_fit,
            fit_chi: self.fit_chi,
            chg: 0.0,
            avg_chg: self.avg_chg,
            chg_ratio: 0.0,
            delta: 0.0,
            delta_rms: self.delta_rms,
            kink_ang: 0.0,
            step: self.step + 1,
        }
    }

    /// Distance of the hit centroid from this point's line.
    pub fn hit_delta(&self) -> f32 {
        perp_distance(&self.hit_pos, &self.pos, &self.dir)
    }

    /// Marks every candidate unused and clears the charge.
    pub(crate) fn clear_used(&mut self) {
        for used in &mut self.use_hit {
            *used = false;
        }
        self.chg = 0.0;
        self.chg_ratio = 0.0;
        self.delta = 0.0;
    }
}
