use super::TrajBuilder;
use crate::angle::{along_distance, perp_distance};
use crate::error::ReconError;
use crate::hits::PlaneHits;
use crate::params::PassParams;
use crate::traj::{HitOwnership, TrajPoint};

/// Outcome of the hit search at one projected point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(super) struct HitSearch {
    /// Some hit, owned or not, lies inside the big-delta bound.
    pub signal: bool,
}

impl TrajBuilder<'_> {
    /// Delta cut for a candidate with time RMS `rms` (ticks).
    fn delta_cut(&self, tp: &TrajPoint, pass: &PassParams, rms: f32, step: f32) -> f32 {
        let hit_err = pass.hit_err_fac * rms * self.hits.units_per_tick();
        let dang = tp.ang_err * step;
        let err = (hit_err * hit_err + tp.delta_rms * tp.delta_rms + dang * dang).sqrt();
        (self.params.delta_cut_sigmas * err).clamp(self.params.min_delta_cut, self.params.max_delta_cut)
    }

    /// Collects free candidate hits near the projected point `tp`.
    ///
    /// Multiplets are tested through their charge centroid and enter the
    /// candidate list together. The closest free multiplet outside the cut but
    /// inside the big-delta bound is remembered in `big_delta_hit`.
    pub(super) fn add_hits(
        &self,
        owners: &HitOwnership,
        tp: &mut TrajPoint,
        pass: &PassParams,
        step: f32,
        large_angle: bool,
    ) -> HitSearch {
        let center = tp.wire();
        let span = if large_angle { 1 } else { 0 };
        let mut search = HitSearch::default();
        let mut best_big: Option<(usize, f32)> = None;

        for wire in (center - span)..=(center + span) {
            let Some(range) = self.hits.wire_hits(wire).range() else {
                continue;
            };
            let mut idx = range.start;
            while idx < range.end {
                let mult = self.hits.multiplet(idx);
                let first = mult.start.max(idx);
                let next = mult.end.max(idx + 1);
                idx = next;

                let Some((centroid, _)) = self.hits.charge_centroid(first..next) else {
                    continue;
                };
                let max_rms = (first..next)
                    .map(|h| self.hits.hit(h).rms)
                    .fold(0.0f32, f32::max);
                let (perp, along) = PlaneHits::offsets(&centroid, &tp.pos, &tp.dir);
                let along_tol = 0.5 * step + 3.0 * max_rms * self.hits.units_per_tick();
                if along.abs() > along_tol {
                    continue;
                }
                let cut = self.delta_cut(tp, pass, max_rms, step);
                let big = cut * self.params.big_delta_factor;
                if perp <= big {
                    search.signal = true;
                }
                let free: Vec<usize> = (first..next).filter(|&h| owners.is_free(h)).collect();
                if free.is_empty() {
                    continue;
                }
                if perp > cut {
                    if perp <= big && best_big.map_or(true, |(_, d)| perp < d) {
                        best_big = Some((free[0], perp));
                    }
                    continue;
                }
                for h in free {
                    tp.hits.push(h);
                    tp.use_hit.push(false);
                }
            }
        }
        if tp.hits.is_empty() {
            tp.big_delta_hit = best_big.map(|(h, _)| h);
        }
        search
    }

    /// Chooses which candidates of `tp` contribute charge and reserves them.
    ///
    /// Returns `false` when the point has no candidates.
    pub(super) fn find_use_hits(
        &self,
        owners: &mut HitOwnership,
        tp: &mut TrajPoint,
        pass: &PassParams,
        large_angle: bool,
    ) -> Result<bool, ReconError> {
        if tp.hits.is_empty() {
            return Ok(false);
        }

        let chosen: Vec<usize> = if large_angle {
            (0..tp.hits.len()).collect()
        } else {
            self.select_candidates(tp, pass)
        };

        for &k in &chosen {
            owners.reserve(tp.hits[k])?;
            tp.use_hit[k] = true;
        }
        self.set_hit_pos(tp, pass);
        if large_angle && tp.has_charge() {
            slide_to_hits(tp);
        }
        Ok(tp.has_charge())
    }

    /// Best candidate alone, or for a doublet whichever of the closer hit and
    /// the full doublet scores better on delta and charge consistency.
    fn select_candidates(&self, tp: &TrajPoint, pass: &PassParams) -> Vec<usize> {
        let hit_delta = |h: usize| perp_distance(&self.hits.hit_pos(h), &tp.pos, &tp.dir);
        let mut best = 0;
        let mut best_delta = f32::INFINITY;
        for (k, &h) in tp.hits.iter().enumerate() {
            let d = hit_delta(h);
            if d < best_delta {
                best = k;
                best_delta = d;
            }
        }

        let best_hit = tp.hits[best];
        if self.hits.hit(best_hit).multiplicity != 2 {
            return vec![best];
        }
        let mult = self.hits.multiplet(best_hit);
        let pair: Vec<usize> = tp
            .hits
            .iter()
            .enumerate()
            .filter(|(_, h)| mult.contains(*h))
            .map(|(k, _)| k)
            .collect();
        if pair.len() != 2 {
            return vec![best];
        }

        let single = self.figure_of_merit(tp, pass, &[best_hit]);
        let both = self.figure_of_merit(tp, pass, &[tp.hits[pair[0]], tp.hits[pair[1]]]);
        if both < single {
            pair
        } else {
            vec![best]
        }
    }

    /// Lower is better: normalized delta plus weighted charge-ratio deviation.
    fn figure_of_merit(&self, tp: &TrajPoint, pass: &PassParams, hits: &[usize]) -> f32 {
        let Some((pos, chg)) = self.hits.charge_centroid(hits.iter().copied()) else {
            return f32::INFINITY;
        };
        let delta = perp_distance(&pos, &tp.pos, &tp.dir);
        let rms = tp.delta_rms.max(self.params.min_delta_rms);
        let chg_term = if tp.avg_chg > 0.0 {
            (chg / tp.avg_chg - 1.0).abs()
        } else {
            0.0
        };
        delta / rms + pass.charge_ratio_weight * chg_term
    }

    /// Recomputes charge, centroid, position error and delta from the used hits.
    pub(super) fn set_hit_pos(&self, tp: &mut TrajPoint, pass: &PassParams) {
        let used: Vec<usize> = tp.used_hits().collect();
        match self.hits.charge_centroid(used.iter().copied()) {
            Some((pos, chg)) => {
                let max_err = used
                    .iter()
                    .map(|&h| self.hits.hit_time_err(h))
                    .fold(0.0f32, f32::max);
                let err = pass.hit_err_fac * max_err;
                tp.hit_pos = pos;
                tp.chg = chg;
                tp.hit_pos_err2 = err * err;
                tp.delta = tp.hit_delta();
            }
            None => tp.clear_used(),
        }
    }
}

/// Moves a large-angle point along its direction to the longitudinal position
/// of its hit centroid. Successive points then sit on successive hits instead
/// of one unit of path length apart.
fn slide_to_hits(tp: &mut TrajPoint) {
    let along = along_distance(&tp.hit_pos, &tp.pos, &tp.dir);
    tp.pos = [tp.pos[0] + along * tp.dir[0], tp.pos[1] + along * tp.dir[1]];
    tp.delta = tp.hit_delta();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hits::{DetectorGeometry, Hit, PlaneId};
    use crate::params::TrajParams;

    fn plane(hits: Vec<Hit>) -> PlaneHits {
        PlaneHits::new(PlaneId::default(), DetectorGeometry::unit_scale(), 16, 500.0, hits, &[])
            .expect("valid plane")
    }

    fn point_at(pos: [f32; 2], dir: [f32; 2]) -> TrajPoint {
        let mut tp = TrajPoint {
            pos,
            delta_rms: 0.1,
            avg_chg: 100.0,
            ..Default::default()
        };
        tp.set_dir(dir);
        tp
    }

    fn search(plane: &PlaneHits, tp: &mut TrajPoint, large_angle: bool) -> (HitSearch, HitOwnership) {
        let params = TrajParams::default();
        let builder = TrajBuilder::new(plane, &params);
        let pass = params.pass(0).clone();
        let mut owners = HitOwnership::new(plane.len());
        let found = builder.add_hits(&owners, tp, &pass, 1.0, large_angle);
        builder.find_use_hits(&mut owners, tp, &pass, large_angle).unwrap();
        (found, owners)
    }

    #[test]
    fn split_doublet_is_used_whole() {
        let plane = plane(vec![
            Hit::new(5, 49.6, 1.0, 50.0).with_multiplet(2, 0),
            Hit::new(5, 50.4, 1.0, 50.0).with_multiplet(2, 1),
        ]);
        let mut tp = point_at([5.0, 50.0], [1.0, 0.0]);
        let (found, owners) = search(&plane, &mut tp, false);
        assert!(found.signal);
        assert_eq!(tp.n_used(), 2);
        assert!((tp.chg - 100.0).abs() < 1e-3);
        assert!((tp.hit_pos[1] - 50.0).abs() < 1e-4);
        assert!(!owners.is_free(0) && !owners.is_free(1));
    }

    #[test]
    fn doublet_with_a_stray_partner_keeps_the_closer_hit() {
        let plane = plane(vec![
            Hit::new(5, 50.0, 1.0, 100.0).with_multiplet(2, 0),
            Hit::new(5, 51.0, 1.0, 100.0).with_multiplet(2, 1),
        ]);
        let mut tp = point_at([5.0, 50.0], [1.0, 0.0]);
        let (_, owners) = search(&plane, &mut tp, false);
        assert_eq!(tp.hits.len(), 2);
        assert_eq!(tp.used_hits().collect::<Vec<_>>(), vec![0]);
        assert!((tp.chg - 100.0).abs() < 1e-3);
        assert!(!owners.is_free(0));
        assert!(owners.is_free(1));
    }

    #[test]
    fn hit_outside_the_cut_is_signal_but_not_a_candidate() {
        let plane = plane(vec![Hit::new(5, 53.0, 1.0, 100.0)]);
        let mut tp = point_at([5.0, 50.0], [1.0, 0.0]);
        let (found, owners) = search(&plane, &mut tp, false);
        assert!(found.signal);
        assert!(tp.hits.is_empty());
        assert_eq!(tp.big_delta_hit, Some(0));
        assert!(!tp.has_charge());
        assert!(owners.is_free(0));
    }

    #[test]
    fn far_hit_gives_no_signal() {
        let plane = plane(vec![Hit::new(5, 70.0, 1.0, 100.0)]);
        let mut tp = point_at([5.0, 50.0], [1.0, 0.0]);
        let (found, _) = search(&plane, &mut tp, false);
        assert!(!found.signal);
        assert_eq!(tp.big_delta_hit, None);
    }

    #[test]
    fn large_angle_point_slides_onto_its_hit() {
        let plane = plane(vec![Hit::new(5, 52.0, 1.0, 100.0)]);
        let norm = (1.0f32 + 36.0).sqrt();
        let mut tp = point_at([5.0, 50.0], [1.0 / norm, 6.0 / norm]);
        let (_, owners) = search(&plane, &mut tp, true);
        assert!(tp.has_charge());
        assert!(!owners.is_free(0));
        assert!(along_distance(&tp.hit_pos, &tp.pos, &tp.dir).abs() < 1e-4);
        assert!(tp.pos[1] > 51.5);
        assert!((tp.delta - tp.hit_delta()).abs() < 1e-6);
    }
}
