use super::flags::{AlgFlag, AlgFlags};
use super::point::TrajPoint;
use super::vertex::VertexId;
use crate::angle::{distance, unit};
use crate::error::ReconError;
use crate::hits::PlaneId;
use serde::{Deserialize, Serialize};

/// Identifier of a committed trajectory. IDs start at 1; `TrajId(0)` marks a
/// trajectory still being built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrajId(pub u32);

impl TrajId {
    pub const WORK: TrajId = TrajId(0);
}

/// Coarse particle-topology tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrajClass {
    #[default]
    Undetermined,
    TrackLike,
    ShowerLike,
}

/// Ordered path of trajectory points through one plane.
///
/// `end_pt` bounds the first and last point with charge. Points outside that
/// range carry no charge.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trajectory {
    pub id: TrajId,
    pub pts: Vec<TrajPoint>,
    /// +1 when stepping towards higher wires, -1 otherwise.
    pub step_dir: i8,
    pub plane: PlaneId,
    pub pass: usize,
    pub end_pt: [usize; 2],
    pub vtx: [Option<VertexId>; 2],
    pub class: TrajClass,
    pub parent: Option<TrajId>,
    pub flags: AlgFlags,
}

impl Trajectory {
    pub fn new(plane: PlaneId, pass: usize) -> Self {
        Self {
            id: TrajId::WORK,
            pts: Vec::new(),
            step_dir: 1,
            plane,
            pass,
            end_pt: [0, 0],
            vtx: [None, None],
            class: TrajClass::Undetermined,
            parent: None,
            flags: AlgFlags::default(),
        }
    }

    /// Recomputes `end_pt` from the points with charge.
    pub fn set_end_points(&mut self) {
        let first = self.pts.iter().position(|p| p.has_charge());
        let last = self.pts.iter().rposition(|p| p.has_charge());
        self.end_pt = match (first, last) {
            (Some(f), Some(l)) => [f, l],
            _ => [0, 0],
        };
    }

    pub fn n_pts_with_charge(&self) -> usize {
        self.pts.iter().filter(|p| p.has_charge()).count()
    }

    pub fn charged_indices(&self) -> Vec<usize> {
        self.pts
            .iter()
            .enumerate()
            .filter(|(_, p)| p.has_charge())
            .map(|(i, _)| i)
            .collect()
    }

    /// Point at end 0 or 1.
    pub fn end_point(&self, end: usize) -> &TrajPoint {
        &self.pts[self.end_pt[end.min(1)]]
    }

    /// Every used hit, in point order.
    pub fn used_hits(&self) -> Vec<usize> {
        self.pts.iter().flat_map(|p| p.used_hits()).collect()
    }

    pub fn is_junk(&self) -> bool {
        self.flags.contains(AlgFlag::Junk)
    }

    /// Distance between the two end points.
    pub fn length(&self) -> f32 {
        if self.pts.is_empty() {
            return 0.0;
        }
        distance(&self.end_point(0).pos, &self.end_point(1).pos)
    }

    /// Unit vector from end 0 to end 1.
    pub fn overall_dir(&self) -> Option<[f32; 2]> {
        if self.pts.is_empty() {
            return None;
        }
        let a = self.end_point(0).pos;
        let b = self.end_point(1).pos;
        unit([b[0] - a[0], b[1] - a[1]])
    }

    /// Index of the charged point closest to `pos` and its distance.
    pub fn closest_point(&self, pos: &[f32; 2]) -> Option<(usize, f32)> {
        self.pts
            .iter()
            .enumerate()
            .filter(|(_, p)| p.has_charge())
            .map(|(i, p)| (i, distance(&p.pos, pos)))
            .fold(None, |best, cur| match best {
                Some((_, d)) if d <= cur.1 => best,
                _ => Some(cur),
            })
    }

    /// Reverses point order and directions so the last point becomes the first.
    pub fn reverse(&mut self) {
        self.pts.reverse();
        let max_step = self.pts.iter().map(|p| p.step).max().unwrap_or(0);
        for p in &mut self.pts {
            let dir = [-p.dir[0], -p.dir[1]];
            p.set_dir(dir);
            p.step = max_step - p.step;
        }
        self.step_dir = -self.step_dir;
        self.vtx.swap(0, 1);
        self.set_end_points();
    }

    /// Verifies the per-point parallel arrays and the end-point bounds.
    pub fn check_consistency(&self) -> Result<(), ReconError> {
        for (i, p) in self.pts.iter().enumerate() {
            if p.hits.len() != p.use_hit.len() {
                return Err(ReconError::ParallelArrayMismatch {
                    point: i,
                    hits: p.hits.len(),
                    flags: p.use_hit.len(),
                });
            }
        }
        if self.end_pt[0] > self.end_pt[1] {
            return Err(ReconError::EndPointsOutOfOrder {
                id: self.id,
                first: self.end_pt[0],
                last: self.end_pt[1],
            });
        }
        if !self.pts.is_empty() && self.end_pt[1] >= self.pts.len() {
            return Err(ReconError::PointIndexOutOfRange {
                index: self.end_pt[1],
                len: self.pts.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(pos: [f32; 2], chg: f32, step: usize) -> TrajPoint {
        let mut p = TrajPoint {
            pos,
            hit_pos: pos,
            chg,
            step,
            ..Default::default()
        };
        p.set_dir([1.0, 0.0]);
        if chg > 0.0 {
            p.hits = vec![step];
            p.use_hit = vec![true];
        }
        p
    }

    #[test]
    fn end_points_bound_charged_points() {
        let mut t = Trajectory::new(PlaneId::default(), 0);
        t.pts = vec![
            point([0.0, 0.0], 0.0, 0),
            point([1.0, 0.0], 5.0, 1),
            point([2.0, 0.0], 5.0, 2),
            point([3.0, 0.0], 0.0, 3),
        ];
        t.set_end_points();
        assert_eq!(t.end_pt, [1, 2]);
        assert_eq!(t.n_pts_with_charge(), 2);
        assert!(t.check_consistency().is_ok());
        assert!((t.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn reverse_flips_order_direction_and_vertices() {
        let mut t = Trajectory::new(PlaneId::default(), 0);
        t.pts = vec![point([0.0, 0.0], 1.0, 0), point([1.0, 0.0], 1.0, 1)];
        t.vtx = [Some(VertexId(3)), None];
        t.set_end_points();
        t.reverse();
        assert_eq!(t.pts[0].pos, [1.0, 0.0]);
        assert_eq!(t.pts[0].dir, [-1.0, 0.0]);
        assert_eq!(t.pts[0].step, 0);
        assert_eq!(t.vtx, [None, Some(VertexId(3))]);
        assert_eq!(t.step_dir, -1);
    }

    #[test]
    fn mismatched_arrays_are_reported() {
        let mut t = Trajectory::new(PlaneId::default(), 0);
        let mut p = point([0.0, 0.0], 1.0, 0);
        p.use_hit.push(false);
        t.pts = vec![p];
        assert!(matches!(
            t.check_consistency(),
            Err(ReconError::ParallelArrayMismatch { point: 0, .. })
        ));
    }
}
