use super::geometry::DetectorGeometry;
use crate::angle::{along_distance, perp_distance};
use crate::error::ReconError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

/// Floor applied to hit charge so a used hit always carries charge.
const MIN_CHARGE: f32 = 1e-3;

/// Identifies one (cryostat, TPC, plane) processing group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlaneId {
    pub cryostat: u16,
    pub tpc: u16,
    pub plane: u16,
}

impl PlaneId {
    pub fn new(cryostat: u16, tpc: u16, plane: u16) -> Self {
        Self {
            cryostat,
            tpc,
            plane,
        }
    }

    /// Compact group code carried by trajectories and vertices.
    pub fn code(&self) -> u32 {
        self.cryostat as u32 * 1000 + self.tpc as u32 * 10 + self.plane as u32
    }
}

impl fmt::Display for PlaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}:T{}:P{}", self.cryostat, self.tpc, self.plane)
    }
}

fn default_multiplicity() -> u16 {
    1
}

/// Reconstructed signal pulse on one wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub wire: u32,
    /// Peak time in ticks.
    pub peak_time: f32,
    /// Time width in ticks.
    pub rms: f32,
    /// Integrated charge.
    pub integral: f32,
    /// Number of hits resolved from the same waveform.
    #[serde(default = "default_multiplicity")]
    pub multiplicity: u16,
    /// Position of this hit inside its multiplet (time ordered).
    #[serde(default)]
    pub local_index: u16,
}

impl Hit {
    pub fn new(wire: u32, peak_time: f32, rms: f32, integral: f32) -> Self {
        Self {
            wire,
            peak_time,
            rms,
            integral,
            multiplicity: 1,
            local_index: 0,
        }
    }

    pub fn with_multiplet(mut self, multiplicity: u16, local_index: u16) -> Self {
        self.multiplicity = multiplicity.max(1);
        self.local_index = local_index;
        self
    }
}

/// Per-wire lookup state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireHits {
    /// Wire is known to be unresponsive.
    Dead,
    /// Live wire without hits.
    Empty,
    /// Hits `first..end` of the sorted collection lie on this wire.
    Range { first: usize, end: usize },
}

impl WireHits {
    pub fn range(&self) -> Option<Range<usize>> {
        match *self {
            WireHits::Range { first, end } => Some(first..end),
            _ => None,
        }
    }
}

/// Hits of one processing group, sorted by wire then by time, with an O(1)
/// per-wire index.
#[derive(Clone, Debug)]
pub struct PlaneHits {
    plane: PlaneId,
    geometry: DetectorGeometry,
    units_per_tick: f32,
    num_wires: u32,
    max_tick: f32,
    hits: Vec<Hit>,
    wires: Vec<WireHits>,
}

impl PlaneHits {
    /// Sorts the hits and builds the wire index. Dead wires keep the
    /// [`WireHits::Dead`] state even if hits were reported on them.
    pub fn new(
        plane: PlaneId,
        geometry: DetectorGeometry,
        num_wires: u32,
        max_tick: f32,
        mut hits: Vec<Hit>,
        dead_wires: &[u32],
    ) -> Result<Self, ReconError> {
        if let Some(bad) = hits.iter().find(|h| h.wire >= num_wires) {
            return Err(ReconError::WireOutOfRange {
                wire: bad.wire,
                num_wires,
            });
        }
        hits.sort_by(|a, b| {
            a.wire.cmp(&b.wire).then(
                a.peak_time
                    .partial_cmp(&b.peak_time)
                    .unwrap_or(Ordering::Equal),
            )
        });

        let mut wires = vec![WireHits::Empty; num_wires as usize];
        let mut idx = 0;
        while idx < hits.len() {
            let wire = hits[idx].wire;
            let first = idx;
            while idx < hits.len() && hits[idx].wire == wire {
                idx += 1;
            }
            wires[wire as usize] = WireHits::Range { first, end: idx };
        }
        for &dead in dead_wires {
            if let Some(slot) = wires.get_mut(dead as usize) {
                *slot = WireHits::Dead;
            }
        }

        Ok(Self {
            plane,
            geometry,
            units_per_tick: geometry.units_per_tick(),
            num_wires,
            max_tick,
            hits,
            wires,
        })
    }

    pub fn plane(&self) -> PlaneId {
        self.plane
    }

    pub fn geometry(&self) -> &DetectorGeometry {
        &self.geometry
    }

    pub fn units_per_tick(&self) -> f32 {
        self.units_per_tick
    }

    pub fn num_wires(&self) -> u32 {
        self.num_wires
    }

    pub fn max_tick(&self) -> f32 {
        self.max_tick
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    pub fn hit(&self, idx: usize) -> &Hit {
        &self.hits[idx]
    }

    /// Wire state; wires outside the plane read as dead.
    pub fn wire_hits(&self, wire: i64) -> WireHits {
        if wire < 0 {
            return WireHits::Dead;
        }
        self.wires
            .get(wire as usize)
            .copied()
            .unwrap_or(WireHits::Dead)
    }

    /// First and last wire carrying at least one hit.
    pub fn wire_span(&self) -> Option<(u32, u32)> {
        Some((self.hits.first()?.wire, self.hits.last()?.wire))
    }

    /// Hit position in (wire, scaled time) units.
    pub fn hit_pos(&self, idx: usize) -> [f32; 2] {
        let hit = &self.hits[idx];
        [hit.wire as f32, hit.peak_time * self.units_per_tick]
    }

    /// Integrated charge of a hit, floored at a small positive value.
    pub fn hit_charge(&self, idx: usize) -> f32 {
        self.hits[idx].integral.max(MIN_CHARGE)
    }

    /// Time-direction position error of a hit before the per-pass error scale.
    pub fn hit_time_err(&self, idx: usize) -> f32 {
        self.hits[idx].rms * self.units_per_tick
    }

    /// Range of hits resolved from the same waveform as `idx`.
    pub fn multiplet(&self, idx: usize) -> Range<usize> {
        let hit = &self.hits[idx];
        let Some(wire_range) = self.wire_hits(hit.wire as i64).range() else {
            return idx..idx + 1;
        };
        if hit.multiplicity <= 1 {
            return idx..idx + 1;
        }
        let start = idx
            .saturating_sub(hit.local_index as usize)
            .max(wire_range.start);
        let end = (start + hit.multiplicity as usize).min(wire_range.end);
        if idx < start || idx >= end {
            idx..idx + 1
        } else {
            start..end
        }
    }

    /// Charge-weighted centroid and total charge of a hit range.
    pub fn charge_centroid(&self, hits: impl IntoIterator<Item = usize>) -> Option<([f32; 2], f32)> {
        let mut sum_q = 0.0f32;
        let mut pos = [0.0f32, 0.0];
        for idx in hits {
            let p = self.hit_pos(idx);
            let q = self.hit_charge(idx);
            pos[0] += q * p[0];
            pos[1] += q * p[1];
            sum_q += q;
        }
        if sum_q <= 0.0 {
            return None;
        }
        Some(([pos[0] / sum_q, pos[1] / sum_q], sum_q))
    }

    /// True if `pos` lies inside the plane's wire and time range.
    pub fn in_range(&self, pos: &[f32; 2]) -> bool {
        pos[0] > -0.5
            && pos[0] < self.num_wires as f32 - 0.5
            && pos[1] >= 0.0
            && pos[1] <= self.max_tick * self.units_per_tick
    }

    /// Number of dead wires strictly between two wire positions.
    pub fn dead_wires_between(&self, a: f32, b: f32) -> usize {
        let lo = a.min(b).round() as i64;
        let hi = a.max(b).round() as i64;
        ((lo + 1)..hi)
            .filter(|&w| self.wire_hits(w) == WireHits::Dead)
            .count()
    }

    /// True if any hit, owned or not, lies within `tol` of `pos` on the
    /// nearest wire or one of its neighbours.
    pub fn signal_near(&self, pos: &[f32; 2], tol: f32) -> bool {
        let center = pos[0].round() as i64;
        for wire in (center - 1)..=(center + 1) {
            let Some(range) = self.wire_hits(wire).range() else {
                continue;
            };
            for idx in range {
                let hp = self.hit_pos(idx);
                let dw = hp[0] - pos[0];
                let dt = hp[1] - pos[1];
                if (dw * dw + dt * dt).sqrt() <= tol {
                    return true;
                }
            }
        }
        false
    }

    /// Perpendicular and longitudinal offsets of `pos` from a line.
    pub(crate) fn offsets(pos: &[f32; 2], origin: &[f32; 2], dir: &[f32; 2]) -> (f32, f32) {
        (perp_distance(pos, origin, dir), along_distance(pos, origin, dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(hits: Vec<Hit>, dead: &[u32]) -> PlaneHits {
        PlaneHits::new(
            PlaneId::new(0, 0, 2),
            DetectorGeometry::unit_scale(),
            16,
            1000.0,
            hits,
            dead,
        )
        .expect("valid plane")
    }

    #[test]
    fn hits_are_sorted_and_indexed_by_wire() {
        let p = plane(
            vec![
                Hit::new(3, 40.0, 1.0, 10.0),
                Hit::new(1, 20.0, 1.0, 10.0),
                Hit::new(3, 10.0, 1.0, 10.0),
            ],
            &[5],
        );
        assert_eq!(p.hit(0).wire, 1);
        assert_eq!(p.hit(1).peak_time, 10.0);
        assert_eq!(p.wire_hits(3), WireHits::Range { first: 1, end: 3 });
        assert_eq!(p.wire_hits(2), WireHits::Empty);
        assert_eq!(p.wire_hits(5), WireHits::Dead);
        assert_eq!(p.wire_hits(-1), WireHits::Dead);
        assert_eq!(p.dead_wires_between(3.0, 7.0), 1);
    }

    #[test]
    fn rejects_hits_outside_the_plane() {
        let err = PlaneHits::new(
            PlaneId::default(),
            DetectorGeometry::unit_scale(),
            4,
            100.0,
            vec![Hit::new(9, 1.0, 1.0, 1.0)],
            &[],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ReconError::WireOutOfRange {
                wire: 9,
                num_wires: 4
            }
        );
    }

    #[test]
    fn multiplet_range_covers_siblings() {
        let p = plane(
            vec![
                Hit::new(4, 10.0, 1.0, 10.0),
                Hit::new(4, 20.0, 1.0, 10.0).with_multiplet(2, 0),
                Hit::new(4, 22.0, 1.0, 30.0).with_multiplet(2, 1),
            ],
            &[],
        );
        assert_eq!(p.multiplet(0), 0..1);
        assert_eq!(p.multiplet(1), 1..3);
        assert_eq!(p.multiplet(2), 1..3);
        let (centroid, q) = p.charge_centroid(1..3).unwrap();
        assert!((q - 40.0).abs() < 1e-6);
        assert!((centroid[1] - 21.5).abs() < 1e-5);
    }

    #[test]
    fn signal_near_sees_neighbouring_wires() {
        let p = plane(vec![Hit::new(6, 30.0, 1.0, 10.0)], &[]);
        assert!(p.signal_near(&[5.2, 30.5], 2.0));
        assert!(!p.signal_near(&[5.2, 40.0], 2.0));
    }
}
