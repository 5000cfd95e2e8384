use serde::{Deserialize, Serialize};

/// Calibration constants of one (cryostat, TPC, plane) group.
///
/// Only the ratio between drift distance per tick and wire pitch is used: hit
/// times are multiplied by [`DetectorGeometry::units_per_tick`] so that one
/// unit along time equals one wire spacing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorGeometry {
    pub wire_pitch_cm: f32,
    pub drift_velocity_cm_per_us: f32,
    pub sampling_rate_ns: f32,
}

impl Default for DetectorGeometry {
    fn default() -> Self {
        Self {
            wire_pitch_cm: 0.3,
            drift_velocity_cm_per_us: 0.16,
            sampling_rate_ns: 500.0,
        }
    }
}

impl DetectorGeometry {
    /// Geometry whose time scale equals the wire spacing (one tick = one wire).
    pub fn unit_scale() -> Self {
        Self {
            wire_pitch_cm: 1.0,
            drift_velocity_cm_per_us: 1.0,
            sampling_rate_ns: 1000.0,
        }
    }

    /// Wire-equivalent units per time tick.
    pub fn units_per_tick(&self) -> f32 {
        let tick_to_dist = self.drift_velocity_cm_per_us * self.sampling_rate_ns * 1e-3;
        if self.wire_pitch_cm <= 0.0 || !tick_to_dist.is_finite() || tick_to_dist <= 0.0 {
            1.0
        } else {
            tick_to_dist / self.wire_pitch_cm
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_scale_is_one() {
        assert!((DetectorGeometry::unit_scale().units_per_tick() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn default_scale_matches_pitch_ratio() {
        let g = DetectorGeometry::default();
        let expected = 0.16 * 500.0 * 1e-3 / 0.3;
        assert!((g.units_per_tick() - expected).abs() < 1e-6);
    }

    #[test]
    fn degenerate_pitch_falls_back() {
        let g = DetectorGeometry {
            wire_pitch_cm: 0.0,
            ..Default::default()
        };
        assert_eq!(g.units_per_tick(), 1.0);
    }
}
