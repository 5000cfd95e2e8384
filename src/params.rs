//! Parameter types configuring the reconstruction stages.
//!
//! The stepping engine runs in passes: pass 0 applies the tightest cuts and
//! each later pass loosens them so hits left over by earlier passes can still
//! be collected. Per-pass knobs live in [`PassParams`]; everything that does
//! not change between passes sits in [`TrajParams`] and its sub-structs.
//!
//! The numeric defaults are empirically tuned starting points, not physics
//! constants. Distances are in wire-spacing units (time is pre-scaled by the
//! drift-velocity/pitch factor); angles are in radians unless the field name
//! says otherwise.

use serde::{Deserialize, Serialize};

/// Cuts applied while a trajectory is stepped with a given pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassParams {
    /// Smallest fit window the chi-square recovery may shrink to.
    pub min_pts_fit: usize,
    /// Minimum number of points with charge for acceptance.
    pub min_pts: usize,
    /// Wires that may be skipped when no signal is present.
    pub max_wire_skip_no_signal: usize,
    /// Wires that may be skipped when signal is present but not usable.
    pub max_wire_skip_with_signal: usize,
    /// Scale factor converting hit RMS into a position error.
    pub hit_err_fac: f32,
    /// Hard kink-angle cut.
    pub kink_ang_cut: f32,
    /// Chi-square/NDOF ceiling of the incremental fit.
    pub max_chi: f32,
    /// Weight of the charge-ratio term in the doublet figure of merit.
    pub charge_ratio_weight: f32,
    /// Distance from a trajectory end within which a vertex may attach.
    pub vtx_end_tol: f32,
    /// Trajectories whose angle to the wire axis exceeds this (degrees) step
    /// in path length rather than one wire at a time.
    pub large_angle_deg: f32,
}

impl Default for PassParams {
    fn default() -> Self {
        Self {
            min_pts_fit: 3,
            min_pts: 8,
            max_wire_skip_no_signal: 2,
            max_wire_skip_with_signal: 4,
            hit_err_fac: 0.4,
            kink_ang_cut: 0.4,
            max_chi: 2.0,
            charge_ratio_weight: 1.0,
            vtx_end_tol: 4.0,
            large_angle_deg: 80.0,
        }
    }
}

impl PassParams {
    /// Direction-cosine cutoff along the wire axis below which a trajectory
    /// counts as large-angle.
    pub fn large_angle_cos(&self) -> f32 {
        self.large_angle_deg.to_radians().cos()
    }
}

/// Kink detection on the trailing points of a trajectory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinkParams {
    /// Points refit at the end of the trajectory.
    pub fit_pts: usize,
    /// Points skipped between the refit window and the reference point.
    pub skip_pts: usize,
    /// Minimum points with charge before kinks are looked for.
    pub min_pts: usize,
    /// Trailing points removed when a kink is found.
    pub trim_pts: usize,
    /// Angle/angle-error ratio required by the soft (half-cut) kink test.
    pub significance: f32,
    /// Chi-square ceiling of the refit for the soft kink test.
    pub max_chi: f32,
}

impl Default for KinkParams {
    fn default() -> Self {
        Self {
            fit_pts: 4,
            skip_pts: 1,
            min_pts: 8,
            trim_pts: 3,
            significance: 3.0,
            max_chi: 2.0,
        }
    }
}

/// Masked-hit recovery (pass escalation inside one build).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryParams {
    /// Trailing points inspected for masked candidates.
    pub check_pts: usize,
    /// Minimum masked points that trigger escalation.
    pub min_masked: usize,
    /// Trajectories shorter than this always escalate when masked.
    pub short_traj_pts: usize,
    /// Longer trajectories escalate when masked/skipped is at most this.
    pub max_masked_density: f32,
}

impl Default for RecoveryParams {
    fn default() -> Self {
        Self {
            check_pts: 6,
            min_masked: 2,
            short_traj_pts: 10,
            max_masked_density: 0.7,
        }
    }
}

/// Post-acceptance trimming of irregular trailing points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimParams {
    /// Longest tail that may be removed.
    pub max_tail_pts: usize,
    /// Tail chi-square must exceed this multiple of the body median.
    pub max_chi_ratio: f32,
    /// Tail chi-square below this is never trimmed.
    pub min_chi: f32,
    /// Step-index gap between successive charged points that splits off a tail.
    pub max_step_gap: usize,
}

impl Default for TrimParams {
    fn default() -> Self {
        Self {
            max_tail_pts: 3,
            max_chi_ratio: 3.0,
            min_chi: 1.0,
            max_step_gap: 3,
        }
    }
}

/// Leftover-hit salvage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JunkParams {
    pub enabled: bool,
    /// Maximum distance between two hits of one group.
    pub proximity: f32,
    /// Minimum hits for a salvaged trajectory.
    pub min_hits: usize,
    /// Groups with at least this many hits are fitted with a line; smaller
    /// groups keep one point per hit.
    pub line_fit_min_hits: usize,
    /// Path-length bin size along the fitted line.
    pub bin_len: f32,
}

impl Default for JunkParams {
    fn default() -> Self {
        Self {
            enabled: true,
            proximity: 2.0,
            min_hits: 2,
            line_fit_min_hits: 3,
            bin_len: 1.0,
        }
    }
}

/// Vertex finding, attachment, splitting and hammer detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VertexParams {
    pub enabled: bool,
    /// Radius around an intersection in which a hit must exist.
    pub signal_tol: f32,
    /// Points from the end within which attachment beats splitting.
    pub end_pt_slack: usize,
    /// Minimum points with charge each side of a split.
    pub min_split_pts: usize,
    /// Closest approach of an end to another trajectory's interior.
    pub hammer_doca: f32,
    /// Minimum orientation difference for a hammer.
    pub hammer_ang_cut: f32,
    /// Points at each end of the struck trajectory excluded from the scan.
    pub hammer_end_excl: usize,
}

impl Default for VertexParams {
    fn default() -> Self {
        Self {
            enabled: true,
            signal_tol: 2.0,
            end_pt_slack: 2,
            min_split_pts: 2,
            hammer_doca: 4.0,
            hammer_ang_cut: 0.5,
            hammer_end_excl: 3,
        }
    }
}

/// Track-like/shower-like grouping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyParams {
    pub enabled: bool,
    /// Closest approach below which two trajectories intersect.
    pub doca_cut: f32,
    /// Intersection points a component needs before it is classified.
    pub min_intersections: usize,
}

impl Default for ClassifyParams {
    fn default() -> Self {
        Self {
            enabled: true,
            doca_cut: 4.0,
            min_intersections: 4,
        }
    }
}

/// Reconstruction-wide parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajParams {
    /// Pass tiers, tightest first.
    pub passes: Vec<PassParams>,
    /// Step ceiling of one walk.
    pub max_steps: usize,
    /// Ceiling on state transitions of one build.
    pub max_build_transitions: usize,
    /// Largest fit window.
    pub max_pts_fit: usize,
    /// Seed hits must overlap within this many RMS.
    pub seed_time_sigmas: f32,
    /// Delta cut in units of the combined position error.
    pub delta_cut_sigmas: f32,
    pub min_delta_cut: f32,
    pub max_delta_cut: f32,
    /// Loose bound (multiple of the delta cut) that flags signal presence.
    pub big_delta_factor: f32,
    /// Floor of the locally estimated residual RMS.
    pub min_delta_rms: f32,
    /// Charged points averaged for the running charge.
    pub chg_avg_pts: usize,
    /// Walk back from the seed after the forward walk.
    pub reverse_propagate: bool,
    pub kink: KinkParams,
    pub recovery: RecoveryParams,
    pub trim: TrimParams,
    pub junk: JunkParams,
    pub vertex: VertexParams,
    pub classify: ClassifyParams,
}

impl Default for TrajParams {
    fn default() -> Self {
        Self {
            passes: default_passes(),
            max_steps: 10_000,
            max_build_transitions: 32,
            max_pts_fit: 30,
            seed_time_sigmas: 3.0,
            delta_cut_sigmas: 3.0,
            min_delta_cut: 0.5,
            max_delta_cut: 1.5,
            big_delta_factor: 5.0,
            min_delta_rms: 0.1,
            chg_avg_pts: 20,
            reverse_propagate: true,
            kink: KinkParams::default(),
            recovery: RecoveryParams::default(),
            trim: TrimParams::default(),
            junk: JunkParams::default(),
            vertex: VertexParams::default(),
            classify: ClassifyParams::default(),
        }
    }
}

fn default_passes() -> Vec<PassParams> {
    vec![
        PassParams::default(),
        PassParams {
            min_pts: 5,
            max_wire_skip_no_signal: 3,
            max_wire_skip_with_signal: 6,
            hit_err_fac: 0.6,
            kink_ang_cut: 0.5,
            max_chi: 3.0,
            ..PassParams::default()
        },
        PassParams {
            min_pts_fit: 2,
            min_pts: 3,
            max_wire_skip_no_signal: 4,
            max_wire_skip_with_signal: 8,
            hit_err_fac: 0.8,
            kink_ang_cut: 0.6,
            max_chi: 5.0,
            vtx_end_tol: 5.0,
            ..PassParams::default()
        },
    ]
}

impl TrajParams {
    pub fn n_passes(&self) -> usize {
        self.passes.len()
    }

    /// Cuts of `pass`, clamped to the loosest configured tier.
    pub fn pass(&self, pass: usize) -> &PassParams {
        let last = self.passes.len().saturating_sub(1);
        &self.passes[pass.min(last)]
    }

    /// Replaces an empty pass list with the defaults and lifts counts that
    /// must be positive to their smallest usable value.
    pub fn validated(mut self) -> Self {
        if self.passes.is_empty() {
            self.passes = default_passes();
        }
        self.max_pts_fit = self.max_pts_fit.max(2);
        self.kink.fit_pts = self.kink.fit_pts.max(2);
        self.kink.trim_pts = self.kink.trim_pts.max(1);
        self.chg_avg_pts = self.chg_avg_pts.max(1);
        self
    }
}
