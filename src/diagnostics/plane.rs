use super::timing::TimingBreakdown;
use crate::hits::PlaneId;
use crate::traj::{TrajClass, TrajId, Trajectory, Vertex2D};
use serde::Serialize;

/// Counters gathered while one plane is processed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaneStats {
    pub hits: usize,
    pub seeds_tried: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub escalations: usize,
    pub kinks: usize,
    pub trims: usize,
    pub junk: usize,
    pub vertices: usize,
    pub splits: usize,
    pub hammers: usize,
    pub primaries: usize,
    pub secondaries: usize,
}

/// Trajectories, vertices and final hit ownership of one plane.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaneResult {
    pub plane: PlaneId,
    pub trajectories: Vec<Trajectory>,
    pub vertices: Vec<Vertex2D>,
    /// Owning trajectory per hit, in the plane's sorted hit order.
    pub hit_owners: Vec<Option<TrajId>>,
    pub stats: PlaneStats,
    /// Set when a bookkeeping error aborted the plane; the outputs are then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl PlaneResult {
    pub fn trajectory(&self, id: TrajId) -> Option<&Trajectory> {
        self.trajectories.iter().find(|t| t.id == id)
    }

    pub fn count_class(&self, class: TrajClass) -> usize {
        self.trajectories.iter().filter(|t| t.class == class).count()
    }

    pub fn n_owned_hits(&self) -> usize {
        self.hit_owners.iter().filter(|o| o.is_some()).count()
    }
}

/// Result of processing a set of planes.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconReport {
    pub planes: Vec<PlaneResult>,
    pub timings: TimingBreakdown,
}

impl ReconReport {
    pub fn n_trajectories(&self) -> usize {
        self.planes.iter().map(|p| p.trajectories.len()).sum()
    }

    pub fn n_vertices(&self) -> usize {
        self.planes.iter().map(|p| p.vertices.len()).sum()
    }
}
