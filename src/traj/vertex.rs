use crate::hits::PlaneId;
use serde::{Deserialize, Serialize};

/// Index of a vertex in the per-plane vertex list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub u32);

/// How the attached trajectories meet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VertexTopology {
    /// Two trajectory ends, `[end of first, end of second]`.
    EndToEnd([u8; 2]),
    /// A trajectory end landing inside another trajectory, which was split.
    Hammer,
}

/// 2D vertex joining trajectory ends. Never moved once created.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vertex2D {
    pub id: VertexId,
    pub pos: [f32; 2],
    pub pos_err: [f32; 2],
    pub n_traj: usize,
    pub topology: VertexTopology,
    pub plane: PlaneId,
}
