//! Trajectory data model: points, trajectories, vertices, per-hit ownership
//! and the local line fit shared by the stepping and quality stages.

mod flags;
pub mod fit;
pub mod ownership;
mod point;
mod trajectory;
mod vertex;

pub use flags::{AlgFlag, AlgFlags};
pub use fit::{fit_points, principal_axis, LineFit};
pub use ownership::{HitOwner, HitOwnership};
pub use point::TrajPoint;
pub use trajectory::{TrajClass, TrajId, Trajectory};
pub use vertex::{Vertex2D, VertexId, VertexTopology};
