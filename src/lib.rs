#![doc = include_str!("../README.md")]

// Data model and reconstruction stages
pub mod builder;
pub mod classify;
pub mod driver;
pub mod hits;
pub mod params;
pub mod quality;
pub mod traj;
pub mod vertex;

// Support
pub mod angle;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod io;

// --- High-level re-exports -------------------------------------------------

pub use crate::driver::{GroupContext, TrajClusterer};
pub use crate::error::ReconError;
pub use crate::hits::{DetectorGeometry, Hit, PlaneHits, PlaneId};
pub use crate::params::{PassParams, TrajParams};
pub use crate::traj::{TrajClass, TrajId, Trajectory, Vertex2D, VertexId};

pub use crate::diagnostics::{PlaneResult, PlaneStats, ReconReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use traj_walker::prelude::*;
///
/// # fn main() {
/// let hits: Vec<Hit> = (10..20).map(|w| Hit::new(w, 3.0 * w as f32, 1.0, 100.0)).collect();
/// let plane = PlaneHits::new(PlaneId::default(), DetectorGeometry::unit_scale(), 32, 200.0, hits, &[]).unwrap();
///
/// let result = TrajClusterer::new(TrajParams::default()).reconstruct_plane(&plane);
/// println!("trajectories={} vertices={}", result.trajectories.len(), result.vertices.len());
/// # }
/// ```
pub mod prelude {
    pub use crate::hits::{DetectorGeometry, Hit, PlaneHits, PlaneId};
    pub use crate::{ReconReport, TrajClusterer, TrajParams};
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    pub use crate::builder::{build_trajectories, TrajBuilder};
    pub use crate::classify::classify_trajectories;
    pub use crate::quality::find_junk_trajectories;
    pub use crate::vertex::{find_end_vertices, find_hammer_vertices, resolve_vertices};

    pub use crate::diagnostics::{StageTiming, TimingBreakdown};
}
