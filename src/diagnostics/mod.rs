//! Serializable outputs of a reconstruction run.
//!
//! [`ReconReport`] is what [`TrajClusterer::process`](crate::TrajClusterer)
//! returns: one [`PlaneResult`] per processed (cryostat, TPC, plane) group
//! plus the accumulated stage timings. Every type serializes to camelCase
//! JSON so the demo binary can dump a report as-is.

mod plane;
mod timing;

pub use plane::{PlaneResult, PlaneStats, ReconReport};
pub use timing::{StageTiming, TimingBreakdown};

pub(crate) use timing::elapsed_ms;
