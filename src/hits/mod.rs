//! Read-only hit collection consumed by the reconstruction.
//!
//! Hits arrive grouped by (cryostat, TPC, plane). Within a group they are
//! sorted by wire, then by peak time, and indexed per wire so the stepping
//! code can ask "which hits are on wire w" in constant time. Dead wires and
//! live wires without hits are distinguishable, which matters when counting
//! how many wires a trajectory skipped.
//!
//! Positions are expressed in wire units on both axes: the time coordinate
//! is `peak_time * units_per_tick` (see [`DetectorGeometry`]).

mod geometry;
mod plane;

pub use geometry::DetectorGeometry;
pub use plane::{Hit, PlaneHits, PlaneId, WireHits};
