//! Bookkeeping errors that abort the reconstruction of one plane.
//!
//! Geometric rejections (a hit outside the delta cut, a poor fit, a short
//! trajectory) are not errors; they are handled where they happen. The
//! variants below indicate that internal state is inconsistent, so the
//! driver drops the whole group when one surfaces.

use crate::traj::TrajId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconError {
    #[error("hit {hit} is already claimed ({owner})")]
    HitAlreadyClaimed { hit: usize, owner: String },

    #[error("hit {hit} was expected to be reserved by the work trajectory")]
    HitNotReserved { hit: usize },

    #[error("hit {hit} is owned by {found:?}, expected {expected:?}")]
    OwnershipMismatch {
        hit: usize,
        expected: Option<TrajId>,
        found: Option<TrajId>,
    },

    #[error("trajectory point {point} has {hits} hits but {flags} use flags")]
    ParallelArrayMismatch {
        point: usize,
        hits: usize,
        flags: usize,
    },

    #[error("point index {index} out of range for trajectory with {len} points")]
    PointIndexOutOfRange { index: usize, len: usize },

    #[error("trajectory {id:?} has end points out of order: {first} > {last}")]
    EndPointsOutOfOrder { id: TrajId, first: usize, last: usize },

    #[error("unknown trajectory {0:?}")]
    UnknownTrajectory(TrajId),

    #[error("hit on wire {wire} but the plane only has {num_wires} wires")]
    WireOutOfRange { wire: u32, num_wires: u32 },
}
