//! Per-plane reconstruction driver.
//!
//! [`TrajClusterer`] runs the stages in dependency order on every plane:
//! trajectory building, leftover-hit salvage, vertexing, and classification.
//! Each plane gets a fresh [`GroupContext`]. A bookkeeping error in any stage
//! aborts that plane only: the partial output is dropped and the reason is
//! recorded in [`PlaneResult::aborted`].
//!
//! Typical usage:
//! ```no_run
//! use traj_walker::{PlaneHits, TrajClusterer, TrajParams};
//!
//! # fn example(planes: Vec<PlaneHits>) {
//! let clusterer = TrajClusterer::new(TrajParams::default());
//! let report = clusterer.process(&planes);
//! for plane in &report.planes {
//!     println!("{}: {} trajectories", plane.plane, plane.trajectories.len());
//! }
//! # }
//! ```

mod context;

pub use context::GroupContext;

use crate::builder::build_trajectories;
use crate::classify::classify_trajectories;
use crate::diagnostics::{elapsed_ms, PlaneResult, PlaneStats, ReconReport, TimingBreakdown};
use crate::error::ReconError;
use crate::hits::PlaneHits;
use crate::params::TrajParams;
use crate::quality::find_junk_trajectories;
use crate::vertex::resolve_vertices;
use log::{debug, warn};
use std::time::Instant;

/// Trajectory-walking reconstruction over a set of planes.
pub struct TrajClusterer {
    params: TrajParams,
}

impl TrajClusterer {
    pub fn new(params: TrajParams) -> Self {
        Self {
            params: params.validated(),
        }
    }

    pub fn params(&self) -> &TrajParams {
        &self.params
    }

    /// Reconstructs every plane in order.
    pub fn process(&self, planes: &[PlaneHits]) -> ReconReport {
        let total_start = Instant::now();
        let mut report = ReconReport::default();
        for hits in planes {
            let result = self.reconstruct_plane_timed(hits, &mut report.timings);
            report.planes.push(result);
        }
        report.timings.total_ms = elapsed_ms(total_start);
        debug!(
            "TrajClusterer::process planes={} trajectories={} vertices={} total_ms={:.3}",
            report.planes.len(),
            report.n_trajectories(),
            report.n_vertices(),
            report.timings.total_ms
        );
        report
    }

    /// Reconstructs one plane.
    pub fn reconstruct_plane(&self, hits: &PlaneHits) -> PlaneResult {
        let mut timings = TimingBreakdown::default();
        self.reconstruct_plane_timed(hits, &mut timings)
    }

    fn reconstruct_plane_timed(&self, hits: &PlaneHits, timings: &mut TimingBreakdown) -> PlaneResult {
        let mut ctx = GroupContext::new(hits, &self.params);
        if hits.is_empty() {
            debug!("{}: no hits, skipping", hits.plane());
            return ctx.finish();
        }
        match run_stages(&mut ctx, timings) {
            Ok(()) => {
                let result = ctx.finish();
                debug!(
                    "{}: hits={} trajectories={} vertices={} owned={}",
                    result.plane,
                    result.stats.hits,
                    result.trajectories.len(),
                    result.vertices.len(),
                    result.n_owned_hits()
                );
                result
            }
            Err(err) => {
                warn!("{}: reconstruction aborted: {}", hits.plane(), err);
                PlaneResult {
                    plane: hits.plane(),
                    trajectories: Vec::new(),
                    vertices: Vec::new(),
                    hit_owners: vec![None; hits.len()],
                    stats: PlaneStats {
                        hits: hits.len(),
                        ..ctx.stats
                    },
                    aborted: Some(err.to_string()),
                }
            }
        }
    }
}

fn run_stages(ctx: &mut GroupContext<'_>, timings: &mut TimingBreakdown) -> Result<(), ReconError> {
    let start = Instant::now();
    build_trajectories(ctx)?;
    timings.add("build", elapsed_ms(start));

    let start = Instant::now();
    find_junk_trajectories(ctx)?;
    timings.add("junk", elapsed_ms(start));

    let start = Instant::now();
    resolve_vertices(ctx)?;
    timings.add("vertex", elapsed_ms(start));

    let start = Instant::now();
    classify_trajectories(ctx);
    timings.add("classify", elapsed_ms(start));

    ctx.check()
}
