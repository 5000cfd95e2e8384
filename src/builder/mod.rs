//! Trajectory stepping engine.
//!
//! A build starts from two hits on adjacent wires, walks away from the seed
//! one wire (or one unit of path length) at a time, collects hits near the
//! projected position, and refits the local direction after every step. The
//! control flow of one build is an explicit state machine:
//!
//! ```text
//! Seeding -> Stepping -> (Escalating -> Stepping)* -> Accepted | Rejected
//! ```
//!
//! Hits used by the work trajectory are reserved in the [`HitOwnership`]
//! table the moment they are used; a rejected build releases all of them
//! before the next seed is tried. The number of state transitions and the
//! number of steps per walk are both bounded by [`TrajParams`].

mod hits;
mod seed;
mod step;

use crate::driver::GroupContext;
use crate::error::ReconError;
use crate::hits::PlaneHits;
use crate::params::TrajParams;
use crate::quality;
use crate::traj::{AlgFlag, HitOwnership, Trajectory};
use log::{debug, warn};

/// States of one seed-to-completion build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildState {
    Seeding,
    Stepping,
    Escalating,
    Accepted,
    Rejected,
}

/// Read-only view of a plane used to grow trajectories.
pub struct TrajBuilder<'a> {
    hits: &'a PlaneHits,
    params: &'a TrajParams,
}

impl<'a> TrajBuilder<'a> {
    pub fn new(hits: &'a PlaneHits, params: &'a TrajParams) -> Self {
        Self { hits, params }
    }

    /// Runs one build from the seed pair `(ihit, jhit)` with cut tier `pass`.
    ///
    /// Returns the accepted work trajectory with its hits still reserved, or
    /// `None` after releasing every hit it had reserved.
    pub fn build(
        &self,
        owners: &mut HitOwnership,
        ihit: usize,
        jhit: usize,
        pass: usize,
    ) -> Result<Option<Trajectory>, ReconError> {
        let mut state = BuildState::Seeding;
        let mut work = Trajectory::new(self.hits.plane(), pass);
        let mut reversed = false;

        for _ in 0..self.params.max_build_transitions {
            state = match state {
                BuildState::Seeding => match self.start_traj(owners, ihit, jhit, pass)? {
                    Some(seeded) => {
                        work = seeded;
                        BuildState::Stepping
                    }
                    None => return Ok(None),
                },
                BuildState::Stepping => {
                    let n_before = work.n_pts_with_charge();
                    self.step(owners, &mut work)?;
                    let recover = quality::needs_recovery(&work, self.params);
                    quality::trim_trailing_chargeless(&mut work);
                    if reversed && work.n_pts_with_charge() > n_before {
                        work.flags.insert(AlgFlag::ReverseProp);
                    }
                    if recover {
                        BuildState::Escalating
                    } else if self.params.reverse_propagate && !reversed {
                        reversed = true;
                        work.reverse();
                        self.refit_end(&mut work);
                        BuildState::Stepping
                    } else if quality::accepts(&work, self.params) {
                        BuildState::Accepted
                    } else {
                        BuildState::Rejected
                    }
                }
                BuildState::Escalating => {
                    if work.pass + 1 < self.params.n_passes() {
                        let keep = work.end_pt[1] + 1;
                        work.pts.truncate(keep);
                        work.pass += 1;
                        work.flags.insert(AlgFlag::Recovered);
                        debug!(
                            "build {}/{}: escalating to pass {}",
                            ihit, jhit, work.pass
                        );
                        BuildState::Stepping
                    } else {
                        BuildState::Rejected
                    }
                }
                BuildState::Accepted => {
                    quality::trim_end_pts(owners, &mut work, self.params);
                    work.check_consistency()?;
                    return Ok(Some(work));
                }
                BuildState::Rejected => {
                    quality::release_points(owners, &mut work.pts);
                    return Ok(None);
                }
            };
        }

        warn!(
            "build {}/{}: transition ceiling {} reached, rejecting",
            ihit, jhit, self.params.max_build_transitions
        );
        quality::release_points(owners, &mut work.pts);
        Ok(None)
    }
}

/// Seeds and grows trajectories over the whole plane, pass by pass.
///
/// Seeds are pairs of free hits on adjacent wires, tried from the last wire
/// towards the first. Accepted trajectories are committed immediately so
/// their hits are unavailable to later seeds.
pub fn build_trajectories(ctx: &mut GroupContext<'_>) -> Result<(), ReconError> {
    let Some((first_wire, last_wire)) = ctx.hits.wire_span() else {
        return Ok(());
    };
    let builder = TrajBuilder::new(ctx.hits, ctx.params);

    for pass in 0..ctx.params.n_passes() {
        for iwire in ((first_wire + 1)..=last_wire).rev() {
            let jwire = iwire - 1;
            let Some(irange) = ctx.hits.wire_hits(iwire as i64).range() else {
                continue;
            };
            let Some(jrange) = ctx.hits.wire_hits(jwire as i64).range() else {
                continue;
            };
            for ihit in irange {
                for jhit in jrange.clone() {
                    if !ctx.owners.is_free(ihit) {
                        break;
                    }
                    if !ctx.owners.is_free(jhit) || !builder.seed_compatible(ihit, jhit) {
                        continue;
                    }
                    ctx.stats.seeds_tried += 1;
                    match builder.build(&mut ctx.owners, ihit, jhit, pass)? {
                        Some(work) => {
                            let id = ctx.commit(work)?;
                            ctx.stats.accepted += 1;
                            debug!("{}: committed trajectory {:?} (pass {})", ctx.hits.plane(), id, pass);
                        }
                        None => ctx.stats.rejected += 1,
                    }
                }
            }
        }
    }
    Ok(())
}
