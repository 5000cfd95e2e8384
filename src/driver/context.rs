use crate::diagnostics::{PlaneResult, PlaneStats};
use crate::error::ReconError;
use crate::hits::PlaneHits;
use crate::params::TrajParams;
use crate::traj::{AlgFlag, HitOwnership, TrajId, Trajectory, Vertex2D};

/// Mutable state of one (cryostat, TPC, plane) group, passed to every stage.
///
/// Owns the hit-ownership table, the committed trajectories and the vertices
/// for the lifetime of one group; nothing outlives [`GroupContext::finish`].
pub struct GroupContext<'a> {
    pub hits: &'a PlaneHits,
    pub params: &'a TrajParams,
    pub owners: HitOwnership,
    pub trajectories: Vec<Trajectory>,
    pub vertices: Vec<Vertex2D>,
    pub stats: PlaneStats,
    next_id: u32,
}

impl<'a> GroupContext<'a> {
    pub fn new(hits: &'a PlaneHits, params: &'a TrajParams) -> Self {
        Self {
            hits,
            params,
            owners: HitOwnership::new(hits.len()),
            trajectories: Vec::new(),
            vertices: Vec::new(),
            stats: PlaneStats {
                hits: hits.len(),
                ..PlaneStats::default()
            },
            next_id: 1,
        }
    }

    /// Hands out the next trajectory ID.
    pub fn next_traj_id(&mut self) -> TrajId {
        let id = TrajId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Assigns an ID to a work trajectory and turns its reserved hits into
    /// owned hits.
    pub fn commit(&mut self, mut work: Trajectory) -> Result<TrajId, ReconError> {
        work.check_consistency()?;
        let id = self.next_traj_id();
        self.owners.commit(&work.used_hits(), id)?;
        work.id = id;
        if work.flags.contains(AlgFlag::Recovered) {
            self.stats.escalations += 1;
        }
        if work.flags.contains(AlgFlag::Kink) {
            self.stats.kinks += 1;
        }
        if work.flags.contains(AlgFlag::TrimChi) || work.flags.contains(AlgFlag::TrimGap) {
            self.stats.trims += 1;
        }
        self.trajectories.push(work);
        Ok(id)
    }

    /// Position of trajectory `id` in [`GroupContext::trajectories`].
    pub fn traj_index(&self, id: TrajId) -> Result<usize, ReconError> {
        self.trajectories
            .iter()
            .position(|t| t.id == id)
            .ok_or(ReconError::UnknownTrajectory(id))
    }

    /// Verifies per-trajectory consistency, parent references and exclusive
    /// hit ownership.
    pub fn check(&self) -> Result<(), ReconError> {
        for traj in &self.trajectories {
            traj.check_consistency()?;
            if let Some(parent) = traj.parent {
                self.traj_index(parent)?;
            }
        }
        self.owners.check_exclusive(&self.trajectories)
    }

    pub fn finish(self) -> PlaneResult {
        PlaneResult {
            plane: self.hits.plane(),
            hit_owners: self.owners.as_table(),
            trajectories: self.trajectories,
            vertices: self.vertices,
            stats: self.stats,
            aborted: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hits::{DetectorGeometry, Hit, PlaneId};
    use crate::traj::TrajPoint;

    #[test]
    fn dangling_parent_fails_the_check() {
        let hits = PlaneHits::new(
            PlaneId::default(),
            DetectorGeometry::unit_scale(),
            8,
            100.0,
            vec![Hit::new(1, 10.0, 1.0, 50.0), Hit::new(2, 11.0, 1.0, 50.0)],
            &[],
        )
        .expect("valid plane");
        let params = TrajParams::default();
        let mut ctx = GroupContext::new(&hits, &params);

        let mut work = Trajectory::new(hits.plane(), 0);
        for hit in 0..2 {
            ctx.owners.reserve(hit).unwrap();
            work.pts.push(TrajPoint {
                pos: hits.hit_pos(hit),
                hit_pos: hits.hit_pos(hit),
                hits: vec![hit],
                use_hit: vec![true],
                chg: 50.0,
                step: hit,
                ..Default::default()
            });
        }
        work.set_end_points();
        let id = ctx.commit(work).unwrap();
        assert_eq!(ctx.traj_index(id), Ok(0));
        ctx.check().unwrap();

        ctx.trajectories[0].parent = Some(TrajId(42));
        assert_eq!(ctx.check(), Err(ReconError::UnknownTrajectory(TrajId(42))));
    }
}
