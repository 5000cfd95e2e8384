use super::trajectory::{TrajId, Trajectory};
use crate::error::ReconError;

/// Ownership state of one hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitOwner {
    Free,
    /// Tentatively held by the trajectory under construction.
    Reserved,
    Owned(TrajId),
}

/// Per-hit ownership table of one plane.
///
/// A hit moves Free -> Reserved while a trajectory is built, then either
/// Reserved -> Owned on commit or Reserved -> Free on release.
#[derive(Clone, Debug)]
pub struct HitOwnership {
    owners: Vec<HitOwner>,
}

impl HitOwnership {
    pub fn new(n_hits: usize) -> Self {
        Self {
            owners: vec![HitOwner::Free; n_hits],
        }
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn owner(&self, hit: usize) -> HitOwner {
        self.owners.get(hit).copied().unwrap_or(HitOwner::Free)
    }

    pub fn is_free(&self, hit: usize) -> bool {
        self.owner(hit) == HitOwner::Free
    }

    pub fn reserve(&mut self, hit: usize) -> Result<(), ReconError> {
        match self.owners.get_mut(hit) {
            Some(slot @ HitOwner::Free) => {
                *slot = HitOwner::Reserved;
                Ok(())
            }
            Some(other) => Err(ReconError::HitAlreadyClaimed {
                hit,
                owner: format!("{other:?}"),
            }),
            None => Err(ReconError::PointIndexOutOfRange {
                index: hit,
                len: self.owners.len(),
            }),
        }
    }

    /// Returns a reserved hit to the free pool. Owned hits are untouched.
    pub fn release(&mut self, hit: usize) {
        if let Some(slot) = self.owners.get_mut(hit) {
            if *slot == HitOwner::Reserved {
                *slot = HitOwner::Free;
            }
        }
    }

    /// Turns the reservations of `hits` into ownership by `id`.
    pub fn commit(&mut self, hits: &[usize], id: TrajId) -> Result<(), ReconError> {
        for &hit in hits {
            match self.owners.get_mut(hit) {
                Some(slot @ HitOwner::Reserved) => *slot = HitOwner::Owned(id),
                _ => return Err(ReconError::HitNotReserved { hit }),
            }
        }
        Ok(())
    }

    /// Moves a committed hit from one trajectory to another.
    pub fn reassign(&mut self, hit: usize, from: TrajId, to: TrajId) -> Result<(), ReconError> {
        match self.owners.get_mut(hit) {
            Some(slot) if *slot == HitOwner::Owned(from) => {
                *slot = HitOwner::Owned(to);
                Ok(())
            }
            Some(slot) => Err(ReconError::OwnershipMismatch {
                hit,
                expected: Some(from),
                found: owned_by(*slot),
            }),
            None => Err(ReconError::PointIndexOutOfRange {
                index: hit,
                len: self.owners.len(),
            }),
        }
    }

    /// Owning trajectory per hit, `None` for free hits.
    pub fn as_table(&self) -> Vec<Option<TrajId>> {
        self.owners.iter().map(|o| owned_by(*o)).collect()
    }

    /// Checks that every used hit is owned by exactly the trajectory using it,
    /// that every owned hit is used, and that nothing is left reserved.
    pub fn check_exclusive(&self, trajectories: &[Trajectory]) -> Result<(), ReconError> {
        let mut expected: Vec<Option<TrajId>> = vec![None; self.owners.len()];
        for traj in trajectories {
            for hit in traj.used_hits() {
                let Some(slot) = expected.get_mut(hit) else {
                    return Err(ReconError::PointIndexOutOfRange {
                        index: hit,
                        len: self.owners.len(),
                    });
                };
                if let Some(prev) = *slot {
                    return Err(ReconError::HitAlreadyClaimed {
                        hit,
                        owner: format!("{prev:?}"),
                    });
                }
                *slot = Some(traj.id);
            }
        }
        for (hit, (owner, want)) in self.owners.iter().zip(expected).enumerate() {
            if *owner == HitOwner::Reserved || owned_by(*owner) != want {
                return Err(ReconError::OwnershipMismatch {
                    hit,
                    expected: want,
                    found: owned_by(*owner),
                });
            }
        }
        Ok(())
    }
}

fn owned_by(owner: HitOwner) -> Option<TrajId> {
    match owner {
        HitOwner::Owned(id) => Some(id),
        _ => None,
    }
}
