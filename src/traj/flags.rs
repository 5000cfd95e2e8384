use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::fmt;

/// Heuristics that modified a trajectory, recorded for auditability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlgFlag {
    /// Fit window shrunk after a chi-square failure.
    FitShrunk,
    /// Hits of a point masked after the fit window could not shrink further.
    ChiMask,
    /// Stepping stopped at a kink and trailing points were removed.
    Kink,
    /// Pass escalated to recover masked hits.
    Recovered,
    /// Walked back from the seed end.
    ReverseProp,
    /// Trailing points removed for a chi-square jump.
    TrimChi,
    /// Trailing points removed after a step gap.
    TrimGap,
    /// Split into two at a vertex.
    Split,
    /// End attached to a hammer vertex.
    Hammer,
    /// Built from leftover hits by a one-shot fit.
    Junk,
    /// Primary of a shower-like group.
    Primary,
    /// Secondary inside a shower-like group.
    Secondary,
}

impl AlgFlag {
    pub const ALL: [AlgFlag; 12] = [
        AlgFlag::FitShrunk,
        AlgFlag::ChiMask,
        AlgFlag::Kink,
        AlgFlag::Recovered,
        AlgFlag::ReverseProp,
        AlgFlag::TrimChi,
        AlgFlag::TrimGap,
        AlgFlag::Split,
        AlgFlag::Hammer,
        AlgFlag::Junk,
        AlgFlag::Primary,
        AlgFlag::Secondary,
    ];

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Set of [`AlgFlag`]s stored as a bitmask.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AlgFlags(u32);

impl AlgFlags {
    pub fn insert(&mut self, flag: AlgFlag) {
        self.0 |= flag.bit();
    }

    pub fn remove(&mut self, flag: AlgFlag) {
        self.0 &= !flag.bit();
    }

    pub fn contains(&self, flag: AlgFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = AlgFlag> + '_ {
        AlgFlag::ALL.into_iter().filter(|f| self.contains(*f))
    }
}

impl fmt::Debug for AlgFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Serialize for AlgFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(None)?;
        for flag in self.iter() {
            seq.serialize_element(&flag)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_round_trip_through_the_set() {
        let mut flags = AlgFlags::default();
        assert!(flags.is_empty());
        flags.insert(AlgFlag::Kink);
        flags.insert(AlgFlag::Split);
        assert!(flags.contains(AlgFlag::Kink));
        assert!(!flags.contains(AlgFlag::Junk));
        flags.remove(AlgFlag::Kink);
        assert_eq!(flags.iter().collect::<Vec<_>>(), vec![AlgFlag::Split]);
    }

    #[test]
    fn serializes_as_names() {
        let mut flags = AlgFlags::default();
        flags.insert(AlgFlag::ReverseProp);
        flags.insert(AlgFlag::TrimChi);
        let json = serde_json::to_string(&flags).unwrap();
        assert_eq!(json, r#"["reverse-prop","trim-chi"]"#);
    }
}
