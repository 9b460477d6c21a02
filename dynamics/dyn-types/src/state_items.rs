//! The dependency bitset over frame state components.
//!
//! Every reference frame tracks which of its four state components
//! currently hold valid values, and every state-setting action declares
//! which components it needs versus produces in the same vocabulary.
//! The named compounds exist for readability; action code tests against
//! them directly.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A set of frame state components: position, velocity, attitude, rate.
///
/// A closed algebra over a four-bit domain — no operation can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StateItems(u8);

impl StateItems {
    /// The empty set.
    pub const NONE: Self = Self(0);
    /// Translational position.
    pub const POSITION: Self = Self(1 << 0);
    /// Translational velocity.
    pub const VELOCITY: Self = Self(1 << 1);
    /// Rotational attitude.
    pub const ATTITUDE: Self = Self(1 << 2);
    /// Rotational (angular) rate.
    pub const RATE: Self = Self(1 << 3);

    /// Position and velocity: the full translational state.
    pub const POS_VEL: Self = Self(Self::POSITION.0 | Self::VELOCITY.0);
    /// Attitude and rate: the full rotational state.
    pub const ATT_RATE: Self = Self(Self::ATTITUDE.0 | Self::RATE.0);
    /// Position and attitude.
    pub const POS_ATT: Self = Self(Self::POSITION.0 | Self::ATTITUDE.0);
    /// Position, velocity, and attitude.
    pub const POS_VEL_ATT: Self = Self(Self::POS_VEL.0 | Self::ATTITUDE.0);
    /// The full state: position, velocity, attitude, and rate.
    pub const POS_VEL_ATT_RATE: Self = Self(Self::POS_VEL.0 | Self::ATT_RATE.0);

    /// Returns true if every item in `other` is also in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Add all items in `other` to the set.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Remove all items in `other` from the set.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// The union of the two sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// The set difference `self - other`.
    #[inline]
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Returns true if no items are set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for StateItems {
    /// Lists the set members for diagnostics, e.g. `position+velocity`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let mut first = true;
        for (item, label) in [
            (Self::POSITION, "position"),
            (Self::VELOCITY, "velocity"),
            (Self::ATTITUDE, "attitude"),
            (Self::RATE, "rate"),
        ] {
            if self.contains(item) {
                if !first {
                    write!(f, "+")?;
                }
                write!(f, "{label}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Every value of the 4-bit domain.
    fn all_values() -> impl Iterator<Item = StateItems> {
        (0u8..16).map(StateItems)
    }

    #[test]
    fn union_contains_both_operands() {
        for a in all_values() {
            for b in all_values() {
                let u = a.union(b);
                assert!(u.contains(a), "{u} should contain {a}");
                assert!(u.contains(b), "{u} should contain {b}");
            }
        }
    }

    #[test]
    fn self_difference_is_empty() {
        for a in all_values() {
            assert!(a.difference(a).is_empty());
        }
    }

    #[test]
    fn remove_then_contains_fails() {
        let mut s = StateItems::POS_VEL_ATT_RATE;
        s.remove(StateItems::VELOCITY);
        assert!(!s.contains(StateItems::VELOCITY));
        assert!(s.contains(StateItems::POS_ATT));
        assert!(s.contains(StateItems::RATE));
    }

    #[test]
    fn named_compounds_decompose() {
        assert_eq!(
            StateItems::POS_VEL,
            StateItems::POSITION.union(StateItems::VELOCITY)
        );
        assert_eq!(
            StateItems::ATT_RATE,
            StateItems::ATTITUDE.union(StateItems::RATE)
        );
        assert_eq!(
            StateItems::POS_VEL_ATT_RATE,
            StateItems::POS_VEL.union(StateItems::ATT_RATE)
        );
    }

    #[test]
    fn display_lists_members() {
        assert_eq!(StateItems::NONE.to_string(), "none");
        assert_eq!(StateItems::POS_VEL.to_string(), "position+velocity");
        assert_eq!(
            StateItems::POS_VEL_ATT_RATE.to_string(),
            "position+velocity+attitude+rate"
        );
    }
}
