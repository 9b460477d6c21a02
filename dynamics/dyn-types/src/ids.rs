//! Arena handles for bodies, frames, and planets.
//!
//! All registries in the dynamics crates are index arenas; these
//! newtypes keep the index spaces from mixing.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(pub usize);

        impl $name {
            /// Create an ID from a raw arena index.
            #[must_use]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Get the raw arena index.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }
    };
}

arena_id!(
    /// Unique identifier for a body (mass-only or dynamics-capable).
    BodyId,
    "Body"
);

arena_id!(
    /// Unique identifier for a node in the reference-frame tree.
    FrameId,
    "Frame"
);

arena_id!(
    /// Unique identifier for a registered planet.
    PlanetId,
    "Planet"
);
