//! State-setting actions: declare which state items they will produce,
//! wait until the items they need are valid on the reference frame,
//! then transform user-supplied values into the subject's frame and
//! push them into the tree.
//!
//! All concrete actions share [`StateInitCore`]: the subject and
//! reference resolution, the readiness rule, and the scratch-frame
//! transformation algorithm. The concretes differ in which items they
//! accept and, for the derived family, in how the reference frame is
//! constructed before the shared algorithm runs.

mod base;
mod basic;
mod derived;

pub use base::StateInitCore;
pub use basic::{FullStateInit, RotStateInit, TransStateInit};
pub use derived::{
    ElementsToCartesian, LvlhInit, NedInit, NedOrigin, OrbitInit, OrbitalElements, WrtBodyInit,
};
