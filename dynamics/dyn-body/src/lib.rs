//! Body model for multi-body spacecraft dynamics.
//!
//! Bodies come in two flavors sharing one representation:
//!
//! - **mass-only** bodies carry mass properties and attachment points
//! - **dynamics-capable** bodies additionally carry integrable motion
//!   state; a dynamics body *is-a* mass body (same struct, extension
//!   present)
//!
//! Bodies form a parent/child mass tree, mirrored by each body's
//! composite frame in the reference-frame tree. Restructuring either
//! tree goes through the attach/detach mechanics in [`mechanics`] —
//! the topology actions in the manager crate dispatch to these and
//! never touch tree links directly.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,   // Many methods can't be const due to nalgebra
    clippy::missing_errors_doc,     // Error docs added where non-obvious
)]

mod body;
pub mod mechanics;

pub use body::{Body, BodySet, DynamicsExt};
pub use mechanics::mate_points;
