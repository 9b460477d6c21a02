//! Core types for multi-body spacecraft dynamics.
//!
//! This crate provides the foundational types shared by the dynamics
//! crates:
//!
//! - [`StateItems`] - which of {position, velocity, attitude, rate} a
//!   frame currently holds
//! - [`BodyId`] / [`FrameId`] / [`PlanetId`] - arena handles
//! - [`MassProperties`] - mass, center of mass, inertia
//! - [`Orientation`] - the user-facing attitude specifications and
//!   their resolution to a quaternion
//! - [`DynError`] - the shared error taxonomy
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no tree traversal, no
//! scheduling, no numerics beyond orientation resolution. They're the
//! common language between:
//!
//! - The reference-frame tree (dyn-frames)
//! - The body model and attach/detach mechanics (dyn-body)
//! - The action scheduler (dyn-manager)

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::missing_errors_doc,       // Error docs added where non-obvious
)]

mod error;
mod ids;
mod mass;
mod orientation;
mod state_items;

pub use error::DynError;
pub use ids::{BodyId, FrameId, PlanetId};
pub use mass::{AttachPoint, MassProperties};
pub use orientation::Orientation;
pub use state_items::StateItems;

/// Result type for dynamics operations.
pub type Result<T> = std::result::Result<T, DynError>;
