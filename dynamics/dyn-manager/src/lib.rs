//! Action scheduler for multi-body spacecraft dynamics.
//!
//! Populating the reference-frame tree at simulation start is not a
//! fixed sequence: the user supplies an unordered collection of
//! declarative initialization and topology actions, and the order in
//! which they can legally run depends on what each action requires
//! versus what has already been computed elsewhere in the tree.
//!
//! This crate provides:
//!
//! - the uniform [`Action`] lifecycle every action kind implements
//!   (`initialize` → zero-or-more `is_ready` → `apply`)
//! - the state-setting family ([`state_init`]) that declares which
//!   state items it produces and waits for the items it needs
//! - the topology family ([`topology`]) that grafts and prunes bodies
//!   across the mass and frame trees mid-schedule
//! - [`DynManager`], which drains the pending-action queue to a
//!   fixpoint at startup and single-passes it each cycle thereafter
//!
//! Everything here is single-threaded and synchronous: an action runs
//! to completion before the next is visited, so the frame tree needs no
//! locking — only the discipline that every temporary graft or
//! subscription taken in `initialize` is released by the matching
//! `apply`.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,   // Many methods can't be const due to nalgebra
    clippy::missing_errors_doc,     // Error docs added where non-obvious
)]

mod action;
mod manager;
mod mass_init;
pub mod state_init;
mod subject;
pub mod topology;
mod world;

pub use action::{validate_name, Action, ActionIdent, ActionKind};
pub use manager::DynManager;
pub use mass_init::MassPropsInit;
pub use subject::{ResolvedRef, SubjectRef};
pub use world::{Planet, PlanetSet, World};
