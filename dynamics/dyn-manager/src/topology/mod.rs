//! Topology-mutation actions: attach and detach bodies across the mass
//! tree and the reference-frame tree.
//!
//! Unlike the state-setting family, these actions report a boolean
//! outcome rather than computing state. Success logs at debug severity;
//! failure is fatal only when the action's `terminate_on_error` flag is
//! set, otherwise it logs an error and the schedule continues.

mod attach;
mod detach;

pub use attach::{AttachAligned, AttachMatrix};
pub use detach::{DetachAction, DetachSpecific};
