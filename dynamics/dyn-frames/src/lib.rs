//! Reference-frame tree for multi-body spacecraft dynamics.
//!
//! A reference frame is a node in a rooted tree. Each node stores its
//! state *relative to its parent* — position, velocity, attitude, and
//! angular rate — together with a bitset of which of those components
//! currently hold valid values and a count of tree-consistency
//! subscribers.
//!
//! ```text
//! inertial ──┬── planet-fixed
//!            └── sat.composite ──┬── point "dock"
//!                                └── child.composite
//! ```
//!
//! Two pieces live here:
//!
//! - [`RefFrameState`] — the state payload and its composition algebra
//!   (compose along a tree path, invert a relative state)
//! - [`FrameTree`] — the arena of nodes: grafting, pruning,
//!   subscriptions, relative-state queries, and scoped scratch frames
//!
//! The tree is single-threaded by design: all mutation happens
//! synchronously inside action `initialize`/`apply` calls.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,   // Many methods can't be const due to nalgebra
    clippy::missing_errors_doc,     // Error docs added where non-obvious
)]

mod state;
mod tree;

pub use state::RefFrameState;
pub use tree::{frame_state, FrameSubscription, FrameTree, RefFrame};
