//! The reference-frame tree: an index arena of frames with parent and
//! child links, subscriptions, and relative-state queries.
//!
//! Parent links are traversal-only; a node never owns its parent.
//! Grafting and pruning are the only link mutations, and both reject
//! shapes that would corrupt a later traversal (cycles, double
//! attachment). Temporary scratch frames used by state-setting
//! algorithms go through [`FrameTree::with_scratch`], which removes the
//! scratch node on every exit path.

use nalgebra::{UnitQuaternion, Vector3};

use dyn_types::{BodyId, DynError, FrameId, Result, StateItems};

use crate::state::RefFrameState;

/// A node in the reference-frame tree.
#[derive(Debug, Clone)]
pub struct RefFrame {
    /// Frame name, unique in the tree (scratch frames excepted).
    pub name: String,
    /// The body that owns this frame, if any.
    pub owner: Option<BodyId>,
    /// Parent frame. Traversal-only; never an ownership edge.
    pub parent: Option<FrameId>,
    /// Child frames.
    pub children: Vec<FrameId>,
    /// State relative to the parent frame.
    pub state: RefFrameState,
    /// Which state components currently hold valid values.
    pub initialized: StateItems,
    /// Count of active tree-consistency subscribers.
    subscribers: u32,
}

impl RefFrame {
    /// Current subscriber count.
    #[must_use]
    pub fn subscribers(&self) -> u32 {
        self.subscribers
    }
}

/// Handle for one frame subscription.
///
/// Must be released exactly once via [`FrameSubscription::release`].
/// Dropping an unreleased handle logs a warning: the matching
/// unsubscribe never happened, and the frame will be held consistent
/// forever.
#[derive(Debug)]
pub struct FrameSubscription {
    frame: FrameId,
    name: String,
    released: bool,
}

impl FrameSubscription {
    /// The subscribed frame.
    #[must_use]
    pub fn frame(&self) -> FrameId {
        self.frame
    }

    /// Release the subscription, decrementing the frame's counter.
    pub fn release(mut self, tree: &mut FrameTree) -> Result<()> {
        self.released = true;
        tree.unsubscribe(self.frame)
    }
}

impl Drop for FrameSubscription {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!(
                code = "dyn_frames/subscription",
                frame = %self.name,
                "frame subscription dropped without release"
            );
        }
    }
}

/// The arena of reference frames.
///
/// Frames are created once and addressed by [`FrameId`]; ids stay valid
/// for the life of the tree. The one exception is the scratch frame
/// inside [`FrameTree::with_scratch`], which is pushed and popped in
/// LIFO order and never escapes the closure.
#[derive(Debug, Default)]
pub struct FrameTree {
    nodes: Vec<RefFrame>,
    by_name: std::collections::HashMap<String, FrameId>,
}

impl FrameTree {
    /// An empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames, scratch included while one is live.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a free-standing frame.
    ///
    /// The new frame has no parent until grafted; duplicate names are
    /// rejected.
    pub fn add_frame(&mut self, name: impl Into<String>, owner: Option<BodyId>) -> Result<FrameId> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(DynError::DuplicateEntry { name });
        }
        let id = FrameId::new(self.nodes.len());
        self.by_name.insert(name.clone(), id);
        self.nodes.push(RefFrame {
            name,
            owner,
            parent: None,
            children: Vec::new(),
            state: RefFrameState::identity(),
            initialized: StateItems::NONE,
            subscribers: 0,
        });
        Ok(id)
    }

    /// Look up a frame by name. Miss returns `None`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<FrameId> {
        self.by_name.get(name).copied()
    }

    /// Immutable access to a frame.
    #[must_use]
    pub fn frame(&self, id: FrameId) -> &RefFrame {
        &self.nodes[id.index()]
    }

    /// Mutable access to a frame.
    pub fn frame_mut(&mut self, id: FrameId) -> &mut RefFrame {
        &mut self.nodes[id.index()]
    }

    /// The root of the tree containing `id`.
    #[must_use]
    pub fn root_of(&self, id: FrameId) -> FrameId {
        let mut cur = id;
        while let Some(parent) = self.frame(cur).parent {
            cur = parent;
        }
        cur
    }

    /// Returns true if `ancestor` lies on the parent chain of `id`
    /// (or is `id` itself).
    #[must_use]
    pub fn is_ancestor(&self, ancestor: FrameId, id: FrameId) -> bool {
        let mut cur = Some(id);
        while let Some(f) = cur {
            if f == ancestor {
                return true;
            }
            cur = self.frame(f).parent;
        }
        false
    }

    /// Attach `child` under `parent`.
    ///
    /// Rejects a child that is already attached and a parent that lies
    /// inside the child's own subtree (a graft there would close a
    /// cycle).
    pub fn graft(&mut self, child: FrameId, parent: FrameId) -> Result<()> {
        if self.frame(child).parent.is_some() {
            return Err(DynError::InconsistentSetup {
                ident: self.frame(child).name.clone(),
                detail: "already attached; prune before grafting".into(),
            });
        }
        if self.is_ancestor(child, parent) {
            return Err(DynError::InconsistentSetup {
                ident: self.frame(child).name.clone(),
                detail: format!(
                    "grafting under {} would create a cycle",
                    self.frame(parent).name
                ),
            });
        }
        self.frame_mut(child).parent = Some(parent);
        self.frame_mut(parent).children.push(child);
        Ok(())
    }

    /// Detach `child` from its current parent.
    pub fn prune(&mut self, child: FrameId) -> Result<()> {
        let Some(parent) = self.frame(child).parent else {
            return Err(DynError::InconsistentSetup {
                ident: self.frame(child).name.clone(),
                detail: "prune of a frame with no parent".into(),
            });
        };
        self.frame_mut(child).parent = None;
        self.frame_mut(parent).children.retain(|&c| c != child);
        Ok(())
    }

    /// Increment a frame's subscriber count.
    pub fn subscribe(&mut self, id: FrameId) {
        self.frame_mut(id).subscribers += 1;
    }

    /// Subscribe and return a handle that must be released exactly once.
    pub fn subscribe_scoped(&mut self, id: FrameId) -> FrameSubscription {
        self.subscribe(id);
        FrameSubscription {
            frame: id,
            name: self.frame(id).name.clone(),
            released: false,
        }
    }

    /// Decrement a frame's subscriber count.
    ///
    /// Unsubscribing a frame with no subscribers is a contract
    /// violation.
    pub fn unsubscribe(&mut self, id: FrameId) -> Result<()> {
        let node = self.frame_mut(id);
        if node.subscribers == 0 {
            return Err(DynError::InconsistentSetup {
                ident: node.name.clone(),
                detail: "unsubscribe without a matching subscribe".into(),
            });
        }
        node.subscribers -= 1;
        Ok(())
    }

    /// State of `frame` relative to the tree root it hangs under.
    fn state_wrt_root(&self, frame: FrameId) -> RefFrameState {
        let mut acc = self.frame(frame).state;
        let mut cur = self.frame(frame).parent;
        while let Some(p) = cur {
            acc = acc.compose(&self.frame(p).state);
            cur = self.frame(p).parent;
        }
        acc
    }

    /// Relative state of `frame` with respect to `wrt`.
    ///
    /// Both frames must hang under the same root.
    pub fn state_wrt(&self, frame: FrameId, wrt: FrameId) -> Result<RefFrameState> {
        if frame == wrt {
            return Ok(RefFrameState::identity());
        }
        if self.root_of(frame) != self.root_of(wrt) {
            return Err(DynError::InconsistentSetup {
                ident: self.frame(frame).name.clone(),
                detail: format!(
                    "no common root with {} for a relative-state query",
                    self.frame(wrt).name
                ),
            });
        }
        let s_frame = self.state_wrt_root(frame);
        let s_wrt = self.state_wrt_root(wrt);
        Ok(s_frame.compose(&s_wrt.invert()))
    }

    /// Overlay exactly the given state components onto a frame and mark
    /// them initialized.
    ///
    /// The marked items propagate to the frame's whole subtree: child
    /// frames hold fixed offsets, so a parent update re-validates them.
    pub fn set_state(&mut self, id: FrameId, items: StateItems, state: &RefFrameState) {
        let node = self.frame_mut(id);
        if items.contains(StateItems::POSITION) {
            node.state.position = state.position;
        }
        if items.contains(StateItems::VELOCITY) {
            node.state.velocity = state.velocity;
        }
        if items.contains(StateItems::ATTITUDE) {
            node.state.attitude = state.attitude;
        }
        if items.contains(StateItems::RATE) {
            node.state.rate = state.rate;
        }
        self.mark_initialized(id, items);
    }

    fn mark_initialized(&mut self, id: FrameId, items: StateItems) {
        self.frame_mut(id).initialized.insert(items);
        let children = self.frame(id).children.clone();
        for child in children {
            self.mark_initialized(child, items);
        }
    }

    /// Run `f` with a temporary scratch frame grafted under `parent`.
    ///
    /// The scratch node carries `state` relative to `parent` and a full
    /// initialized set. It is pruned and removed from the arena on
    /// every exit path, so an early error can never leave it attached.
    /// Scratch frames nest in LIFO order only.
    pub fn with_scratch<T>(
        &mut self,
        parent: FrameId,
        state: RefFrameState,
        f: impl FnOnce(&mut Self, FrameId) -> Result<T>,
    ) -> Result<T> {
        let id = FrameId::new(self.nodes.len());
        self.nodes.push(RefFrame {
            name: format!(".scratch.{}", id.index()),
            owner: None,
            parent: None,
            children: Vec::new(),
            state,
            initialized: StateItems::POS_VEL_ATT_RATE,
            subscribers: 0,
        });
        self.frame_mut(id).parent = Some(parent);
        self.frame_mut(parent).children.push(id);

        let out = f(self, id);

        // Scratch removal must hold even on the error path.
        self.frame_mut(parent).children.retain(|&c| c != id);
        debug_assert_eq!(
            id.index(),
            self.nodes.len() - 1,
            "scratch frames must unwind in LIFO order"
        );
        self.nodes.pop();
        out
    }
}

/// Build a [`RefFrameState`] from raw components. Convenience for
/// mechanics code and tests.
#[must_use]
pub fn frame_state(
    position: Vector3<f64>,
    velocity: Vector3<f64>,
    attitude: UnitQuaternion<f64>,
    rate: Vector3<f64>,
) -> RefFrameState {
    RefFrameState {
        position,
        velocity,
        attitude,
        rate,
    }
}
