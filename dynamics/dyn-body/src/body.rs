//! Body definitions and the body arena.

use std::collections::HashMap;

use dyn_types::{AttachPoint, BodyId, DynError, FrameId, MassProperties, Result};
use dyn_frames::FrameTree;

/// Motion-state extension carried by dynamics-capable bodies.
#[derive(Debug, Clone)]
pub struct DynamicsExt {
    /// The inertial frame this body's state is integrated in. The
    /// body's composite frame hangs here whenever the body is not
    /// attached to something else.
    pub integ_frame: FrameId,
}

/// A body in the mass tree.
///
/// `dynamics.is_some()` distinguishes dynamics-capable bodies from
/// mass-only ones; everything else is shared.
#[derive(Debug, Clone)]
pub struct Body {
    /// Body name, unique in the arena.
    pub name: String,
    /// Mass, center of mass, inertia.
    pub mass_props: MassProperties,
    /// Named attachment points fixed on this body.
    pub points: Vec<AttachPoint>,
    /// Parent in the mass tree, if attached.
    pub parent: Option<BodyId>,
    /// Children in the mass tree.
    pub children: Vec<BodyId>,
    /// This body's composite state frame in the reference-frame tree.
    pub frame: FrameId,
    /// Present iff the body is dynamics-capable.
    pub dynamics: Option<DynamicsExt>,
}

impl Body {
    /// Returns true if the body carries integrable motion state.
    #[must_use]
    pub fn is_dynamics(&self) -> bool {
        self.dynamics.is_some()
    }

    /// Find an attachment point by name. Miss returns `None`.
    #[must_use]
    pub fn find_point(&self, name: &str) -> Option<&AttachPoint> {
        self.points.iter().find(|p| p.name == name)
    }
}

/// The arena of bodies, addressed by [`BodyId`] and by name.
#[derive(Debug, Default)]
pub struct BodySet {
    bodies: Vec<Body>,
    by_name: HashMap<String, BodyId>,
}

impl BodySet {
    /// An empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Returns true if no bodies are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Register a mass-only body.
    ///
    /// Creates the body's composite frame (`<name>.composite`) as a
    /// free-standing frame; it gets a parent when the body is attached.
    pub fn add_mass_body(&mut self, frames: &mut FrameTree, name: &str) -> Result<BodyId> {
        let frame = frames.add_frame(format!("{name}.composite"), None)?;
        self.register(frames, name, frame, None)
    }

    /// Register a dynamics-capable body integrating in `integ_frame`.
    ///
    /// The composite frame starts grafted under the integration frame
    /// with identity state and nothing initialized.
    pub fn add_dyn_body(
        &mut self,
        frames: &mut FrameTree,
        name: &str,
        integ_frame: FrameId,
    ) -> Result<BodyId> {
        let frame = frames.add_frame(format!("{name}.composite"), None)?;
        frames.graft(frame, integ_frame)?;
        self.register(frames, name, frame, Some(DynamicsExt { integ_frame }))
    }

    fn register(
        &mut self,
        frames: &mut FrameTree,
        name: &str,
        frame: FrameId,
        dynamics: Option<DynamicsExt>,
    ) -> Result<BodyId> {
        if self.by_name.contains_key(name) {
            return Err(DynError::DuplicateEntry { name: name.into() });
        }
        let id = BodyId::new(self.bodies.len());
        self.by_name.insert(name.into(), id);
        frames.frame_mut(frame).owner = Some(id);
        self.bodies.push(Body {
            name: name.into(),
            mass_props: MassProperties::default(),
            points: Vec::new(),
            parent: None,
            children: Vec::new(),
            frame,
            dynamics,
        });
        Ok(id)
    }

    /// Look up a body by name. Miss returns `None`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<BodyId> {
        self.by_name.get(name).copied()
    }

    /// Immutable access to a body.
    #[must_use]
    pub fn body(&self, id: BodyId) -> &Body {
        &self.bodies[id.index()]
    }

    /// Mutable access to a body.
    pub fn body_mut(&mut self, id: BodyId) -> &mut Body {
        &mut self.bodies[id.index()]
    }

    /// Iterate over all bodies in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(i, b)| (BodyId::new(i), b))
    }

    /// Returns true if `ancestor` lies on the mass-tree parent chain of
    /// `body` (or is `body` itself).
    #[must_use]
    pub fn is_mass_ancestor(&self, ancestor: BodyId, body: BodyId) -> bool {
        let mut cur = Some(body);
        while let Some(b) = cur {
            if b == ancestor {
                return true;
            }
            cur = self.body(b).parent;
        }
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use dyn_types::StateItems;

    #[test]
    fn dyn_body_starts_under_integ_frame_uninitialized() {
        let mut frames = FrameTree::new();
        let mut bodies = BodySet::new();
        let inertial = frames.add_frame("inertial", None).unwrap();
        let sat = bodies.add_dyn_body(&mut frames, "sat", inertial).unwrap();

        let frame = bodies.body(sat).frame;
        assert_eq!(frames.frame(frame).parent, Some(inertial));
        assert_eq!(frames.frame(frame).initialized, StateItems::NONE);
        assert_eq!(frames.frame(frame).owner, Some(sat));
        assert!(bodies.body(sat).is_dynamics());
    }

    #[test]
    fn mass_body_frame_is_free_standing() {
        let mut frames = FrameTree::new();
        let mut bodies = BodySet::new();
        let probe = bodies.add_mass_body(&mut frames, "probe").unwrap();
        assert!(frames.frame(bodies.body(probe).frame).parent.is_none());
        assert!(!bodies.body(probe).is_dynamics());
    }

    #[test]
    fn duplicate_body_name_rejected() {
        let mut frames = FrameTree::new();
        let mut bodies = BodySet::new();
        bodies.add_mass_body(&mut frames, "probe").unwrap();
        assert!(matches!(
            bodies.add_mass_body(&mut frames, "probe"),
            Err(DynError::DuplicateEntry { .. })
        ));
    }

    #[test]
    fn mass_ancestry_follows_parent_links() {
        let mut frames = FrameTree::new();
        let mut bodies = BodySet::new();
        let a = bodies.add_mass_body(&mut frames, "a").unwrap();
        let b = bodies.add_mass_body(&mut frames, "b").unwrap();
        bodies.body_mut(b).parent = Some(a);
        bodies.body_mut(a).children.push(b);

        assert!(bodies.is_mass_ancestor(a, b));
        assert!(!bodies.is_mass_ancestor(b, a));
    }
}
