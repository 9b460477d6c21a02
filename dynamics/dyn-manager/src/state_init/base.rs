//! The shared core of the state-setting action family.

use nalgebra::{Rotation3, UnitQuaternion, Vector3};

use dyn_body::BodySet;
use dyn_frames::{FrameSubscription, FrameTree, RefFrameState};
use dyn_types::{BodyId, DynError, FrameId, Orientation, Result, StateItems};

use crate::action::{validate_name, ActionIdent};
use crate::subject::SubjectRef;
use crate::world::World;

/// Configuration and resolved references shared by every state-setting
/// action.
///
/// The user-facing fields are plain and public; everything resolved at
/// `initialize` time is private to keep the lifecycle honest.
#[derive(Debug, Default)]
pub struct StateInitCore {
    /// User-supplied instance name; empty for unnamed instances.
    pub name: String,
    /// Participate in scheduling at all.
    pub active: bool,
    /// The body whose state is being set. Must resolve to a
    /// dynamics-capable body.
    pub subject: SubjectRef,
    /// Name of the reference frame the user state is expressed
    /// against. Ignored by derived actions, which construct their
    /// reference frame instead.
    pub reference_frame: String,
    /// The user state describes the reference as seen from the
    /// subject, rather than the subject as seen from the reference.
    pub reverse_sense: bool,
    /// The supplied rate is expressed in reference (parent) axes and
    /// must be rotated into subject axes through the attitude.
    pub rate_in_parent: bool,
    /// Position to set, in reference axes (m).
    pub position: Option<Vector3<f64>>,
    /// Velocity to set, in reference axes (m/s).
    pub velocity: Option<Vector3<f64>>,
    /// Attitude to set, as a user orientation specification.
    pub attitude: Option<Orientation>,
    /// Angular rate to set (rad/s); axes per `rate_in_parent`.
    pub rate: Option<Vector3<f64>>,

    declared: Option<StateItems>,
    ident: Option<ActionIdent>,
    subject_id: Option<BodyId>,
    reference_id: Option<FrameId>,
    subscription: Option<FrameSubscription>,
}

impl StateInitCore {
    /// A named, active core with nothing assigned.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            ..Self::default()
        }
    }

    /// The identity, built at `initialize`; falls back to a fresh
    /// construction for diagnostics on pre-initialize error paths.
    #[must_use]
    pub fn ident_for(&self, type_label: &'static str) -> ActionIdent {
        self.ident
            .clone()
            .unwrap_or_else(|| ActionIdent::new(type_label, &self.name))
    }

    /// The resolved subject body. `None` before `initialize`.
    #[must_use]
    pub fn subject_id(&self) -> Option<BodyId> {
        self.subject_id
    }

    /// The resolved reference frame. `None` before `initialize`.
    #[must_use]
    pub fn reference_id(&self) -> Option<FrameId> {
        self.reference_id
    }

    /// Override the declared item set.
    ///
    /// Used by actions that compute their values at apply time (e.g.
    /// orbital-element derivation) and therefore cannot declare from
    /// the user fields alone.
    pub fn declare(&mut self, items: StateItems) {
        self.declared = Some(items);
    }

    /// The bitset of items this action will set on the subject frame.
    #[must_use]
    pub fn initializes_what(&self) -> StateItems {
        if let Some(declared) = self.declared {
            return declared;
        }
        let mut items = StateItems::NONE;
        if self.position.is_some() {
            items.insert(StateItems::POSITION);
        }
        if self.velocity.is_some() {
            items.insert(StateItems::VELOCITY);
        }
        if self.attitude.is_some() {
            items.insert(StateItems::ATTITUDE);
        }
        if self.rate.is_some() {
            items.insert(StateItems::RATE);
        }
        items
    }

    /// The items the reference frame must already hold before this
    /// action can run.
    ///
    /// Reverse-sense specifications always need the attitude to flip
    /// the state, and need the full relative motion (position and
    /// rate) to flip a velocity. Normal-sense specifications need
    /// position under a velocity and attitude under a rate; a rate
    /// given in parent axes needs the attitude to rotate it. An action
    /// never waits for the items it is itself about to produce.
    #[must_use]
    pub fn required_items(&self) -> StateItems {
        let setting = self.initializes_what();
        let mut required = StateItems::NONE;
        if self.reverse_sense {
            required.insert(StateItems::ATTITUDE);
            if setting.contains(StateItems::VELOCITY) {
                required.insert(StateItems::POSITION);
                required.insert(StateItems::RATE);
            }
        } else {
            if setting.contains(StateItems::VELOCITY) {
                required.insert(StateItems::POSITION);
            }
            if setting.contains(StateItems::RATE) {
                required.insert(StateItems::ATTITUDE);
            }
        }
        if setting.contains(StateItems::RATE) && self.rate_in_parent {
            required.insert(StateItems::ATTITUDE);
        }
        required.difference(setting)
    }

    /// Common `initialize` work: identity, subject resolution, item
    /// admissibility.
    ///
    /// `allowed` restricts which items the concrete action may set;
    /// supplying an item outside it is a configuration error.
    pub(crate) fn initialize_common(
        &mut self,
        world: &World,
        type_label: &'static str,
        allowed: StateItems,
    ) -> Result<()> {
        let ident = ActionIdent::new(type_label, &self.name);
        let subject = self.subject.resolve_dyn_body(world, &ident, "subject")?;
        let supplied = self.initializes_what();
        if !allowed.contains(supplied) {
            return Err(DynError::IllegalValue {
                ident: ident.to_string(),
                detail: format!(
                    "supplies {} but may only set {}",
                    supplied.difference(allowed),
                    allowed
                ),
            });
        }
        self.subject_id = Some(subject);
        self.ident = Some(ident);
        Ok(())
    }

    /// Full `initialize` for actions whose reference frame is named by
    /// the user: resolves the frame and takes the reference
    /// subscription released again by `apply`.
    pub fn initialize(
        &mut self,
        world: &mut World,
        type_label: &'static str,
        allowed: StateItems,
    ) -> Result<()> {
        self.initialize_common(world, type_label, allowed)?;
        let ident = self.ident_for(type_label);
        validate_name(&ident, &self.reference_frame, "reference_frame", "reference frame")?;
        let reference =
            world
                .find_frame(&self.reference_frame)
                .ok_or_else(|| DynError::NullPointer {
                    ident: ident.to_string(),
                    field: format!("reference frame '{}'", self.reference_frame),
                })?;
        self.finish_initialize(world, reference);
        Ok(())
    }

    /// Full `initialize` for actions that resolve their reference (or
    /// subscription target) themselves.
    pub(crate) fn finish_initialize(&mut self, world: &mut World, reference: FrameId) {
        self.reference_id = Some(reference);
        self.subscription = Some(world.frames.subscribe_scoped(reference));
    }

    /// The shared readiness predicate: active, and the reference frame
    /// already holds every required item.
    #[must_use]
    pub fn is_ready_in(&self, world: &World) -> bool {
        if !self.active {
            return false;
        }
        let Some(reference) = self.reference_id else {
            return false;
        };
        world
            .frames
            .frame(reference)
            .initialized
            .contains(self.required_items())
    }

    /// The shared transformation algorithm.
    ///
    /// Grafts a scratch frame under `reference`, seeds it from the
    /// existing relative state between subject and reference (in the
    /// direction matching the sense), overlays exactly the
    /// user-declared items — attitude resolved orientation → matrix →
    /// quaternion, rate rotated from parent to body axes through the
    /// just-composed attitude when so specified — inverts the result
    /// for reverse-sense input, and expresses it with respect to the
    /// subject's integration frame. The scratch frame is pruned on
    /// every exit path.
    pub(crate) fn compute_final_state(
        &self,
        frames: &mut FrameTree,
        bodies: &BodySet,
        reference: FrameId,
    ) -> Result<RefFrameState> {
        let ident = self.ident_for("StateInit");
        let subject = self.subject_id.ok_or_else(|| DynError::NullPointer {
            ident: ident.to_string(),
            field: "subject (initialize never ran)".into(),
        })?;
        let body = bodies.body(subject);
        let body_frame = body.frame;
        let integ = body
            .dynamics
            .as_ref()
            .map(|d| d.integ_frame)
            .ok_or_else(|| DynError::InvalidObject {
                ident: ident.to_string(),
                name: body.name.clone(),
                expected: "dynamics-capable body".into(),
            })?;

        let mut state = if self.reverse_sense {
            frames.state_wrt(reference, body_frame)?
        } else {
            frames.state_wrt(body_frame, reference)?
        };

        if let Some(position) = self.position {
            state.position = position;
        }
        if let Some(velocity) = self.velocity {
            state.velocity = velocity;
        }
        if let Some(orientation) = &self.attitude {
            let matrix = orientation.to_matrix();
            state.attitude = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix(&matrix));
        }
        if let Some(rate) = self.rate {
            state.rate = if self.rate_in_parent {
                state.attitude * rate
            } else {
                rate
            };
        }
        if self.reverse_sense {
            state = state.invert();
        }

        frames.with_scratch(reference, state, |tree, scratch| {
            tree.state_wrt(scratch, integ)
        })
    }

    /// Push a computed final state into the subject's frame and tear
    /// down: overlay the declared items, propagate to descendants,
    /// release the reference subscription. Teardown is idempotent —
    /// re-applying a spent core releases nothing twice.
    pub(crate) fn push_state(
        &mut self,
        frames: &mut FrameTree,
        bodies: &BodySet,
        state: &RefFrameState,
    ) -> Result<()> {
        let ident = self.ident_for("StateInit");
        let subject = self.subject_id.ok_or_else(|| DynError::NullPointer {
            ident: ident.to_string(),
            field: "subject (initialize never ran)".into(),
        })?;
        let body_frame = bodies.body(subject).frame;
        frames.set_state(body_frame, self.initializes_what(), state);
        if let Some(subscription) = self.subscription.take() {
            subscription.release(frames)?;
        }
        Ok(())
    }

    /// `apply` for actions whose reference frame is a persistent tree
    /// node: run the shared algorithm against it and push the result.
    pub fn apply_to_subject(&mut self, world: &mut World, reference: FrameId) -> Result<()> {
        let World { bodies, frames, .. } = world;
        let state = self.compute_final_state(frames, bodies, reference)?;
        self.push_state(frames, bodies, &state)
    }

    /// Log which items were wanted, on which frame, relative to which
    /// reference. Non-fatal; invoked when the startup fixpoint gives
    /// up on this action.
    pub fn report_failure_in(&self, world: &World, type_label: &'static str) {
        let ident = self.ident_for(type_label);
        let wanted = self.required_items();
        let subject_frame = self
            .subject_id
            .map_or_else(|| "unresolved".to_owned(), |id| {
                world.frames.frame(world.bodies.body(id).frame).name.clone()
            });
        let reference = self
            .reference_id
            .map_or_else(|| "unresolved".to_owned(), |id| {
                world.frames.frame(id).name.clone()
            });
        tracing::error!(
            code = "dyn_manager/state_init",
            action = %ident,
            frame = %subject_frame,
            reference = %reference,
            wanted = %wanted,
            sets = %self.initializes_what(),
            "state initialization never became ready"
        );
    }
}
