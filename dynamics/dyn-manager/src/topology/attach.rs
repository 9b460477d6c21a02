//! Attach actions: mate two bodies by named points, or place one under
//! another (or under a free-standing frame) at an explicit offset.

use nalgebra::{UnitQuaternion, Vector3};

use dyn_body::mechanics;
use dyn_types::{DynError, Orientation, Result};

use crate::action::{validate_name, Action, ActionIdent, ActionKind};
use crate::subject::{ResolvedRef, SubjectRef};
use crate::world::World;

/// Shared configuration and dispatch for the attach actions.
///
/// The legal (subject, parent) kind combinations and the operation each
/// selects:
///
/// | subject | parent | operation |
/// |---|---|---|
/// | dynamics | dynamics | child dynamics body |
/// | mass | dynamics | sub-mass-body |
/// | mass | mass | mass-to-mass |
/// | dynamics | mass | illegal, always fails |
/// | dynamics | frame | kinematic frame attach |
/// | mass | frame | illegal, always fails |
#[derive(Debug, Default)]
struct AttachCore {
    name: String,
    active: bool,
    subject: SubjectRef,
    parent: SubjectRef,
    terminate_on_error: bool,

    ident: Option<ActionIdent>,
    resolved: Option<(ResolvedRef, ResolvedRef)>,
}

impl AttachCore {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            ..Self::default()
        }
    }

    fn ident_for(&self, type_label: &'static str) -> ActionIdent {
        self.ident
            .clone()
            .unwrap_or_else(|| ActionIdent::new(type_label, &self.name))
    }

    fn initialize(&mut self, world: &World, type_label: &'static str) -> Result<()> {
        let ident = ActionIdent::new(type_label, &self.name);
        let subject = self.subject.resolve(world, &ident, "subject")?;
        if matches!(subject, ResolvedRef::Frame(_)) {
            return Err(DynError::InvalidObject {
                ident: ident.to_string(),
                name: self.subject.display_name().into(),
                expected: "body".into(),
            });
        }
        let parent = self.parent.resolve(world, &ident, "parent")?;
        self.resolved = Some((subject, parent));
        self.ident = Some(ident);
        Ok(())
    }

    fn resolved(&self, type_label: &'static str) -> Result<(ResolvedRef, ResolvedRef)> {
        self.resolved.ok_or_else(|| DynError::NullPointer {
            ident: self.ident_for(type_label).to_string(),
            field: "resolved roles (initialize never ran)".into(),
        })
    }

    /// Dispatch the attach over the resolved kind pair. The two illegal
    /// pairs fail without touching the world.
    fn dispatch(
        &self,
        world: &mut World,
        type_label: &'static str,
        offset: Vector3<f64>,
        attitude: UnitQuaternion<f64>,
    ) -> Result<bool> {
        let (subject, parent) = self.resolved(type_label)?;
        let World { bodies, frames, .. } = world;
        match (subject, parent) {
            (ResolvedRef::Dyn(s), ResolvedRef::Dyn(p)) => {
                mechanics::attach_dyn_to_dyn(bodies, frames, s, p, offset, attitude)
            }
            (ResolvedRef::Mass(s), ResolvedRef::Dyn(p)) => {
                mechanics::attach_mass_to_dyn(bodies, frames, s, p, offset, attitude)
            }
            (ResolvedRef::Mass(s), ResolvedRef::Mass(p)) => {
                mechanics::attach_mass_to_mass(bodies, frames, s, p, offset, attitude)
            }
            (ResolvedRef::Dyn(s), ResolvedRef::Frame(f)) => {
                mechanics::attach_dyn_to_frame(bodies, frames, s, f, offset, attitude)
            }
            (ResolvedRef::Dyn(_), ResolvedRef::Mass(_))
            | (ResolvedRef::Mass(_), ResolvedRef::Frame(_)) => Ok(false),
            (ResolvedRef::Frame(_), _) => Err(DynError::InvalidObject {
                ident: self.ident_for(type_label).to_string(),
                name: self.subject.display_name().into(),
                expected: "body".into(),
            }),
        }
    }

    /// Three-tier outcome reporting shared by the attach and detach
    /// families.
    fn report(
        &self,
        type_label: &'static str,
        succeeded: bool,
        verb: &str,
        target: &str,
    ) -> Result<()> {
        let ident = self.ident_for(type_label);
        if succeeded {
            tracing::debug!(
                code = "dyn_manager/topology",
                action = %ident,
                subject = %self.subject.display_name(),
                target = %target,
                "{verb} succeeded"
            );
            return Ok(());
        }
        let detail = format!(
            "could not {verb} {} to {target}",
            self.subject.display_name()
        );
        if self.terminate_on_error {
            return Err(DynError::NotPerformed {
                ident: ident.to_string(),
                detail,
            });
        }
        tracing::error!(
            code = "dyn_manager/topology",
            action = %ident,
            "{detail}"
        );
        Ok(())
    }
}

/// Attaches the subject to the parent by mating two named attachment
/// points.
///
/// The points are resolved at apply time, after the mass-initialization
/// stage has registered them. A point that does not exist fails the
/// attach; it is not a configuration error. A frame parent has no
/// attachment points, so the aligned form refuses it the same way.
#[derive(Debug, Default)]
pub struct AttachAligned {
    core: AttachCore,
    /// Name of the attachment point on the subject body.
    pub subject_point: String,
    /// Name of the attachment point on the parent body.
    pub parent_point: String,
}

impl AttachAligned {
    /// A named, active aligned attach.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            core: AttachCore::named(name),
            subject_point: String::new(),
            parent_point: String::new(),
        }
    }

    /// The subject role.
    pub fn subject(&mut self) -> &mut SubjectRef {
        &mut self.core.subject
    }

    /// The parent role.
    pub fn parent(&mut self) -> &mut SubjectRef {
        &mut self.core.parent
    }

    /// Escalate a failed attach to a fatal error.
    pub fn set_terminate_on_error(&mut self, value: bool) {
        self.core.terminate_on_error = value;
    }
}

impl Action for AttachAligned {
    fn type_label(&self) -> &'static str {
        "AttachAligned"
    }

    fn user_name(&self) -> &str {
        &self.core.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Attach
    }

    fn is_active(&self) -> bool {
        self.core.active
    }

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        self.core.initialize(world, self.type_label())?;
        let ident = self.core.ident_for(self.type_label());
        validate_name(&ident, &self.subject_point, "subject_point", "attachment point")?;
        validate_name(&ident, &self.parent_point, "parent_point", "attachment point")?;
        Ok(())
    }

    fn apply(&mut self, world: &mut World) -> Result<()> {
        let (subject, parent) = self.core.resolved(self.type_label())?;
        let succeeded = match (subject, parent) {
            (_, ResolvedRef::Frame(_)) => {
                tracing::debug!(
                    code = "dyn_manager/topology",
                    action = %self.core.ident_for(self.type_label()),
                    "aligned attach refused: a frame parent has no attachment points"
                );
                false
            }
            (ResolvedRef::Mass(s) | ResolvedRef::Dyn(s), ResolvedRef::Mass(p) | ResolvedRef::Dyn(p)) => {
                let ident = self.core.ident_for(self.type_label());
                match (
                    find_point(world, &ident, s, &self.subject_point),
                    find_point(world, &ident, p, &self.parent_point),
                ) {
                    (Some(subject_pt), Some(parent_pt)) => {
                        let (offset, attitude) = dyn_body::mate_points(&parent_pt, &subject_pt);
                        self.core.dispatch(world, self.type_label(), offset, attitude)?
                    }
                    // A missing point is a failed attach, not a
                    // configuration error; the report tier decides
                    // whether it is fatal.
                    _ => false,
                }
            }
            (ResolvedRef::Frame(_), _) => {
                return Err(DynError::InvalidObject {
                    ident: self.core.ident_for(self.type_label()).to_string(),
                    name: self.core.subject.display_name().into(),
                    expected: "body".into(),
                })
            }
        };
        self.core.report(
            self.type_label(),
            succeeded,
            "attach",
            self.core.parent.display_name(),
        )
    }
}

fn find_point(
    world: &World,
    ident: &ActionIdent,
    body: dyn_types::BodyId,
    name: &str,
) -> Option<dyn_types::AttachPoint> {
    let body = world.bodies.body(body);
    let point = body.find_point(name).cloned();
    if point.is_none() {
        tracing::debug!(
            code = "dyn_manager/topology",
            action = %ident,
            body = %body.name,
            point = %name,
            "aligned attach refused: attachment point not found"
        );
    }
    point
}

/// Attaches the subject to the parent at an explicit offset and
/// orientation.
#[derive(Debug, Default)]
pub struct AttachMatrix {
    core: AttachCore,
    /// Subject frame origin in parent axes (m).
    pub offset: Vector3<f64>,
    /// Subject attitude relative to the parent, as a user orientation
    /// specification; converted to a transform before dispatch.
    pub orientation: Orientation,
}

impl AttachMatrix {
    /// A named, active offset attach.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            core: AttachCore::named(name),
            offset: Vector3::zeros(),
            orientation: Orientation::default(),
        }
    }

    /// The subject role.
    pub fn subject(&mut self) -> &mut SubjectRef {
        &mut self.core.subject
    }

    /// The parent role.
    pub fn parent(&mut self) -> &mut SubjectRef {
        &mut self.core.parent
    }

    /// Escalate a failed attach to a fatal error.
    pub fn set_terminate_on_error(&mut self, value: bool) {
        self.core.terminate_on_error = value;
    }
}

impl Action for AttachMatrix {
    fn type_label(&self) -> &'static str {
        "AttachMatrix"
    }

    fn user_name(&self) -> &str {
        &self.core.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Attach
    }

    fn is_active(&self) -> bool {
        self.core.active
    }

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        self.core.initialize(world, self.type_label())
    }

    fn apply(&mut self, world: &mut World) -> Result<()> {
        let attitude = self.orientation.to_quaternion();
        let succeeded = self
            .core
            .dispatch(world, self.type_label(), self.offset, attitude)?;
        self.core.report(
            self.type_label(),
            succeeded,
            "attach",
            self.core.parent.display_name(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use dyn_types::AttachPoint;

    fn world_with_fleet() -> World {
        let mut world = World::new();
        world.add_root_frame("inertial").unwrap();
        world.add_dyn_body("ship", "inertial").unwrap();
        world.add_dyn_body("probe", "inertial").unwrap();
        world.add_mass_body("ballast").unwrap();
        world
    }

    #[test]
    fn matrix_attach_dyn_to_dyn() {
        let mut world = world_with_fleet();
        let mut action = AttachMatrix::named("dock");
        action.subject().set_dyn_body("probe");
        action.parent().set_dyn_body("ship");
        action.offset = Vector3::new(0.0, 0.0, 3.0);
        action.initialize(&mut world).unwrap();
        action.apply(&mut world).unwrap();

        let probe = world.find_body("probe").unwrap();
        let ship = world.find_body("ship").unwrap();
        assert_eq!(world.bodies.body(probe).parent, Some(ship));
    }

    #[test]
    fn matrix_attach_mass_to_dyn() {
        let mut world = world_with_fleet();
        let mut action = AttachMatrix::named("stow");
        action.subject().set_mass_body("ballast");
        action.parent().set_dyn_body("ship");
        action.offset = Vector3::new(0.0, 1.0, 0.0);
        action.initialize(&mut world).unwrap();
        action.apply(&mut world).unwrap();

        let ballast = world.find_body("ballast").unwrap();
        let ship = world.find_body("ship").unwrap();
        assert_eq!(world.bodies.body(ballast).parent, Some(ship));
        let ballast_frame = world.bodies.body(ballast).frame;
        let ship_frame = world.bodies.body(ship).frame;
        assert_eq!(world.frames.frame(ballast_frame).parent, Some(ship_frame));
        assert_relative_eq!(
            world.frames.frame(ballast_frame).state.position,
            Vector3::new(0.0, 1.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn matrix_attach_mass_to_mass() {
        let mut world = world_with_fleet();
        world.add_mass_body("cargo").unwrap();
        let mut action = AttachMatrix::named("stack");
        action.subject().set_mass_body("cargo");
        action.parent().set_mass_body("ballast");
        action.initialize(&mut world).unwrap();
        action.apply(&mut world).unwrap();

        let cargo = world.find_body("cargo").unwrap();
        let ballast = world.find_body("ballast").unwrap();
        assert_eq!(world.bodies.body(cargo).parent, Some(ballast));
        let cargo_frame = world.bodies.body(cargo).frame;
        let ballast_frame = world.bodies.body(ballast).frame;
        assert_eq!(world.frames.frame(cargo_frame).parent, Some(ballast_frame));
    }

    #[test]
    fn dyn_under_mass_is_illegal_and_leaves_world_untouched() {
        let mut world = world_with_fleet();
        let mut action = AttachMatrix::named("bad");
        action.subject().set_dyn_body("probe");
        action.parent().set_mass_body("ballast");
        action.initialize(&mut world).unwrap();
        // terminate_on_error unset: a failed attach is logged, not fatal.
        action.apply(&mut world).unwrap();

        let probe = world.find_body("probe").unwrap();
        assert_eq!(world.bodies.body(probe).parent, None);
        let frame = world.bodies.body(probe).frame;
        let inertial = world.find_frame("inertial").unwrap();
        assert_eq!(world.frames.frame(frame).parent, Some(inertial));
    }

    #[test]
    fn mass_under_frame_with_terminate_flag_is_fatal() {
        let mut world = world_with_fleet();
        let mut action = AttachMatrix::named("bad");
        action.subject().set_mass_body("ballast");
        action.parent().set_frame("inertial");
        action.set_terminate_on_error(true);
        action.initialize(&mut world).unwrap();
        let err = action.apply(&mut world).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ballast"));
        assert!(msg.contains("inertial"));
    }

    #[test]
    fn frame_subject_rejected_at_initialize() {
        let mut world = world_with_fleet();
        let mut action = AttachMatrix::named("bad");
        action.subject().set_frame("inertial");
        action.parent().set_dyn_body("ship");
        assert!(matches!(
            action.initialize(&mut world),
            Err(DynError::InvalidObject { .. })
        ));
    }

    #[test]
    fn aligned_attach_mates_named_points() {
        let mut world = world_with_fleet();
        let ship = world.find_body("ship").unwrap();
        let probe = world.find_body("probe").unwrap();
        world
            .bodies
            .body_mut(ship)
            .points
            .push(AttachPoint::at("dock", Vector3::new(2.0, 0.0, 0.0)));
        world
            .bodies
            .body_mut(probe)
            .points
            .push(AttachPoint::at("nose", Vector3::new(1.0, 0.0, 0.0)));

        let mut action = AttachAligned::named("mate");
        action.subject().set_dyn_body("probe");
        action.parent().set_dyn_body("ship");
        action.subject_point = "nose".into();
        action.parent_point = "dock".into();
        action.initialize(&mut world).unwrap();
        action.apply(&mut world).unwrap();

        let probe_frame = world.bodies.body(probe).frame;
        let node = world.frames.frame(probe_frame);
        // The nose sits on the dock.
        let nose_in_ship =
            node.state.position + node.state.attitude.inverse() * Vector3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(nose_in_ship, Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn aligned_attach_with_missing_point_fails_without_error() {
        let mut world = world_with_fleet();
        let mut action = AttachAligned::named("mate");
        action.subject().set_dyn_body("probe");
        action.parent().set_dyn_body("ship");
        action.subject_point = "nose".into();
        action.parent_point = "dock".into();
        action.initialize(&mut world).unwrap();
        // Neither point exists: the attach fails, is reported, and the
        // world is left alone.
        action.apply(&mut world).unwrap();
        let probe = world.find_body("probe").unwrap();
        assert_eq!(world.bodies.body(probe).parent, None);
    }

    #[test]
    fn aligned_attach_with_missing_point_and_terminate_flag_is_fatal() {
        let mut world = world_with_fleet();
        let mut action = AttachAligned::named("mate");
        action.subject().set_dyn_body("probe");
        action.parent().set_dyn_body("ship");
        action.subject_point = "nose".into();
        action.parent_point = "dock".into();
        action.set_terminate_on_error(true);
        action.initialize(&mut world).unwrap();
        let err = action.apply(&mut world).unwrap_err();
        assert!(matches!(err, DynError::NotPerformed { .. }));
        let msg = err.to_string();
        assert!(msg.contains("probe"));
        assert!(msg.contains("ship"));
    }

    #[test]
    fn aligned_attach_refuses_frame_parent() {
        let mut world = world_with_fleet();
        let mut action = AttachAligned::named("mate");
        action.subject().set_dyn_body("probe");
        action.parent().set_frame("inertial");
        action.subject_point = "nose".into();
        action.parent_point = "dock".into();
        action.initialize(&mut world).unwrap();
        // Refusal, not a configuration error.
        action.apply(&mut world).unwrap();
        let probe = world.find_body("probe").unwrap();
        assert_eq!(world.bodies.body(probe).parent, None);
    }
}
