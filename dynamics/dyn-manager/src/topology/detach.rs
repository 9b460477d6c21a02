//! Detach actions: the structural inverse of attach.

use dyn_body::mechanics;
use dyn_types::{BodyId, DynError, Result};

use crate::action::{Action, ActionIdent, ActionKind};
use crate::subject::{ResolvedRef, SubjectRef};
use crate::world::World;

/// Dispatch a detach over the (subject, target) kind pair.
///
/// dyn-from-dyn separates a child dynamics body, mass-from-dyn
/// jettisons, mass-from-mass severs a mass link. A dynamics subject
/// under a mass-only target is illegal and fails without touching the
/// world.
fn dispatch(
    world: &mut World,
    subject: ResolvedRef,
    target_is_dyn: bool,
    target: BodyId,
) -> Result<bool> {
    let World { bodies, frames, .. } = world;
    match subject {
        ResolvedRef::Dyn(s) if target_is_dyn => {
            mechanics::detach_dyn_from_dyn(bodies, frames, s, target)
        }
        ResolvedRef::Dyn(_) => Ok(false),
        ResolvedRef::Mass(s) if target_is_dyn => {
            mechanics::detach_mass_from_dyn(bodies, frames, s, target)
        }
        ResolvedRef::Mass(s) => mechanics::detach_mass_from_mass(bodies, frames, s, target),
        ResolvedRef::Frame(_) => Err(DynError::InvalidObject {
            ident: "detach".into(),
            name: "frame subject".into(),
            expected: "body".into(),
        }),
    }
}

fn report(
    ident: &ActionIdent,
    terminate_on_error: bool,
    succeeded: bool,
    subject: &str,
    target: &str,
) -> Result<()> {
    if succeeded {
        tracing::debug!(
            code = "dyn_manager/topology",
            action = %ident,
            subject = %subject,
            target = %target,
            "detach succeeded"
        );
        return Ok(());
    }
    let detail = format!("could not detach {subject} from {target}");
    if terminate_on_error {
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

/// Detaches the subject from its current mass-tree parent, or from an
/// explicitly named ancestor.
#[derive(Debug, Default)]
pub struct DetachAction {
    /// User-supplied instance name; empty for unnamed instances.
    pub name: String,
    /// Participate in scheduling at all.
    pub active: bool,
    /// The body being detached.
    pub subject: SubjectRef,
    /// What to detach from; the subject's current mass-tree parent
    /// when unset.
    pub detach_from: SubjectRef,
    /// Escalate a failed detach to a fatal error.
    pub terminate_on_error: bool,

    ident: Option<ActionIdent>,
    resolved_subject: Option<ResolvedRef>,
    resolved_from: Option<BodyId>,
}

impl DetachAction {
    /// A named, active detach.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            ..Self::default()
        }
    }

    fn ident_or_new(&self) -> ActionIdent {
        self.ident
            .clone()
            .unwrap_or_else(|| ActionIdent::new("DetachAction", &self.name))
    }
}

impl Action for DetachAction {
    fn type_label(&self) -> &'static str {
        "DetachAction"
    }

    fn user_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Other
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        let ident = ActionIdent::new(self.type_label(), &self.name);
        let subject = self.subject.resolve(world, &ident, "subject")?;
        if matches!(subject, ResolvedRef::Frame(_)) {
            return Err(DynError::InvalidObject {
                ident: ident.to_string(),
                name: self.subject.display_name().into(),
                expected: "body".into(),
            });
        }
        if self.detach_from.is_set() {
            self.resolved_from = Some(self.detach_from.resolve_body(world, &ident, "detach_from")?);
        }
        self.resolved_subject = Some(subject);
        self.ident = Some(ident);
        Ok(())
    }

    fn apply(&mut self, world: &mut World) -> Result<()> {
        let ident = self.ident_or_new();
        let subject = self.resolved_subject.ok_or_else(|| DynError::NullPointer {
            ident: ident.to_string(),
            field: "subject (initialize never ran)".into(),
        })?;
        let subject_id = match subject {
            ResolvedRef::Mass(id) | ResolvedRef::Dyn(id) => id,
            ResolvedRef::Frame(_) => {
                return Err(DynError::InvalidObject {
                    ident: ident.to_string(),
                    name: self.subject.display_name().into(),
                    expected: "body".into(),
                })
            }
        };
        // Default target: the subject's current mass-tree parent. A
        // free body has nothing to detach from, which is a failed
        // detach rather than a configuration error.
        let target = self
            .resolved_from
            .or_else(|| world.bodies.body(subject_id).parent);
        let (succeeded, target_name) = match target {
            Some(target) => {
                let target_is_dyn = world.bodies.body(target).is_dynamics();
                (
                    dispatch(world, subject, target_is_dyn, target)?,
                    world.bodies.body(target).name.clone(),
                )
            }
            None => (false, "Unknown".to_owned()),
        };
        report(
            &ident,
            self.terminate_on_error,
            succeeded,
            self.subject.display_name(),
            &target_name,
        )
    }
}

/// Detaches the subject from a specific named ancestor, with full
/// configuration validation at initialize time.
///
/// Unlike [`DetachAction`], every role inconsistency found at
/// initialize is collected and reported as one combined error, so the
/// user sees the whole list in a single run.
#[derive(Debug, Default)]
pub struct DetachSpecific {
    /// User-supplied instance name; empty for unnamed instances.
    pub name: String,
    /// Participate in scheduling at all.
    pub active: bool,
    /// The body being detached.
    pub subject: SubjectRef,
    /// The ancestor to detach from. Required.
    pub detach_from: SubjectRef,
    /// Escalate a failed detach to a fatal error.
    pub terminate_on_error: bool,

    ident: Option<ActionIdent>,
    resolved_subject: Option<ResolvedRef>,
    resolved_from: Option<BodyId>,
}

impl DetachSpecific {
    /// A named, active specific detach.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            ..Self::default()
        }
    }
}

impl Action for DetachSpecific {
    fn type_label(&self) -> &'static str {
        "DetachSpecific"
    }

    fn user_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Other
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        let ident = ActionIdent::new(self.type_label(), &self.name);
        let mut problems = Vec::new();

        let subject = match self.subject.resolve(world, &ident, "subject") {
            Ok(ResolvedRef::Frame(_)) => {
                problems.push(format!(
                    "subject '{}' is a frame, not a body",
                    self.subject.display_name()
                ));
                None
            }
            Ok(resolved) => Some(resolved),
            Err(err) => {
                problems.push(err.to_string());
                None
            }
        };
        let target = match self.detach_from.resolve_body(world, &ident, "detach_from") {
            Ok(id) => Some(id),
            Err(err) => {
                problems.push(err.to_string());
                None
            }
        };

        if let (Some(subject), Some(target)) = (subject, target) {
            let subject_id = match subject {
                ResolvedRef::Mass(id) | ResolvedRef::Dyn(id) => id,
                ResolvedRef::Frame(_) => unreachable!("frame subject filtered above"),
            };
            if subject_id == target {
                problems.push(format!(
                    "subject and detach target are both '{}'",
                    world.bodies.body(target).name
                ));
            }
            if matches!(subject, ResolvedRef::Dyn(_)) && !world.bodies.body(target).is_dynamics() {
                problems.push(format!(
                    "dynamics subject '{}' cannot detach from mass-only body '{}'",
                    self.subject.display_name(),
                    world.bodies.body(target).name
                ));
            }
        }

        if !problems.is_empty() {
            return Err(DynError::InconsistentSetup {
                ident: ident.to_string(),
                detail: problems.join("; "),
            });
        }
        self.resolved_subject = subject;
        self.resolved_from = target;
        self.ident = Some(ident);
        Ok(())
    }

    fn apply(&mut self, world: &mut World) -> Result<()> {
        let ident = self
            .ident
            .clone()
            .unwrap_or_else(|| ActionIdent::new(self.type_label(), &self.name));
        let (subject, target) = match (self.resolved_subject, self.resolved_from) {
            (Some(s), Some(t)) => (s, t),
            _ => {
                return Err(DynError::NullPointer {
                    ident: ident.to_string(),
                    field: "resolved roles (initialize never ran)".into(),
                })
            }
        };
        let target_is_dyn = world.bodies.body(target).is_dynamics();
        let succeeded = dispatch(world, subject, target_is_dyn, target)?;
        let target_name = world.bodies.body(target).name.clone();
        report(
            &ident,
            self.terminate_on_error,
            succeeded,
            self.subject.display_name(),
            &target_name,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::topology::AttachMatrix;
    use nalgebra::Vector3;

    fn world_with_stack() -> World {
        let mut world = World::new();
        world.add_root_frame("inertial").unwrap();
        world.add_dyn_body("ship", "inertial").unwrap();
        world.add_dyn_body("probe", "inertial").unwrap();
        world.add_mass_body("ballast").unwrap();

        let mut dock = AttachMatrix::named("dock");
        dock.subject().set_dyn_body("probe");
        dock.parent().set_dyn_body("ship");
        dock.offset = Vector3::new(0.0, 5.0, 0.0);
        dock.initialize(&mut world).unwrap();
        dock.apply(&mut world).unwrap();
        world
    }

    #[test]
    fn detach_defaults_to_current_parent() {
        let mut world = world_with_stack();
        let mut action = DetachAction::named("release");
        action.subject.set_dyn_body("probe");
        action.initialize(&mut world).unwrap();
        action.apply(&mut world).unwrap();

        let probe = world.find_body("probe").unwrap();
        assert_eq!(world.bodies.body(probe).parent, None);
    }

    #[test]
    fn detach_of_free_body_fails_quietly_without_flag() {
        let mut world = world_with_stack();
        let mut action = DetachAction::named("release");
        action.subject.set_mass_body("ballast");
        action.initialize(&mut world).unwrap();
        action.apply(&mut world).unwrap();
    }

    #[test]
    fn detach_of_free_body_is_fatal_with_flag() {
        let mut world = world_with_stack();
        let mut action = DetachAction::named("release");
        action.subject.set_mass_body("ballast");
        action.terminate_on_error = true;
        action.initialize(&mut world).unwrap();
        let err = action.apply(&mut world).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ballast"));
        assert!(msg.contains("Unknown"));
    }

    #[test]
    fn specific_detach_collects_all_inconsistencies() {
        let mut world = world_with_stack();
        let mut action = DetachSpecific::named("bad");
        // Dynamics subject paired with itself as a mass target and an
        // unresolvable name would each be a problem; use two at once.
        action.subject.set_dyn_body("probe");
        action.detach_from.set_dyn_body("probe");
        let err = action.initialize(&mut world).unwrap_err();
        assert!(matches!(err, DynError::InconsistentSetup { .. }));
        assert!(err.to_string().contains("probe"));

        let mut action = DetachSpecific::named("worse");
        action.subject.set_frame("inertial");
        action.detach_from.set_mass_body("ghost");
        let msg = action.initialize(&mut world).unwrap_err().to_string();
        // Both problems appear in one combined message.
        assert!(msg.contains("inertial"));
        assert!(msg.contains("ghost"));
    }

    #[test]
    fn specific_detach_from_named_ancestor() {
        let mut world = world_with_stack();
        let mut action = DetachSpecific::named("release");
        action.subject.set_dyn_body("probe");
        action.detach_from.set_dyn_body("ship");
        action.initialize(&mut world).unwrap();
        action.apply(&mut world).unwrap();

        let probe = world.find_body("probe").unwrap();
        assert_eq!(world.bodies.body(probe).parent, None);
    }

    #[test]
    fn dyn_from_mass_is_illegal() {
        let mut world = world_with_stack();
        // A dynamics subject paired with a mass-only detach target is
        // rejected at initialize by DetachSpecific.
        let mut action = DetachSpecific::named("bad");
        action.subject.set_dyn_body("probe");
        action.detach_from.set_mass_body("ballast");
        assert!(matches!(
            action.initialize(&mut world),
            Err(DynError::InconsistentSetup { .. })
        ));
    }
}
