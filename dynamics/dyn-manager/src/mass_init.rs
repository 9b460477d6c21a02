//! Mass-property initialization.

use dyn_types::{AttachPoint, DynError, MassProperties, Result};

use crate::action::{Action, ActionKind};
use crate::subject::SubjectRef;
use crate::world::World;

/// Sets a body's mass properties and registers its attachment points.
///
/// Mass initialization has no cross-body ordering dependency, so the
/// action is ready whenever it is active; the scheduler runs the whole
/// family in its first startup stage, before any attachment needs the
/// points registered here.
#[derive(Debug, Default)]
pub struct MassPropsInit {
    /// User-supplied instance name; empty for unnamed instances.
    pub name: String,
    /// Participate in scheduling at all.
    pub active: bool,
    /// The body being configured; mass-only or dynamics-capable.
    pub subject: SubjectRef,
    /// Mass properties to set; `None` leaves the current ones alone.
    pub mass_props: Option<MassProperties>,
    /// Attachment points to add to the body.
    pub points: Vec<AttachPoint>,

    subject_id: Option<dyn_types::BodyId>,
}

impl MassPropsInit {
    /// A named, active mass initializer with nothing assigned.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            ..Self::default()
        }
    }
}

impl Action for MassPropsInit {
    fn type_label(&self) -> &'static str {
        "MassPropsInit"
    }

    fn user_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::MassInit
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        let ident = self.ident();
        let subject = self.subject.resolve_body(world, &ident, "subject")?;
        for point in &self.points {
            if point.name.is_empty() {
                return Err(DynError::InvalidName {
                    ident: ident.to_string(),
                    field: "points".into(),
                    kind: "attachment point name".into(),
                });
            }
        }
        self.subject_id = Some(subject);
        Ok(())
    }

    fn apply(&mut self, world: &mut World) -> Result<()> {
        let subject = self.subject_id.ok_or_else(|| DynError::NullPointer {
            ident: self.ident().to_string(),
            field: "subject (initialize never ran)".into(),
        })?;
        let body = world.bodies.body_mut(subject);
        if let Some(mass_props) = self.mass_props.take() {
            body.mass_props = mass_props;
        }
        for point in self.points.drain(..) {
            if let Some(existing) = body.points.iter_mut().find(|p| p.name == point.name) {
                *existing = point;
            } else {
                body.points.push(point);
            }
        }
        Ok(())
    }
}
