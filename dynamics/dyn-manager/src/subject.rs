//! Tagged references to the body or frame an action operates on.
//!
//! The subject, parent, and detach-from roles of an action all accept
//! "exactly one of a mass-only body, a dynamics-capable body, or a
//! frame". Storing the role as a single tagged variant with
//! whole-variant setters makes the exclusivity structural: assigning
//! one kind atomically clears any other, and disagreement between
//! redundant fields cannot exist.

use dyn_types::{BodyId, DynError, FrameId, Result};

use crate::action::ActionIdent;
use crate::world::World;

/// A by-name reference to a body or frame, tagged with the view the
/// user supplied.
///
/// The view drives the attach/detach dispatch tables: a
/// dynamics-capable body referenced through the mass-only view takes
/// part as a mass body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubjectRef {
    /// Nothing assigned yet.
    #[default]
    Unset,
    /// A body, viewed mass-only.
    MassBody(String),
    /// A body, viewed dynamics-capable.
    DynBody(String),
    /// A free-standing reference frame.
    Frame(String),
}

/// A [`SubjectRef`] resolved against the world registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedRef {
    /// A body taking part through its mass-only view.
    Mass(BodyId),
    /// A dynamics-capable body.
    Dyn(BodyId),
    /// A free-standing frame.
    Frame(FrameId),
}

impl SubjectRef {
    /// Assign a mass-only body reference, clearing any other kind.
    pub fn set_mass_body(&mut self, name: impl Into<String>) {
        *self = Self::MassBody(name.into());
    }

    /// Assign a dynamics-capable body reference, clearing any other
    /// kind.
    pub fn set_dyn_body(&mut self, name: impl Into<String>) {
        *self = Self::DynBody(name.into());
    }

    /// Assign a frame reference, clearing any other kind.
    pub fn set_frame(&mut self, name: impl Into<String>) {
        *self = Self::Frame(name.into());
    }

    /// Returns true if any reference has been assigned.
    #[must_use]
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// The referenced name for diagnostics; "Unknown" when unset.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Unset => "Unknown",
            Self::MassBody(n) | Self::DynBody(n) | Self::Frame(n) => n,
        }
    }

    /// Resolve against the world registries.
    ///
    /// `Unset` and name misses are missing-reference errors; a
    /// dynamics view of a mass-only body is a kind error.
    pub fn resolve(&self, world: &World, ident: &ActionIdent, role: &str) -> Result<ResolvedRef> {
        match self {
            Self::Unset => Err(DynError::NullPointer {
                ident: ident.to_string(),
                field: role.into(),
            }),
            Self::MassBody(name) => {
                let id = find_body(world, ident, role, name)?;
                Ok(ResolvedRef::Mass(id))
            }
            Self::DynBody(name) => {
                let id = find_body(world, ident, role, name)?;
                if !world.bodies.body(id).is_dynamics() {
                    return Err(DynError::InvalidObject {
                        ident: ident.to_string(),
                        name: name.clone(),
                        expected: "dynamics-capable body".into(),
                    });
                }
                Ok(ResolvedRef::Dyn(id))
            }
            Self::Frame(name) => {
                let id = world
                    .find_frame(name)
                    .ok_or_else(|| DynError::NullPointer {
                        ident: ident.to_string(),
                        field: format!("{role} frame '{name}'"),
                    })?;
                Ok(ResolvedRef::Frame(id))
            }
        }
    }

    /// Resolve to a body, rejecting the frame view.
    pub fn resolve_body(&self, world: &World, ident: &ActionIdent, role: &str) -> Result<BodyId> {
        match self.resolve(world, ident, role)? {
            ResolvedRef::Mass(id) | ResolvedRef::Dyn(id) => Ok(id),
            ResolvedRef::Frame(_) => Err(DynError::InvalidObject {
                ident: ident.to_string(),
                name: self.display_name().into(),
                expected: "body".into(),
            }),
        }
    }

    /// Resolve to a dynamics-capable body regardless of view.
    pub fn resolve_dyn_body(
        &self,
        world: &World,
        ident: &ActionIdent,
        role: &str,
    ) -> Result<BodyId> {
        let id = self.resolve_body(world, ident, role)?;
        if !world.bodies.body(id).is_dynamics() {
            return Err(DynError::InvalidObject {
                ident: ident.to_string(),
                name: self.display_name().into(),
                expected: "dynamics-capable body".into(),
            });
        }
        Ok(id)
    }
}

fn find_body(world: &World, ident: &ActionIdent, role: &str, name: &str) -> Result<BodyId> {
    world.find_body(name).ok_or_else(|| DynError::NullPointer {
        ident: ident.to_string(),
        field: format!("{role} body '{name}'"),
    })
}
