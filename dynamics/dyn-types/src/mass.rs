//! Mass properties and body-fixed attachment points.

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mass, center of mass, and inertia of a body.
///
/// The center of mass is expressed in the body structure frame; the
/// inertia tensor is about the center of mass, in body axes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// Mass in kilograms.
    pub mass: f64,
    /// Center of mass in the body structure frame (meters).
    pub center_of_mass: Vector3<f64>,
    /// Inertia tensor about the center of mass (kg·m²).
    pub inertia: Matrix3<f64>,
}

impl Default for MassProperties {
    /// Zero mass at the origin with zero inertia.
    fn default() -> Self {
        Self {
            mass: 0.0,
            center_of_mass: Vector3::zeros(),
            inertia: Matrix3::zeros(),
        }
    }
}

impl MassProperties {
    /// A point mass at the body origin.
    #[must_use]
    pub fn point_mass(mass: f64) -> Self {
        Self {
            mass,
            ..Self::default()
        }
    }
}

/// A named attachment point fixed on a body.
///
/// The point defines a frame: `position` locates its origin in the
/// body structure frame, `orientation` rotates body-frame vectors into
/// point-frame vectors. Attach actions mate two such point frames.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttachPoint {
    /// Point name, unique within its body.
    pub name: String,
    /// Point origin in the body structure frame (meters).
    pub position: Vector3<f64>,
    /// Rotation from body axes to point axes.
    pub orientation: UnitQuaternion<f64>,
}

impl AttachPoint {
    /// An attachment point at the given body-frame offset with axes
    /// aligned to the body.
    #[must_use]
    pub fn at(name: impl Into<String>, position: Vector3<f64>) -> Self {
        Self {
            name: name.into(),
            position,
            orientation: UnitQuaternion::identity(),
        }
    }
}
