//! User-facing attitude specifications and their resolution.
//!
//! State-setting and attach actions accept an attitude in any of the
//! common input forms and resolve it to a single representation before
//! use. The resolution path for matrix input is deliberately
//! orientation → matrix → quaternion: downstream state composition is
//! quaternion-based, and the matrix form is re-orthonormalized on the
//! way through.

use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An attitude specification in one of the accepted user input forms.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Orientation {
    /// A unit quaternion, used as-is.
    Quaternion(UnitQuaternion<f64>),
    /// A rotation matrix (rows = destination axes in source coordinates).
    Matrix(Matrix3<f64>),
    /// Intrinsic x-y-z Euler rotation, angles in radians.
    EulerXyz(Vector3<f64>),
    /// Rotation about an axis by an angle (radians).
    AxisAngle {
        /// Rotation axis; need not be normalized.
        axis: Vector3<f64>,
        /// Rotation angle in radians.
        angle: f64,
    },
}

impl Default for Orientation {
    /// The identity rotation.
    fn default() -> Self {
        Self::Quaternion(UnitQuaternion::identity())
    }
}

impl Orientation {
    /// Resolve the specification to a unit quaternion.
    ///
    /// A degenerate axis-angle axis (near-zero norm) resolves to the
    /// identity rather than propagating a NaN.
    #[must_use]
    pub fn to_quaternion(&self) -> UnitQuaternion<f64> {
        match self {
            Self::Quaternion(q) => *q,
            Self::Matrix(m) => {
                let rotation = Rotation3::from_matrix(m);
                UnitQuaternion::from_rotation_matrix(&rotation)
            }
            Self::EulerXyz(angles) => {
                // Intrinsic x-y-z: post-multiply each single-axis rotation.
                let rx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angles.x);
                let ry = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angles.y);
                let rz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angles.z);
                rx * ry * rz
            }
            Self::AxisAngle { axis, angle } => {
                let norm = axis.norm();
                if norm < 1e-10 {
                    return UnitQuaternion::identity();
                }
                UnitQuaternion::from_axis_angle(&nalgebra::Unit::new_normalize(*axis), *angle)
            }
        }
    }

    /// Resolve the specification to a rotation matrix.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix3<f64> {
        match self {
            Self::Matrix(m) => *m,
            other => *other.to_quaternion().to_rotation_matrix().matrix(),
        }
    }
}
