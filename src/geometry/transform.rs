// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Local node transform: translation, XYZ Euler rotation, scale

use crate::utils::math::euler_xyz;
use nalgebra::{Matrix3, Matrix4, Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Translation, rotation (three independent axis angles in radians, applied
/// X then Y then Z in matrix order `Rx * Ry * Rz`) and non-uniform scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vector3<f64>,
    pub rotation: Vector3<f64>,
    pub scale: Vector3<f64>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_position(position: Vector3<f64>) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Build from a quaternion rotation, converting it to XYZ Euler angles
    pub fn from_trs(position: Vector3<f64>, rotation: &UnitQuaternion<f64>, scale: Vector3<f64>) -> Self {
        let rotation_matrix = rotation.to_rotation_matrix();
        let m = rotation_matrix.matrix();
        let m13 = m[(0, 2)].clamp(-1.0, 1.0);
        let y = m13.asin();
        let (x, z) = if m13.abs() < 0.999_999_9 {
            ((-m[(1, 2)]).atan2(m[(2, 2)]), (-m[(0, 1)]).atan2(m[(0, 0)]))
        } else {
            // Gimbal lock: fold the remaining rotation into X
            (m[(2, 1)].atan2(m[(1, 1)]), 0.0)
        };

        Self {
            position,
            rotation: Vector3::new(x, y, z),
            scale,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Local matrix `T * R * S`
    pub fn matrix(&self) -> Matrix4<f64> {
        let linear = euler_xyz(&self.rotation) * Matrix3::from_diagonal(&self.scale);
        let mut matrix = linear.to_homogeneous();
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.position);
        matrix
    }

    /// Same transform with the rotation replaced
    pub fn with_rotation(&self, rotation: Vector3<f64>) -> Self {
        Self { rotation, ..*self }
    }

    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.matrix().transform_point(point)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
