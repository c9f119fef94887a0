// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Matrix3, Point3, Vector3};
use std::f64::consts::FRAC_PI_2;

const QUARTER_TURN_EPSILON: f64 = 1e-12;

/// Calculate the unnormalized normal of a triangle given three vertices
pub fn triangle_normal(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Vector3<f64> {
    let v1 = p1 - p0;
    let v2 = p2 - p0;
    v1.cross(&v2)
}

/// Check if two floats are approximately equal
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Sine and cosine of `angle`, exact for multiples of 90°.
///
/// `(PI / 2).cos()` is ~6e-17 rather than 0, which would make axis-aligned
/// poses differ by rounding noise and break score ties.
pub fn sin_cos_snapped(angle: f64) -> (f64, f64) {
    let turns = angle / FRAC_PI_2;
    let nearest = turns.round();
    if (turns - nearest).abs() < QUARTER_TURN_EPSILON {
        match (nearest as i64).rem_euclid(4) {
            0 => (0.0, 1.0),
            1 => (1.0, 0.0),
            2 => (0.0, -1.0),
            _ => (-1.0, 0.0),
        }
    } else {
        angle.sin_cos()
    }
}

/// Rotation about the X axis
pub fn rotation_x(angle: f64) -> Matrix3<f64> {
    let (s, c) = sin_cos_snapped(angle);
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c)
}

/// Rotation about the Y axis
pub fn rotation_y(angle: f64) -> Matrix3<f64> {
    let (s, c) = sin_cos_snapped(angle);
    Matrix3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c)
}

/// Rotation about the Z axis
pub fn rotation_z(angle: f64) -> Matrix3<f64> {
    let (s, c) = sin_cos_snapped(angle);
    Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Euler rotation applied in XYZ order (`Rx * Ry * Rz`)
pub fn euler_xyz(angles: &Vector3<f64>) -> Matrix3<f64> {
    rotation_x(angles.x) * rotation_y(angles.y) * rotation_z(angles.z)
}
