// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator
//!
//! All primitives are centered on the origin with +Y up, which is how an
//! authored model arrives at the viewer before orientation.

use super::{Mesh, Triangle};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Geometric primitives
#[derive(Debug, Clone, Copy)]
pub enum Primitive {
    Cuboid { size: Vector3<f64> },
    Sphere { r: f64, segments: u32 },
    Cylinder { h: f64, r: f64, segments: u32 },
}

impl Primitive {
    pub fn cuboid(size: Vector3<f64>) -> Self {
        Self::Cuboid { size }
    }

    pub fn cube(edge: f64) -> Self {
        Self::Cuboid {
            size: Vector3::new(edge, edge, edge),
        }
    }

    pub fn sphere(r: f64, segments: u32) -> Self {
        let segments = if segments > 2 { segments } else { 32 };
        Self::Sphere { r, segments }
    }

    pub fn cylinder(h: f64, r: f64, segments: u32) -> Self {
        let segments = if segments > 2 { segments } else { 32 };
        Self::Cylinder { h, r, segments }
    }

    pub fn to_mesh(&self) -> Mesh {
        let (positions, triangles) = match *self {
            Self::Cuboid { size } => cuboid_buffers(size),
            Self::Sphere { r, segments } => sphere_buffers(r, segments),
            Self::Cylinder { h, r, segments } => cylinder_buffers(h, r, segments),
        };
        Mesh::from_generated(positions, triangles)
    }
}

type Buffers = (Vec<Point3<f64>>, Vec<Triangle>);

/// Eight shared corners, so every face-down pose touches exactly four vertices
fn cuboid_buffers(size: Vector3<f64>) -> Buffers {
    let h = size / 2.0;
    let positions = vec![
        Point3::new(-h.x, -h.y, -h.z),
        Point3::new(h.x, -h.y, -h.z),
        Point3::new(h.x, h.y, -h.z),
        Point3::new(-h.x, h.y, -h.z),
        Point3::new(-h.x, -h.y, h.z),
        Point3::new(h.x, -h.y, h.z),
        Point3::new(h.x, h.y, h.z),
        Point3::new(-h.x, h.y, h.z),
    ];

    let faces = [
        // Front (z+)
        [4, 5, 6],
        [4, 6, 7],
        // Back (z-)
        [1, 0, 3],
        [1, 3, 2],
        // Right (x+)
        [5, 1, 2],
        [5, 2, 6],
        // Left (x-)
        [0, 4, 7],
        [0, 7, 3],
        // Top (y+)
        [7, 6, 2],
        [7, 2, 3],
        // Bottom (y-)
        [0, 1, 5],
        [0, 5, 4],
    ];

    (positions, faces.into_iter().map(Triangle::new).collect())
}

fn sphere_buffers(radius: f64, segments: u32) -> Buffers {
    let stacks = segments as usize;
    let slices = segments as usize;
    let mut positions = Vec::with_capacity((stacks + 1) * (slices + 1));

    for i in 0..=stacks {
        let phi = PI * i as f64 / stacks as f64;
        let y = radius * phi.cos();
        let r = radius * phi.sin();

        for j in 0..=slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            positions.push(Point3::new(r * theta.cos(), y, r * theta.sin()));
        }
    }

    let mut triangles = Vec::with_capacity(stacks * slices * 2);
    for i in 0..stacks {
        for j in 0..slices {
            let first = i * (slices + 1) + j;
            let second = first + slices + 1;

            triangles.push(Triangle::new([first, second, first + 1]));
            triangles.push(Triangle::new([second, second + 1, first + 1]));
        }
    }

    (positions, triangles)
}

fn cylinder_buffers(height: f64, radius: f64, segments: u32) -> Buffers {
    let segments = segments as usize;
    let half = height / 2.0;

    let mut positions = vec![Point3::new(0.0, -half, 0.0), Point3::new(0.0, half, 0.0)];
    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        let (sin, cos) = angle.sin_cos();
        positions.push(Point3::new(radius * cos, -half, radius * sin));
        positions.push(Point3::new(radius * cos, half, radius * sin));
    }

    let mut triangles = Vec::with_capacity(segments * 4);
    for i in 0..segments {
        let next = (i + 1) % segments;
        let (b0, t0) = (2 + 2 * i, 3 + 2 * i);
        let (b1, t1) = (2 + 2 * next, 3 + 2 * next);

        triangles.push(Triangle::new([0, b0, b1]));
        triangles.push(Triangle::new([1, t1, t0]));
        triangles.push(Triangle::new([b0, t0, t1]));
        triangles.push(Triangle::new([b0, t1, b1]));
    }

    (positions, triangles)
}
