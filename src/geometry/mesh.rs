// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities

use super::BoundingBox;
use crate::error::{Result, ViewerError};
use crate::utils::math::triangle_normal;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }
}

/// Triangular mesh produced by ingestion.
///
/// Positions are always present; the index buffer is optional (non-indexed
/// meshes are triangle soups of consecutive position triples). Normals are
/// computed at construction when the source did not supply a usable set.
/// The buffers are private so a mesh cannot change after it is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    positions: Vec<Point3<f64>>,
    normals: Vec<Vector3<f64>>,
    indices: Option<Vec<Triangle>>,
}

impl Mesh {
    /// Build a mesh from raw buffers.
    ///
    /// Fails with `EmptyGeometry` when there are no positions and with
    /// `ParseError` when an index points outside the position buffer.
    pub fn from_buffers(
        positions: Vec<Point3<f64>>,
        indices: Option<Vec<Triangle>>,
        normals: Option<Vec<Vector3<f64>>>,
    ) -> Result<Self> {
        if positions.is_empty() {
            return Err(ViewerError::EmptyGeometry);
        }

        if let Some(triangles) = &indices {
            let count = positions.len();
            if let Some(bad) = triangles
                .iter()
                .flat_map(|t| t.indices)
                .find(|&index| index >= count)
            {
                return Err(ViewerError::parse(
                    "mesh",
                    format!("index {} out of range for {} vertices", bad, count),
                ));
            }
        }

        let mut mesh = Self {
            normals: Vec::new(),
            positions,
            indices,
        };

        match normals {
            Some(normals) if normals.len() == mesh.positions.len() => mesh.normals = normals,
            _ => mesh.recompute_normals(),
        }

        Ok(mesh)
    }

    /// Build from in-crate generated buffers that are valid by construction
    pub(crate) fn from_generated(positions: Vec<Point3<f64>>, triangles: Vec<Triangle>) -> Self {
        let mut mesh = Self {
            normals: Vec::new(),
            positions,
            indices: Some(triangles),
        };
        mesh.recompute_normals();
        mesh
    }

    /// Build a mesh from a flat `[x, y, z, x, y, z, ...]` buffer
    pub fn from_flat(positions: &[f32], indices: Option<&[u32]>) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(ViewerError::parse(
                "mesh",
                format!("position buffer length {} is not a multiple of 3", positions.len()),
            ));
        }
        let points = positions
            .chunks_exact(3)
            .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
            .collect();
        let triangles = indices.map(triangles_from_flat).transpose()?;
        Self::from_buffers(points, triangles, None)
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    pub fn indices(&self) -> Option<&[Triangle]> {
        self.indices.as_deref()
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(triangles) => triangles.len(),
            None => self.positions.len() / 3,
        }
    }

    /// Iterate triangles as index triples, whether or not the mesh is indexed
    pub fn triangles(&self) -> Box<dyn Iterator<Item = Triangle> + '_> {
        match &self.indices {
            Some(triangles) => Box::new(triangles.iter().copied()),
            None => Box::new(
                (0..self.positions.len() / 3).map(|i| Triangle::new([3 * i, 3 * i + 1, 3 * i + 2])),
            ),
        }
    }

    /// Compute bounding box in mesh space
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.positions)
    }

    /// Return a copy with every vertex transformed by `matrix`
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Mesh {
        let linear: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(linear);

        Mesh {
            positions: self
                .positions
                .iter()
                .map(|p| matrix.transform_point(p))
                .collect(),
            normals: self
                .normals
                .iter()
                .map(|n| {
                    let transformed = normal_matrix * n;
                    transformed.try_normalize(1e-12).unwrap_or(*n)
                })
                .collect(),
            indices: self.indices.clone(),
        }
    }

    /// Concatenate meshes into one indexed mesh
    pub fn merge<'a>(meshes: impl IntoIterator<Item = &'a Mesh>) -> Result<Mesh> {
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut triangles = Vec::new();

        for mesh in meshes {
            let offset = positions.len();
            positions.extend_from_slice(&mesh.positions);
            normals.extend_from_slice(&mesh.normals);
            for triangle in mesh.triangles() {
                triangles.push(Triangle::new([
                    triangle.indices[0] + offset,
                    triangle.indices[1] + offset,
                    triangle.indices[2] + offset,
                ]));
            }
        }

        Mesh::from_buffers(positions, Some(triangles), Some(normals))
    }

    /// Recompute vertex normals from triangle geometry.
    ///
    /// Face normals are accumulated area-weighted at shared vertices; a
    /// non-indexed mesh therefore ends up with flat per-face normals.
    fn recompute_normals(&mut self) {
        let mut normal_sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.positions.len()];

        let triangles: Vec<Triangle> = self.triangles().collect();
        for triangle in triangles {
            let [i0, i1, i2] = triangle.indices;
            let face_normal = triangle_normal(
                &self.positions[i0],
                &self.positions[i1],
                &self.positions[i2],
            );

            // Unnormalized cross product is already weighted by area
            if face_normal.norm() > 1e-12 {
                for &idx in &triangle.indices {
                    normal_sums[idx] += face_normal;
                }
            }
        }

        self.normals = normal_sums
            .into_iter()
            .map(|sum| sum.try_normalize(1e-12).unwrap_or_else(Vector3::y))
            .collect();
    }
}

fn triangles_from_flat(indices: &[u32]) -> Result<Vec<Triangle>> {
    if indices.len() % 3 != 0 {
        return Err(ViewerError::parse(
            "mesh",
            format!("index buffer length {} is not a multiple of 3", indices.len()),
        ));
    }
    Ok(indices
        .chunks_exact(3)
        .map(|t| Triangle::new([t[0] as usize, t[1] as usize, t[2] as usize]))
        .collect())
}
