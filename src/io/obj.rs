// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Wavefront OBJ importer (geometry only, materials ignored)

use super::{Asset, Format, MeshParser};
use crate::error::{Result, ViewerError};
use crate::geometry::{Mesh, Triangle};
use nalgebra::{Point3, Vector3};

pub struct ObjParser;

impl MeshParser for ObjParser {
    fn format(&self) -> Format {
        Format::Obj
    }

    fn parse(&self, bytes: &[u8]) -> Result<Asset> {
        let load_opts = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };

        let mut reader = bytes;
        let (models, _materials) = tobj::load_obj_buf(&mut reader, &load_opts, |_| {
            Ok((Vec::new(), Default::default()))
        })
        .map_err(|e| ViewerError::parse("obj", e))?;

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut triangles = Vec::new();
        let mut all_normals = true;

        // Objects and groups carry no transforms, so they merge into one mesh
        for model in models {
            let mesh = model.mesh;
            let offset = positions.len();
            let vertex_count = mesh.positions.len() / 3;

            positions.extend(
                mesh.positions
                    .chunks_exact(3)
                    .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64)),
            );

            if mesh.normals.len() == mesh.positions.len() {
                normals.extend(
                    mesh.normals
                        .chunks_exact(3)
                        .map(|n| Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64)),
                );
            } else {
                all_normals = false;
            }

            for tri in mesh.indices.chunks_exact(3) {
                let indices = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
                if indices.iter().any(|&i| i >= vertex_count) {
                    return Err(ViewerError::parse(
                        "obj",
                        format!("face index out of range in object '{}'", model.name),
                    ));
                }
                triangles.push(Triangle::new([
                    indices[0] + offset,
                    indices[1] + offset,
                    indices[2] + offset,
                ]));
            }
        }

        let normals = if all_normals { Some(normals) } else { None };
        Ok(Asset::Mesh(Mesh::from_buffers(positions, Some(triangles), normals)?))
    }
}
