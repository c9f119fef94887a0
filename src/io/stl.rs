// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL importer (binary and ASCII)

use super::{Asset, Format, MeshParser};
use crate::error::{Result, ViewerError};
use crate::geometry::{Mesh, Triangle};
use nalgebra::Point3;
use std::io::Cursor;

pub struct StlParser;

impl MeshParser for StlParser {
    fn format(&self) -> Format {
        Format::Stl
    }

    fn parse(&self, bytes: &[u8]) -> Result<Asset> {
        let mut cursor = Cursor::new(bytes);
        let stl = stl_io::read_stl(&mut cursor).map_err(|e| ViewerError::parse("stl", e))?;

        let positions: Vec<Point3<f64>> = stl
            .vertices
            .iter()
            .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
            .collect();

        // stl_io welds shared corners, so vertex normals come from the faces
        let triangles: Vec<Triangle> = stl
            .faces
            .iter()
            .map(|face| Triangle::new(face.vertices))
            .collect();

        Ok(Asset::Mesh(Mesh::from_buffers(positions, Some(triangles), None)?))
    }
}
