// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ingestion tests across formats

use anyhow::Result;
use nalgebra::Vector3;
use polyframe_viewer::geometry::{Mesh, Primitive};
use polyframe_viewer::io::{self, Format};
use polyframe_viewer::ViewerError;
use std::io::Write;

fn stl_bytes(mesh: &Mesh) -> Vec<u8> {
    let positions = mesh.positions();
    let vertex = |i: usize| {
        let p = positions[i];
        stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32])
    };
    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles()
        .map(|t| stl_io::Triangle {
            normal: stl_io::Normal::new([0.0, 0.0, 0.0]),
            vertices: [vertex(t.indices[0]), vertex(t.indices[1]), vertex(t.indices[2])],
        })
        .collect();

    let mut bytes = Vec::new();
    stl_io::write_stl(&mut bytes, triangles.iter()).unwrap();
    bytes
}

#[test]
fn test_binary_stl_cube() -> Result<()> {
    let bytes = stl_bytes(&Primitive::cube(20.0).to_mesh());
    let mesh = io::load("part.stl", &bytes)?;

    assert_eq!(mesh.triangle_count(), 12);
    // Corners are welded on import
    assert_eq!(mesh.vertex_count(), 8);
    let bbox = mesh.bounding_box();
    assert_eq!(bbox.size(), Vector3::new(20.0, 20.0, 20.0));
    Ok(())
}

#[test]
fn test_extension_matching_is_case_insensitive() -> Result<()> {
    let bytes = stl_bytes(&Primitive::cube(1.0).to_mesh());
    for name in ["MODEL.STL", "model.Stl", "stl", ".stl"] {
        let mesh = io::load(name, &bytes)?;
        assert_eq!(mesh.triangle_count(), 12, "{}", name);
    }
    Ok(())
}

#[test]
fn test_unsupported_format() {
    for name in ["drawing.dxf", "archive.zip", "noextension"] {
        assert!(
            matches!(io::load(name, b"data"), Err(ViewerError::UnsupportedFormat(_))),
            "{}",
            name
        );
    }
}

#[test]
fn test_malformed_data_is_parse_error() {
    let cases: [(&str, &[u8]); 4] = [
        ("broken.stl", b"solid broken\n facet normal oops\n"),
        ("broken.3mf", b"PK not really a zip"),
        ("broken.gltf", b"{ \"asset\": "),
        ("broken.glb", b"glTF\x02\x00\x00\x00"),
    ];
    for (name, bytes) in cases {
        assert!(
            matches!(io::load(name, bytes), Err(ViewerError::ParseError { .. })),
            "{}",
            name
        );
    }
}

#[test]
fn test_zero_triangle_stl_is_empty_geometry() {
    let mut bytes = Vec::new();
    stl_io::write_stl(&mut bytes, Vec::<stl_io::Triangle>::new().iter()).unwrap();
    assert!(matches!(
        io::load("empty.stl", &bytes),
        Err(ViewerError::EmptyGeometry)
    ));
}

#[test]
fn test_obj_normals_are_generated() -> Result<()> {
    let source = "v 0 0 0\nv 4 0 0\nv 0 0 -4\nf 1 2 3\n";
    let mesh = io::load("flat.obj", source.as_bytes())?;
    assert_eq!(mesh.normals().len(), 3);
    assert!(mesh
        .normals()
        .iter()
        .all(|n| (n - Vector3::y()).norm() < 1e-9));
    Ok(())
}

#[test]
fn test_load_file_from_disk() -> Result<()> {
    let mut file = tempfile::Builder::new().suffix(".STL").tempfile()?;
    file.write_all(&stl_bytes(&Primitive::cylinder(10.0, 3.0, 16).to_mesh()))?;

    let asset = io::load_file(file.path())?;
    assert!(!asset.is_composite());
    assert_eq!(asset.triangle_count(), 16 * 4);
    Ok(())
}

#[test]
fn test_missing_file_is_io_error() {
    let result = io::load_file("/definitely/not/here/model.stl");
    assert!(matches!(result, Err(ViewerError::Io(_))));
}

#[test]
fn test_every_format_has_a_parser() {
    assert_eq!(Format::ALL.len(), io::supported_extensions().len());
    for extension in io::supported_extensions() {
        let format = Format::from_name(extension).unwrap();
        assert_eq!(format.parser().format(), format);
    }
}
