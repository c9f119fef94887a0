// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! glTF 2.0 importer (JSON with embedded buffers, and binary GLB)
//!
//! The node hierarchy of the default scene is preserved as a [`MeshTree`].
//! Only triangle-list primitives contribute geometry.

use super::{Asset, Format, MeshParser, MeshTree};
use crate::error::{Result, ViewerError};
use crate::geometry::{Mesh, Transform, Triangle};
use ::gltf::buffer::Source;
use ::gltf::mesh::Mode;
use ::gltf::{Document, Gltf, Node};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use nalgebra::{Point3, Quaternion, UnitQuaternion, Vector3};
use tracing::warn;

pub struct GltfParser;
pub struct GlbParser;

impl MeshParser for GltfParser {
    fn format(&self) -> Format {
        Format::Gltf
    }

    fn parse(&self, bytes: &[u8]) -> Result<Asset> {
        parse_gltf(bytes, "gltf")
    }
}

impl MeshParser for GlbParser {
    fn format(&self) -> Format {
        Format::Glb
    }

    fn parse(&self, bytes: &[u8]) -> Result<Asset> {
        parse_gltf(bytes, "glb")
    }
}

/// `Gltf::from_slice` sniffs the GLB magic itself, so both parsers share this
fn parse_gltf(bytes: &[u8], format: &str) -> Result<Asset> {
    let gltf = Gltf::from_slice(bytes).map_err(|e| ViewerError::parse(format, e))?;
    let buffers = resolve_buffers(&gltf.document, gltf.blob.as_deref(), format)?;

    let scene = gltf
        .document
        .default_scene()
        .or_else(|| gltf.document.scenes().next())
        .ok_or_else(|| ViewerError::parse(format, "document has no scene"))?;

    let mut root = MeshTree::new(scene.name().map(str::to_string), Transform::identity());
    for node in scene.nodes() {
        root.children.push(convert_node(&node, &buffers, format, 0)?);
    }
    Ok(Asset::Composite(root))
}

fn resolve_buffers(document: &Document, blob: Option<&[u8]>, format: &str) -> Result<Vec<Vec<u8>>> {
    document
        .buffers()
        .map(|buffer| {
            let data = match buffer.source() {
                Source::Bin => blob
                    .map(<[u8]>::to_vec)
                    .ok_or_else(|| ViewerError::parse(format, "missing binary chunk"))?,
                Source::Uri(uri) => decode_data_uri(uri, format)?,
            };
            if data.len() < buffer.length() {
                return Err(ViewerError::parse(
                    format,
                    format!(
                        "buffer {} holds {} bytes, {} declared",
                        buffer.index(),
                        data.len(),
                        buffer.length()
                    ),
                ));
            }
            Ok(data)
        })
        .collect()
}

/// Only embedded `data:` URIs can be resolved; there is no file system
/// context to fetch external buffers from.
fn decode_data_uri(uri: &str, format: &str) -> Result<Vec<u8>> {
    let payload = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, data)| data)
        .ok_or_else(|| {
            ViewerError::parse(format, format!("external buffer '{}' cannot be resolved", uri))
        })?;
    BASE64
        .decode(payload.as_bytes())
        .map_err(|e| ViewerError::parse(format, e))
}

const MAX_NODE_DEPTH: usize = 64;

fn convert_node(node: &Node, buffers: &[Vec<u8>], format: &str, depth: usize) -> Result<MeshTree> {
    if depth > MAX_NODE_DEPTH {
        return Err(ViewerError::parse(format, "node hierarchy too deep"));
    }

    let (translation, rotation, scale) = node.transform().decomposed();
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(
        rotation[3] as f64,
        rotation[0] as f64,
        rotation[1] as f64,
        rotation[2] as f64,
    ));
    let transform = Transform::from_trs(to_vector(translation), &rotation, to_vector(scale));

    let mut tree = MeshTree::new(node.name().map(str::to_string), transform);

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                warn!(mode = ?primitive.mode(), "skipping non-triangle glTF primitive");
                continue;
            }

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<Point3<f64>> = positions
                .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
                .collect();
            if positions.is_empty() {
                continue;
            }

            let normals = reader
                .read_normals()
                .map(|normals| normals.map(to_vector).collect::<Vec<_>>());
            let triangles = reader.read_indices().map(|indices| {
                let flat: Vec<u32> = indices.into_u32().collect();
                flat.chunks_exact(3)
                    .map(|t| Triangle::new([t[0] as usize, t[1] as usize, t[2] as usize]))
                    .collect::<Vec<_>>()
            });

            tree.meshes.push(Mesh::from_buffers(positions, triangles, normals)?);
        }
    }

    for child in node.children() {
        tree.children.push(convert_node(&child, buffers, format, depth + 1)?);
    }
    Ok(tree)
}

fn to_vector(v: [f32; 3]) -> Vector3<f64> {
    Vector3::new(v[0] as f64, v[1] as f64, v[2] as f64)
}
