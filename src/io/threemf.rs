// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 3MF (3D Manufacturing Format) importer
//!
//! Reads the model part of the OPC zip container, resolves components and
//! bakes build-item transforms into the meshes.

use super::{Asset, Format, MeshParser, MeshTree};
use crate::error::{Result, ViewerError};
use crate::geometry::{Mesh, Transform, Triangle};
use nalgebra::{Matrix4, Point3};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

const DEFAULT_MODEL_PATH: &str = "3D/3dmodel.model";
const MAX_COMPONENT_DEPTH: usize = 16;

pub struct ThreeMfParser;

impl MeshParser for ThreeMfParser {
    fn format(&self) -> Format {
        Format::ThreeMf
    }

    fn parse(&self, bytes: &[u8]) -> Result<Asset> {
        let xml = read_model_part(bytes)?;
        let model = parse_model_xml(&xml)?;
        model.into_asset()
    }
}

fn read_model_part(bytes: &[u8]) -> Result<String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ViewerError::parse("3mf", e))?;

    let name = if archive.by_name(DEFAULT_MODEL_PATH).is_ok() {
        DEFAULT_MODEL_PATH.to_string()
    } else {
        archive
            .file_names()
            .find(|n| n.to_ascii_lowercase().ends_with(".model"))
            .map(str::to_string)
            .ok_or_else(|| ViewerError::parse("3mf", "archive has no .model part"))?
    };

    let mut entry = archive
        .by_name(&name)
        .map_err(|e| ViewerError::parse("3mf", e))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| ViewerError::parse("3mf", e))?;
    Ok(xml)
}

#[derive(Debug, Default)]
struct ObjectDef {
    positions: Vec<Point3<f64>>,
    triangles: Vec<Triangle>,
    components: Vec<(u32, Matrix4<f64>)>,
}

#[derive(Debug, Default)]
struct Model {
    objects: HashMap<u32, ObjectDef>,
    /// Declaration order, so the fallback build is deterministic
    object_order: Vec<u32>,
    items: Vec<(u32, Matrix4<f64>)>,
}

fn parse_model_xml(xml: &str) -> Result<Model> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut model = Model::default();
    let mut current: Option<u32> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => parse_element(&mut model, &mut current, &e, true)?,
            Ok(Event::Empty(e)) => parse_element(&mut model, &mut current, &e, false)?,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"object" => current = None,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ViewerError::parse("3mf", e)),
        }
    }

    Ok(model)
}

/// Handle one opening or self-closing element; only an opened `<object>`
/// collects the geometry that follows it
fn parse_element(
    model: &mut Model,
    current: &mut Option<u32>,
    e: &BytesStart,
    opened: bool,
) -> Result<()> {
    match e.local_name().as_ref() {
        b"object" => {
            let id = required_attr(e, b"id")?;
            model.objects.insert(id, ObjectDef::default());
            model.object_order.push(id);
            *current = opened.then_some(id);
        }
        b"vertex" => {
            let object = current_object(model, *current)?;
            object.positions.push(Point3::new(
                required_attr(e, b"x")?,
                required_attr(e, b"y")?,
                required_attr(e, b"z")?,
            ));
        }
        b"triangle" => {
            let object = current_object(model, *current)?;
            object.triangles.push(Triangle::new([
                required_attr(e, b"v1")?,
                required_attr(e, b"v2")?,
                required_attr(e, b"v3")?,
            ]));
        }
        b"component" => {
            let object_id = required_attr(e, b"objectid")?;
            let transform = transform_attr(e)?;
            current_object(model, *current)?
                .components
                .push((object_id, transform));
        }
        b"item" => {
            let object_id = required_attr(e, b"objectid")?;
            model.items.push((object_id, transform_attr(e)?));
        }
        _ => {}
    }
    Ok(())
}

fn current_object(model: &mut Model, current: Option<u32>) -> Result<&mut ObjectDef> {
    current
        .and_then(|id| model.objects.get_mut(&id))
        .ok_or_else(|| ViewerError::parse("3mf", "geometry outside of an <object> element"))
}

fn attr_value(e: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ViewerError::parse("3mf", err))?;
        if attr.key.local_name().as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|err| ViewerError::parse("3mf", err))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required_attr<T: std::str::FromStr>(e: &BytesStart, name: &[u8]) -> Result<T> {
    let value = attr_value(e, name)?.ok_or_else(|| {
        ViewerError::parse(
            "3mf",
            format!("missing attribute '{}'", String::from_utf8_lossy(name)),
        )
    })?;
    value.trim().parse().map_err(|_| {
        ViewerError::parse(
            "3mf",
            format!(
                "invalid value '{}' for attribute '{}'",
                value,
                String::from_utf8_lossy(name)
            ),
        )
    })
}

/// 3MF transforms are 3x4 row-vector matrices: `m00 m01 m02 m10 ... m32`
fn transform_attr(e: &BytesStart) -> Result<Matrix4<f64>> {
    let Some(value) = attr_value(e, b"transform")? else {
        return Ok(Matrix4::identity());
    };

    let m: Vec<f64> = value
        .split_whitespace()
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| ViewerError::parse("3mf", format!("invalid transform '{}'", value)))?;
    if m.len() != 12 {
        return Err(ViewerError::parse(
            "3mf",
            format!("transform needs 12 values, got {}", m.len()),
        ));
    }

    #[rustfmt::skip]
    let matrix = Matrix4::new(
        m[0], m[3], m[6], m[9],
        m[1], m[4], m[7], m[10],
        m[2], m[5], m[8], m[11],
        0.0,  0.0,  0.0,  1.0,
    );
    Ok(matrix)
}

impl Model {
    fn into_asset(self) -> Result<Asset> {
        let items = if self.items.is_empty() {
            self.object_order
                .iter()
                .map(|&id| (id, Matrix4::identity()))
                .collect()
        } else {
            self.items.clone()
        };

        let mut meshes = Vec::with_capacity(items.len());
        for (object_id, transform) in items {
            let mut parts = Vec::new();
            self.collect(object_id, &transform, 0, &mut parts)?;
            if parts.is_empty() {
                continue;
            }
            meshes.push(Mesh::merge(&parts)?);
        }

        match meshes.len() {
            0 => Err(ViewerError::EmptyGeometry),
            1 => Ok(Asset::Mesh(meshes.remove(0))),
            _ => {
                let mut root = MeshTree::new(Some("build".into()), Transform::identity());
                for (index, mesh) in meshes.into_iter().enumerate() {
                    let mut item = MeshTree::new(Some(format!("item {}", index + 1)), Transform::identity());
                    item.meshes.push(mesh);
                    root.children.push(item);
                }
                Ok(Asset::Composite(root))
            }
        }
    }

    fn collect(
        &self,
        object_id: u32,
        transform: &Matrix4<f64>,
        depth: usize,
        out: &mut Vec<Mesh>,
    ) -> Result<()> {
        if depth > MAX_COMPONENT_DEPTH {
            return Err(ViewerError::parse("3mf", "component nesting too deep"));
        }
        let object = self.objects.get(&object_id).ok_or_else(|| {
            ViewerError::parse("3mf", format!("reference to unknown object {}", object_id))
        })?;

        if !object.positions.is_empty() {
            let mesh = Mesh::from_buffers(
                object.positions.clone(),
                Some(object.triangles.clone()),
                None,
            )?;
            out.push(mesh.transformed(transform));
        }

        for (child_id, child_transform) in &object.components {
            self.collect(*child_id, &(transform * child_transform), depth + 1, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const TETRA_OBJECT: &str = r#"<object id="1" type="model"><mesh>
        <vertices>
          <vertex x="0" y="0" z="0"/><vertex x="10" y="0" z="0"/>
          <vertex x="0" y="10" z="0"/><vertex x="0" y="0" z="10"/>
        </vertices>
        <triangles>
          <triangle v1="0" v2="2" v3="1"/><triangle v1="0" v2="1" v3="3"/>
          <triangle v1="0" v2="3" v3="2"/><triangle v1="1" v2="2" v3="3"/>
        </triangles>
      </mesh></object>"#;

    fn package(model_xml: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DEFAULT_MODEL_PATH, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(model_xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    fn model(resources: &str, build: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
  <resources>{}</resources>
  <build>{}</build>
</model>"#,
            resources, build
        )
    }

    #[test]
    fn test_single_item_is_mesh() {
        let bytes = package(&model(TETRA_OBJECT, r#"<item objectid="1"/>"#));
        let asset = ThreeMfParser.parse(&bytes).unwrap();
        assert!(!asset.is_composite());
        assert_eq!(asset.vertex_count(), 4);
        assert_eq!(asset.triangle_count(), 4);
    }

    #[test]
    fn test_item_transform_is_baked() {
        let build = r#"<item objectid="1" transform="1 0 0 0 1 0 0 0 1 100 0 0"/>"#;
        let bytes = package(&model(TETRA_OBJECT, build));
        let mesh = ThreeMfParser.parse(&bytes).unwrap().into_mesh().unwrap();
        let bbox = mesh.bounding_box();
        assert_eq!(bbox.min.x, 100.0);
        assert_eq!(bbox.max.x, 110.0);
    }

    #[test]
    fn test_multiple_items_are_composite() {
        let build = r#"<item objectid="1"/><item objectid="1" transform="1 0 0 0 1 0 0 0 1 0 0 50"/>"#;
        let bytes = package(&model(TETRA_OBJECT, build));
        let asset = ThreeMfParser.parse(&bytes).unwrap();
        assert!(asset.is_composite());
        assert_eq!(asset.vertex_count(), 8);
    }

    #[test]
    fn test_components_resolve() {
        let resources = format!(
            r#"{}<object id="2" type="model"><components>
                <component objectid="1" transform="1 0 0 0 1 0 0 0 1 0 20 0"/>
              </components></object>"#,
            TETRA_OBJECT
        );
        let bytes = package(&model(&resources, r#"<item objectid="2"/>"#));
        let mesh = ThreeMfParser.parse(&bytes).unwrap().into_mesh().unwrap();
        assert_eq!(mesh.bounding_box().min.y, 20.0);
    }

    #[test]
    fn test_not_a_zip() {
        let result = ThreeMfParser.parse(b"definitely not a zip archive");
        assert!(matches!(result, Err(ViewerError::ParseError { .. })));
    }

    #[test]
    fn test_unknown_object_reference() {
        let bytes = package(&model(TETRA_OBJECT, r#"<item objectid="9"/>"#));
        assert!(ThreeMfParser.parse(&bytes).is_err());
    }

    #[test]
    fn test_self_closing_object_collects_nothing() {
        let resources = format!(
            r#"{}<object id="2" type="model"/><vertex x="5" y="5" z="5"/>"#,
            TETRA_OBJECT
        );
        let bytes = package(&model(&resources, r#"<item objectid="1"/>"#));
        let result = ThreeMfParser.parse(&bytes);
        assert!(matches!(result, Err(ViewerError::ParseError { .. })));
    }
}
