// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - mesh ingestion from supported file formats
//!
//! Ingestion is pure: it turns bytes into an [`Asset`] and never touches the
//! scene, so a failed load cannot disturb what is currently displayed.

mod asset;
mod gltf;
mod obj;
mod stl;
mod threemf;

pub use asset::{Asset, MeshTree};

use crate::error::{Result, ViewerError};
use crate::geometry::Mesh;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// A format-specific parser
pub trait MeshParser: Send + Sync {
    fn format(&self) -> Format;

    /// Parse raw file bytes
    fn parse(&self, bytes: &[u8]) -> Result<Asset>;
}

/// The closed set of supported model formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Stl,
    Obj,
    #[serde(rename = "3mf")]
    ThreeMf,
    Gltf,
    Glb,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Stl,
        Format::Obj,
        Format::ThreeMf,
        Format::Gltf,
        Format::Glb,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Stl => "stl",
            Format::Obj => "obj",
            Format::ThreeMf => "3mf",
            Format::Gltf => "gltf",
            Format::Glb => "glb",
        }
    }

    /// Resolve a file name (`"model.STL"`) or bare extension (`"stl"`, `".stl"`)
    pub fn from_name(name: &str) -> Result<Self> {
        let extension = match name.rfind('.') {
            Some(dot) => &name[dot + 1..],
            None => name,
        };
        let extension = extension.trim().to_ascii_lowercase();

        Self::ALL
            .into_iter()
            .find(|format| format.extension() == extension)
            .ok_or_else(|| {
                if extension.is_empty() {
                    ViewerError::UnsupportedFormat(format!("'{}' has no extension", name))
                } else {
                    ViewerError::UnsupportedFormat(extension)
                }
            })
    }

    pub fn parser(&self) -> &'static dyn MeshParser {
        match self {
            Format::Stl => &stl::StlParser,
            Format::Obj => &obj::ObjParser,
            Format::ThreeMf => &threemf::ThreeMfParser,
            Format::Gltf => &gltf::GltfParser,
            Format::Glb => &gltf::GlbParser,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Parse bytes into an asset, keeping any node hierarchy the format carries
pub fn load_asset(name: &str, bytes: &[u8]) -> Result<Asset> {
    let format = Format::from_name(name)?;
    debug!(%format, bytes = bytes.len(), "parsing model");

    let asset = format.parser().parse(bytes)?;
    if asset.vertex_count() == 0 {
        return Err(ViewerError::EmptyGeometry);
    }

    debug!(
        %format,
        vertices = asset.vertex_count(),
        triangles = asset.triangle_count(),
        composite = asset.is_composite(),
        "parsed model"
    );
    Ok(asset)
}

/// Parse bytes into a single mesh; composite formats are flattened
pub fn load(name: &str, bytes: &[u8]) -> Result<Mesh> {
    load_asset(name, bytes)?.into_mesh()
}

/// Read and parse a model file from disk
pub fn load_file(path: impl AsRef<Path>) -> Result<Asset> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes = std::fs::read(path)?;
    load_asset(&name, &bytes)
}

/// Extensions accepted by [`load`], lowercase and without the dot
pub fn supported_extensions() -> Vec<&'static str> {
    Format::ALL.iter().map(Format::extension).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_name() {
        assert_eq!(Format::from_name("model.STL").unwrap(), Format::Stl);
        assert_eq!(Format::from_name("stl").unwrap(), Format::Stl);
        assert_eq!(Format::from_name(".obj").unwrap(), Format::Obj);
        assert_eq!(Format::from_name("part.v2.3MF").unwrap(), Format::ThreeMf);
        assert_eq!(Format::from_name("scene.glb").unwrap(), Format::Glb);
    }

    #[test]
    fn test_unknown_format() {
        assert!(matches!(
            Format::from_name("drawing.dxf"),
            Err(ViewerError::UnsupportedFormat(ext)) if ext == "dxf"
        ));
        assert!(matches!(
            Format::from_name(""),
            Err(ViewerError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_parser_reports_its_format() {
        for format in Format::ALL {
            assert_eq!(format.parser().format(), format);
        }
    }

    #[test]
    fn test_supported_extensions() {
        assert_eq!(supported_extensions(), vec!["stl", "obj", "3mf", "gltf", "glb"]);
    }

    #[test]
    fn test_unsupported_checked_before_parsing() {
        let result = load("model.step", b"ISO-10303-21;");
        assert!(matches!(result, Err(ViewerError::UnsupportedFormat(_))));
    }
}
