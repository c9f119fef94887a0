// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Parsed model assets: a single mesh or a node hierarchy

use crate::error::{Result, ViewerError};
use crate::geometry::{Mesh, Transform};
use nalgebra::Matrix4;

/// Output of a format parser
#[derive(Debug, Clone)]
pub enum Asset {
    Mesh(Mesh),
    Composite(MeshTree),
}

impl Asset {
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Mesh(mesh) => mesh.vertex_count(),
            Self::Composite(tree) => tree.vertex_count(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        match self {
            Self::Mesh(mesh) => mesh.triangle_count(),
            Self::Composite(tree) => tree.triangle_count(),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    /// Collapse into one mesh, baking hierarchy transforms
    pub fn into_mesh(self) -> Result<Mesh> {
        match self {
            Self::Mesh(mesh) => Ok(mesh),
            Self::Composite(tree) => tree.flatten(),
        }
    }
}

/// Node hierarchy for formats that carry one (glTF scenes, multi-item 3MF builds)
#[derive(Debug, Clone, Default)]
pub struct MeshTree {
    pub name: Option<String>,
    pub transform: Transform,
    pub meshes: Vec<Mesh>,
    pub children: Vec<MeshTree>,
}

impl MeshTree {
    pub fn new(name: Option<String>, transform: Transform) -> Self {
        Self {
            name,
            transform,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_count).sum::<usize>()
            + self.children.iter().map(MeshTree::vertex_count).sum::<usize>()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum::<usize>()
            + self.children.iter().map(MeshTree::triangle_count).sum::<usize>()
    }

    /// Every mesh paired with its matrix relative to `base`, this node's
    /// transform included
    pub fn parts(&self, base: &Matrix4<f64>) -> Vec<(Matrix4<f64>, &Mesh)> {
        let mut parts = Vec::new();
        self.collect_parts(base, &mut parts);
        parts
    }

    fn collect_parts<'a>(&'a self, parent: &Matrix4<f64>, out: &mut Vec<(Matrix4<f64>, &'a Mesh)>) {
        let matrix = parent * self.transform.matrix();
        for mesh in &self.meshes {
            out.push((matrix, mesh));
        }
        for child in &self.children {
            child.collect_parts(&matrix, out);
        }
    }

    /// Merge every mesh into one, in the tree's root space
    pub fn flatten(&self) -> Result<Mesh> {
        let baked: Vec<Mesh> = self
            .parts(&Matrix4::identity())
            .into_iter()
            .map(|(matrix, mesh)| mesh.transformed(&matrix))
            .collect();

        if baked.is_empty() {
            return Err(ViewerError::EmptyGeometry);
        }
        Mesh::merge(&baked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Vector3;

    #[test]
    fn test_flatten_applies_nested_transforms() {
        let mut root = MeshTree::new(Some("root".into()), Transform::from_position(Vector3::new(0.0, 10.0, 0.0)));
        let mut child = MeshTree::new(None, Transform::from_position(Vector3::new(5.0, 0.0, 0.0)));
        child.meshes.push(Primitive::cube(2.0).to_mesh());
        root.children.push(child);

        let mesh = root.flatten().unwrap();
        let bbox = mesh.bounding_box();
        assert_eq!(bbox.min, nalgebra::Point3::new(4.0, 9.0, -1.0));
        assert_eq!(bbox.max, nalgebra::Point3::new(6.0, 11.0, 1.0));
    }

    #[test]
    fn test_empty_tree_is_empty_geometry() {
        let tree = MeshTree::default();
        assert_eq!(tree.vertex_count(), 0);
        assert!(matches!(tree.flatten(), Err(ViewerError::EmptyGeometry)));
    }

    #[test]
    fn test_asset_counts() {
        let asset = Asset::Mesh(Primitive::cube(1.0).to_mesh());
        assert_eq!(asset.vertex_count(), 8);
        assert_eq!(asset.triangle_count(), 12);
        assert!(!asset.is_composite());
    }
}
