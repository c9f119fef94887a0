// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene nodes and their geometry attachments

use crate::geometry::{Mesh, Transform};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a node in a [`Scene`](super::Scene).
///
/// The generation distinguishes a live node from an earlier node that
/// occupied the same slot and has since been cleared away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}v{}", self.index, self.generation)
    }
}

/// Surface appearance for a geometry attachment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [0.8, 0.8, 0.82],
            metalness: 0.1,
            roughness: 0.6,
        }
    }
}

/// A mesh attached to a node, with its material
#[derive(Debug, Clone)]
pub struct Geometry {
    pub mesh: Mesh,
    pub material: Material,
}

impl Geometry {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            material: Material::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub(crate) geometries: Vec<Geometry>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl SceneNode {
    pub fn new(name: Option<String>, transform: Transform) -> Self {
        Self {
            name,
            transform,
            ..Default::default()
        }
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty() && self.children.is_empty()
    }
}
