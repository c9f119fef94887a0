// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene graph owner
//!
//! Nodes live in a generational arena. Two roots, the model root and the
//! decoration root, are created with the scene and are never removed; loads
//! clear and refill them. World transforms and bounds are recomputed on every
//! query rather than cached, so a read can never observe a stale box.

mod environment;
mod node;

pub use environment::{AmbientLight, DirectionalLight, Environment, Ground};
pub use node::{Geometry, Material, NodeId, SceneNode};

use crate::config::SceneConfig;
use crate::error::{Result, ViewerError};
use crate::geometry::{BoundingBox, Mesh, Transform};
use crate::io::MeshTree;
use nalgebra::Matrix4;
use tracing::{error, trace};

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<SceneNode>,
}

#[derive(Debug, Clone)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    model_root: NodeId,
    decoration_root: NodeId,
    pub environment: Environment,
}

impl Scene {
    pub fn new(config: &SceneConfig) -> Self {
        let mut scene = Self {
            slots: Vec::new(),
            free: Vec::new(),
            model_root: NodeId {
                index: 0,
                generation: 0,
            },
            decoration_root: NodeId {
                index: 0,
                generation: 0,
            },
            environment: Environment::new(config),
        };
        scene.model_root = scene.insert(SceneNode::new(Some("model".into()), Transform::identity()));
        scene.decoration_root =
            scene.insert(SceneNode::new(Some("decoration".into()), Transform::identity()));
        scene
    }

    pub fn model_root(&self) -> NodeId {
        self.model_root
    }

    pub fn decoration_root(&self) -> NodeId {
        self.decoration_root
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.model_root || id == self.decoration_root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.generation == id.generation && slot.node.is_some())
    }

    /// Number of live nodes, roots included
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn node(&self, id: NodeId) -> Result<&SceneNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or_else(|| invalid_node(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or_else(|| invalid_node(id))
    }

    fn insert(&mut self, node: SceneNode) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Insert `node` as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeId, mut node: SceneNode) -> Result<NodeId> {
        self.node(parent)?;
        node.parent = Some(parent);
        node.children.clear();
        let id = self.insert(node);
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Attach a mesh to an existing node, taking ownership of it
    pub fn attach_mesh(&mut self, id: NodeId, mesh: Mesh) -> Result<()> {
        self.node_mut(id)?.geometries.push(Geometry::new(mesh));
        Ok(())
    }

    /// Rebuild a mesh hierarchy as child nodes of `parent`
    pub fn attach_tree(&mut self, parent: NodeId, tree: MeshTree) -> Result<NodeId> {
        let MeshTree {
            name,
            transform,
            meshes,
            children,
        } = tree;

        let mut node = SceneNode::new(name, transform);
        node.geometries = meshes.into_iter().map(Geometry::new).collect();
        let id = self.add_child(parent, node)?;

        for child in children {
            self.attach_tree(id, child)?;
        }
        Ok(id)
    }

    /// Release the node's geometry and descendants and reset its transform.
    ///
    /// Returns the ids of the destroyed descendants.
    pub fn clear_node(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        let node = self.node_mut(id)?;
        let children = std::mem::take(&mut node.children);
        node.geometries.clear();
        node.transform = Transform::identity();

        let mut removed = Vec::new();
        for child in children {
            self.remove_subtree(child, &mut removed);
        }
        trace!(node = %id, removed = removed.len(), "cleared node");
        Ok(removed)
    }

    fn remove_subtree(&mut self, id: NodeId, removed: &mut Vec<NodeId>) {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return;
        };
        if slot.generation != id.generation {
            return;
        }
        let Some(node) = slot.node.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        removed.push(id);

        for child in node.children {
            self.remove_subtree(child, removed);
        }
    }

    /// Every node in the subtree rooted at `id`, `id` first
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node(current)?;
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// World matrix of the node's parent (identity for a root)
    pub fn parent_world_matrix(&self, id: NodeId) -> Result<Matrix4<f64>> {
        match self.node(id)?.parent {
            Some(parent) => self.world_matrix(parent),
            None => Ok(Matrix4::identity()),
        }
    }

    pub fn world_matrix(&self, id: NodeId) -> Result<Matrix4<f64>> {
        let node = self.node(id)?;
        Ok(self.parent_world_matrix(id)? * node.transform.matrix())
    }

    /// Every mesh in the subtree with its matrix into the node's local
    /// space. The node's own transform is not included.
    pub fn parts(&self, id: NodeId) -> Result<Vec<(Matrix4<f64>, &Mesh)>> {
        let mut parts = Vec::new();
        self.collect_parts(id, &Matrix4::identity(), &mut parts)?;
        Ok(parts)
    }

    fn collect_parts<'a>(
        &'a self,
        id: NodeId,
        matrix: &Matrix4<f64>,
        out: &mut Vec<(Matrix4<f64>, &'a Mesh)>,
    ) -> Result<()> {
        let node = self.node(id)?;
        for geometry in &node.geometries {
            out.push((*matrix, &geometry.mesh));
        }
        for &child in &node.children {
            let child_matrix = matrix * self.node(child)?.transform.matrix();
            self.collect_parts(child, &child_matrix, out)?;
        }
        Ok(())
    }

    /// World-space bounds of every vertex in the subtree
    pub fn world_bounds(&self, id: NodeId) -> Result<BoundingBox> {
        let world = self.world_matrix(id)?;
        let mut bounds = BoundingBox::empty();
        for (matrix, mesh) in self.parts(id)? {
            let to_world = world * matrix;
            for position in mesh.positions() {
                bounds.expand_to_include(&to_world.transform_point(position));
            }
        }
        Ok(bounds)
    }

    /// Merge the subtree into one world-space mesh, `None` when it holds no geometry
    pub fn flatten(&self, id: NodeId) -> Result<Option<Mesh>> {
        let world = self.world_matrix(id)?;
        let baked: Vec<Mesh> = self
            .parts(id)?
            .into_iter()
            .map(|(matrix, mesh)| mesh.transformed(&(world * matrix)))
            .collect();

        if baked.is_empty() {
            return Ok(None);
        }
        Mesh::merge(&baked).map(Some)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(&SceneConfig::default())
    }
}

fn invalid_node(id: NodeId) -> ViewerError {
    error!(node = %id, "node is not part of the scene");
    ViewerError::InvalidContext(format!("{} is not part of the scene", id))
}
