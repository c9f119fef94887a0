// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Placement normalization: horizontal centering and floor drop

use crate::config::PlacementConfig;
use crate::error::Result;
use crate::scene::{NodeId, Scene};
use nalgebra::Vector3;
use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct PlacementNormalizer {
    config: PlacementConfig,
}

impl PlacementNormalizer {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    /// Move the node so its world box is centered on the X/Z origin
    pub fn center_horizontally(&self, scene: &mut Scene, node: NodeId) -> Result<()> {
        let bounds = scene.world_bounds(node)?;
        if bounds.is_empty() {
            return Ok(());
        }
        let center = bounds.center();
        trace!(node = %node, dx = -center.x, dz = -center.z, "centering");
        translate_world(scene, node, Vector3::new(-center.x, 0.0, -center.z))
    }

    /// Lift or lower the node so its lowest point rests on `y = 0`
    pub fn drop_to_floor(&self, scene: &mut Scene, node: NodeId) -> Result<()> {
        let bounds = scene.world_bounds(node)?;
        if bounds.is_empty() || bounds.min.y.abs() <= self.config.floor_epsilon {
            return Ok(());
        }
        trace!(node = %node, dy = -bounds.min.y, "dropping to floor");
        translate_world(scene, node, Vector3::new(0.0, -bounds.min.y, 0.0))
    }

    pub fn center_and_drop_to_floor(&self, scene: &mut Scene, node: NodeId) -> Result<()> {
        self.center_horizontally(scene, node)?;
        self.drop_to_floor(scene, node)
    }

    /// Centering without grounding, for the decoration
    pub fn center_only(&self, scene: &mut Scene, node: NodeId) -> Result<()> {
        self.center_horizontally(scene, node)
    }
}

/// Apply a world-space offset to a node's local position
fn translate_world(scene: &mut Scene, node: NodeId, delta: Vector3<f64>) -> Result<()> {
    let parent_world = scene.parent_world_matrix(node)?;
    let local_delta = parent_world
        .try_inverse()
        .map(|inverse| inverse.transform_vector(&delta))
        .unwrap_or(delta);
    scene.node_mut(node)?.transform.position += local_delta;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Primitive, Transform};
    use crate::scene::SceneNode;
    use approx::assert_relative_eq;

    fn scene_with_cube(offset: Vector3<f64>) -> (Scene, NodeId) {
        let mut scene = Scene::default();
        let root = scene.model_root();
        let mesh = Primitive::cube(20.0).to_mesh().transformed(
            &Transform::from_position(offset).matrix(),
        );
        scene.attach_mesh(root, mesh).unwrap();
        (scene, root)
    }

    #[test]
    fn test_cube_rests_on_floor() {
        let (mut scene, root) = scene_with_cube(Vector3::zeros());
        PlacementNormalizer::default()
            .center_and_drop_to_floor(&mut scene, root)
            .unwrap();
        assert_eq!(scene.node(root).unwrap().transform.position, Vector3::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn test_offset_model_is_centered() {
        let (mut scene, root) = scene_with_cube(Vector3::new(30.0, 50.0, -12.0));
        PlacementNormalizer::default()
            .center_and_drop_to_floor(&mut scene, root)
            .unwrap();
        let bounds = scene.world_bounds(root).unwrap();
        assert_relative_eq!(bounds.center().x, 0.0);
        assert_relative_eq!(bounds.center().z, 0.0);
        assert_relative_eq!(bounds.min.y, 0.0);
    }

    #[test]
    fn test_idempotent() {
        let (mut scene, root) = scene_with_cube(Vector3::new(3.3, -7.1, 2.2));
        let placement = PlacementNormalizer::default();
        placement.center_and_drop_to_floor(&mut scene, root).unwrap();
        let first = scene.world_bounds(root).unwrap();
        placement.center_and_drop_to_floor(&mut scene, root).unwrap();
        let second = scene.world_bounds(root).unwrap();
        assert!(first.approx_eq(&second, 0.0005));
    }

    #[test]
    fn test_center_only_keeps_height() {
        let (mut scene, root) = scene_with_cube(Vector3::new(4.0, 25.0, 0.0));
        PlacementNormalizer::default().center_only(&mut scene, root).unwrap();
        let bounds = scene.world_bounds(root).unwrap();
        assert_eq!(bounds.min.y, 15.0);
        assert_eq!(bounds.center().x, 0.0);
    }

    #[test]
    fn test_nested_node_moves_in_parent_space() {
        let mut scene = Scene::default();
        let root = scene.model_root();
        scene.node_mut(root).unwrap().transform.scale = Vector3::new(2.0, 2.0, 2.0);
        let child = scene.add_child(root, SceneNode::default()).unwrap();
        scene.attach_mesh(child, Primitive::cube(2.0).to_mesh()).unwrap();

        PlacementNormalizer::default().drop_to_floor(&mut scene, child).unwrap();
        assert_eq!(scene.node(child).unwrap().transform.position.y, 1.0);
        assert_eq!(scene.world_bounds(child).unwrap().min.y, 0.0);
    }

    #[test]
    fn test_empty_node_is_noop() {
        let mut scene = Scene::default();
        let root = scene.model_root();
        PlacementNormalizer::default()
            .center_and_drop_to_floor(&mut scene, root)
            .unwrap();
        assert!(scene.node(root).unwrap().transform.is_identity());
    }
}
