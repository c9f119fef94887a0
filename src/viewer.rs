// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! The viewer facade
//!
//! [`Viewer`] owns the scene, camera, view mode and gizmo selection and is
//! the only way to mutate them. Collaborators (export, transform tools,
//! previews) hold node ids and go through its methods.

use crate::camera::{Camera, CameraFramer, Framing, OrbitControls, Viewport};
use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::geometry::{BoundingBox, Mesh, Transform};
use crate::gizmo::{GizmoAdapter, GizmoBackend, GizmoMode, GizmoSpace, GizmoState};
use crate::io::{self, Asset, MeshTree};
use crate::loader::{LoadEvent, LoadQueue, LoadTicket};
use crate::orientation::{apply_rotation, CandidateRotation, OrientationChoice, OrientationSolver};
use crate::placement::PlacementNormalizer;
use crate::scene::{Environment, NodeId, Scene, SceneNode};
use crate::view_mode::{ModeChange, ViewMode, ViewModeController};
use nalgebra::Point3;
use std::f64::consts::TAU;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub struct Viewer {
    config: ViewerConfig,
    scene: Scene,
    camera: Camera,
    orbit: OrbitControls,
    viewport: Viewport,
    solver: OrientationSolver,
    placement: PlacementNormalizer,
    framer: CameraFramer,
    view_mode: ViewModeController,
    gizmo: GizmoAdapter,
    loads: LoadQueue,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ViewerConfig) -> Self {
        let [width, height] = config.scene.viewport;
        let viewport = Viewport::new(width, height);
        let solver = OrientationSolver::new(config.orientation.clone());

        Self {
            scene: Scene::new(&config.scene),
            camera: Camera::new(config.camera.fov_degrees, viewport.aspect()),
            orbit: OrbitControls::new(config.view_mode.auto_rotate_speed),
            viewport,
            placement: PlacementNormalizer::new(config.placement.clone()),
            framer: CameraFramer::new(config.camera.clone()),
            view_mode: ViewModeController::new(config.view_mode.clone()),
            gizmo: GizmoAdapter::default(),
            loads: LoadQueue::new(solver.clone()),
            solver,
            config,
        }
    }

    /// Replace the headless gizmo with a real widget
    pub fn with_gizmo_backend(mut self, backend: Box<dyn GizmoBackend>) -> Self {
        self.gizmo = GizmoAdapter::new(backend);
        self
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    // ----- Loading -------------------------------------------------------

    /// Replace the model with `mesh`, then orient, ground and frame it
    pub fn load_model(&mut self, mesh: Mesh) -> Result<NodeId> {
        self.loads.supersede();
        self.install(Asset::Mesh(mesh), None).map(|(root, _)| root)
    }

    /// Replace the model with a node hierarchy, then orient, ground and frame it
    pub fn load_composite(&mut self, tree: MeshTree) -> Result<NodeId> {
        self.loads.supersede();
        self.install(Asset::Composite(tree), None).map(|(root, _)| root)
    }

    /// Load an already parsed asset, reporting the chosen orientation
    pub fn load_asset(&mut self, asset: Asset) -> Result<(NodeId, OrientationChoice)> {
        self.loads.supersede();
        self.install(asset, None)
    }

    /// Parse `bytes` and load the result.
    ///
    /// Parsing happens before anything is cleared, so a file that fails to
    /// parse leaves the current model on display. Pending background loads
    /// are discarded either way.
    pub fn load_file(&mut self, name: &str, bytes: &[u8]) -> Result<NodeId> {
        self.loads.supersede();
        let asset = io::load_asset(name, bytes).inspect_err(|e| {
            warn!(name, error = %e, "model load failed");
        })?;
        self.install(asset, None).map(|(root, _)| root)
    }

    /// Replace the decoration with `mesh` and center it (never grounded or oriented)
    pub fn load_decoration(&mut self, mesh: Mesh) -> Result<NodeId> {
        let root = self.scene.decoration_root();
        self.clear_root(root)?;
        self.scene.attach_mesh(root, mesh)?;
        self.placement.center_only(&mut self.scene, root)?;
        Ok(root)
    }

    /// Strictly sequential: clear, attach, rotate, normalize, frame
    fn install(
        &mut self,
        asset: Asset,
        orientation: Option<OrientationChoice>,
    ) -> Result<(NodeId, OrientationChoice)> {
        let (vertices, triangles) = (asset.vertex_count(), asset.triangle_count());
        if vertices == 0 {
            warn!("refusing to load a model without vertices");
            return Err(ViewerError::EmptyGeometry);
        }

        let root = self.scene.model_root();
        self.clear_root(root)?;

        match asset {
            Asset::Mesh(mesh) => self.scene.attach_mesh(root, mesh)?,
            Asset::Composite(tree) => {
                self.scene.attach_tree(root, tree)?;
            }
        }

        let choice = match orientation {
            Some(choice) => {
                apply_rotation(&mut self.scene, root, choice.rotation)?;
                choice
            }
            None => self.solver.choose_orientation(&mut self.scene, root)?,
        };
        self.placement.center_and_drop_to_floor(&mut self.scene, root)?;
        self.fit(root, self.config.camera.fill_ratio)?;

        info!(vertices, triangles, rotation = %choice.rotation, "model loaded");
        Ok((root, choice))
    }

    /// Remove the model's geometry and children and reset its transform
    pub fn clear(&mut self) -> Result<()> {
        self.clear_root(self.scene.model_root())
    }

    /// Clear model and decoration; the view mode is kept
    pub fn clear_all(&mut self) -> Result<()> {
        self.clear_root(self.scene.model_root())?;
        self.clear_root(self.scene.decoration_root())
    }

    fn clear_root(&mut self, root: NodeId) -> Result<()> {
        let removed = self.scene.clear_node(root)?;
        if self.gizmo.target().is_some_and(|target| removed.contains(&target)) {
            self.gizmo.detach();
            self.sync_orbit();
        }
        Ok(())
    }

    // ----- Background loading -------------------------------------------

    /// Parse and orient on the worker pool; applied by a later [`Self::poll_loads`]
    pub fn request_load(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> LoadTicket {
        self.loads.request(name.into(), bytes)
    }

    pub fn request_file_load(&mut self, path: impl Into<PathBuf>) -> LoadTicket {
        self.loads.request_file(path.into())
    }

    pub fn pending_loads(&self) -> usize {
        self.loads.pending()
    }

    /// Apply the latest finished load, discarding superseded ones
    pub fn poll_loads(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        for (generation, result) in self.loads.drain() {
            if !self.loads.is_current(generation) {
                debug!(generation, latest = self.loads.latest_generation(), "discarding stale load");
                events.push(LoadEvent::Discarded { generation });
                continue;
            }

            let applied = result.and_then(|prepared| {
                debug!(generation, name = %prepared.name, "applying background load");
                self.install(prepared.asset, Some(prepared.orientation))
            });
            events.push(match applied {
                Ok((root, orientation)) => LoadEvent::Applied {
                    generation,
                    root,
                    orientation,
                },
                Err(error) => {
                    warn!(generation, error = %error, "background load failed");
                    LoadEvent::Failed { generation, error }
                }
            });
        }
        events
    }

    /// Per-frame update: auto-rotation, decoration spin, finished loads
    pub fn tick(&mut self, dt: f64) -> Vec<LoadEvent> {
        self.orbit.update(&mut self.camera, dt);

        if let Some(angle) = self.view_mode.decoration_spin(dt) {
            let decoration = self.scene.decoration_root();
            if let Ok(node) = self.scene.node_mut(decoration) {
                let rotation = &mut node.transform.rotation;
                rotation.y = (rotation.y + angle).rem_euclid(TAU);
            }
        }

        self.poll_loads()
    }

    // ----- View mode -----------------------------------------------------

    pub fn set_view_mode(&mut self, mode: ViewMode) -> Result<()> {
        let change =
            self.view_mode
                .set_mode(mode, &mut self.scene.environment.ground, &mut self.orbit);

        if change == ModeChange::EnteredSpin {
            let decoration = self.scene.decoration_root();
            self.placement.center_only(&mut self.scene, decoration)?;

            // Without a decoration the model stays the subject
            let subject = if self.scene.world_bounds(decoration)?.is_empty() {
                self.scene.model_root()
            } else {
                decoration
            };
            self.fit(subject, self.view_mode.spin_fill_ratio())?;
        }
        Ok(())
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode.mode()
    }

    pub fn ground_visible(&self) -> bool {
        self.scene.environment.ground.visible
    }

    // ----- Nodes and placement ------------------------------------------

    pub fn model_root(&self) -> NodeId {
        self.scene.model_root()
    }

    pub fn decoration_root(&self) -> NodeId {
        self.scene.decoration_root()
    }

    pub fn node(&self, id: NodeId) -> Result<&SceneNode> {
        self.scene.node(id)
    }

    /// Transform edits are the only node mutation handed out
    pub fn node_transform_mut(&mut self, id: NodeId) -> Result<&mut Transform> {
        Ok(&mut self.scene.node_mut(id)?.transform)
    }

    pub fn world_bounds(&self, id: NodeId) -> Result<BoundingBox> {
        self.scene.world_bounds(id)
    }

    /// Subtree merged into one world-space mesh, for exporters
    pub fn flatten(&self, id: NodeId) -> Result<Option<Mesh>> {
        self.scene.flatten(id)
    }

    pub fn center_and_drop_to_floor(&mut self, id: NodeId) -> Result<()> {
        self.placement.center_and_drop_to_floor(&mut self.scene, id)
    }

    pub fn center_only(&mut self, id: NodeId) -> Result<()> {
        self.placement.center_only(&mut self.scene, id)
    }

    /// Re-run the orientation search on any node
    pub fn orient(&mut self, id: NodeId) -> Result<OrientationChoice> {
        self.solver.choose_orientation(&mut self.scene, id)
    }

    pub fn current_rotation(&self, id: NodeId) -> Result<Option<CandidateRotation>> {
        let rotation = self.scene.node(id)?.transform.rotation;
        Ok(crate::orientation::CANDIDATE_ROTATIONS
            .iter()
            .copied()
            .find(|candidate| candidate.euler() == rotation))
    }

    // ----- Camera --------------------------------------------------------

    pub fn fit(&mut self, id: NodeId, fill_ratio: f64) -> Result<Framing> {
        let bounds = self.scene.world_bounds(id)?;
        let origin = self.scene.world_matrix(id)?.transform_point(&Point3::origin());
        Ok(self
            .framer
            .fit(&bounds, origin, fill_ratio, &mut self.camera, &mut self.orbit))
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
        self.camera.aspect = self.viewport.aspect();
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn orbit(&self) -> &OrbitControls {
        &self.orbit
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn environment(&self) -> &Environment {
        &self.scene.environment
    }

    // ----- Gizmo ---------------------------------------------------------

    pub fn attach_gizmo(&mut self, id: NodeId) -> Result<()> {
        self.scene.node(id)?;
        self.gizmo.attach(id);
        self.sync_orbit();
        Ok(())
    }

    pub fn detach_gizmo(&mut self) {
        self.gizmo.detach();
        self.sync_orbit();
    }

    pub fn set_gizmo_mode(&mut self, mode: GizmoMode) {
        self.gizmo.set_mode(mode);
    }

    pub fn set_gizmo_space(&mut self, space: GizmoSpace) {
        self.gizmo.set_space(space);
    }

    pub fn set_gizmo_snap(&mut self, snap: Option<f64>) {
        self.gizmo.set_snap(snap);
    }

    pub fn set_gizmo_dragging(&mut self, dragging: bool) {
        self.gizmo.set_dragging(dragging);
        self.sync_orbit();
    }

    pub fn gizmo_state(&self) -> GizmoState {
        self.gizmo.state()
    }

    fn sync_orbit(&mut self) {
        self.orbit.enabled = !self.gizmo.blocks_orbit();
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::build(ViewerConfig::default())
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("view_mode", &self.view_mode.mode())
            .field("nodes", &self.scene.node_count())
            .field("gizmo", &self.gizmo)
            .field("pending_loads", &self.loads.pending())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Vector3;

    #[test]
    fn test_cube_load_pipeline() {
        let mut viewer = Viewer::default();
        let root = viewer.load_model(Primitive::cube(20.0).to_mesh()).unwrap();

        let transform = viewer.node(root).unwrap().transform;
        assert_eq!(transform.rotation, Vector3::zeros());
        assert_eq!(transform.position, Vector3::new(0.0, 10.0, 0.0));
        assert_eq!(viewer.orbit().target, Point3::new(0.0, 10.0, 0.0));
        assert_eq!(viewer.current_rotation(root).unwrap(), Some(CandidateRotation::IDENTITY));
    }

    #[test]
    fn test_failed_file_keeps_model() {
        let mut viewer = Viewer::default();
        let root = viewer.load_model(Primitive::cube(20.0).to_mesh()).unwrap();
        let before = viewer.world_bounds(root).unwrap();

        let result = viewer.load_file("broken.stl", b"solid x\n facet nonsense\n");
        assert!(matches!(result, Err(ViewerError::ParseError { .. })));
        assert_eq!(viewer.world_bounds(root).unwrap(), before);
        assert_eq!(viewer.node(root).unwrap().transform.position.y, 10.0);
    }

    #[test]
    fn test_clear_detaches_gizmo_from_destroyed_node() {
        let mut viewer = Viewer::default();
        let mut tree = MeshTree::default();
        let mut part = MeshTree::default();
        part.meshes.push(Primitive::cube(1.0).to_mesh());
        tree.children.push(part);
        let root = viewer.load_composite(tree).unwrap();

        let child = viewer.node(root).unwrap().children()[0];
        viewer.attach_gizmo(child).unwrap();
        viewer.set_gizmo_dragging(true);
        assert!(!viewer.orbit().enabled);

        viewer.clear().unwrap();
        assert_eq!(viewer.gizmo_state(), GizmoState::Detached);
        assert!(viewer.orbit().enabled);
        assert!(matches!(
            viewer.attach_gizmo(child),
            Err(ViewerError::InvalidContext(_))
        ));
    }

    #[test]
    fn test_spin_turns_decoration() {
        let mut viewer = Viewer::default();
        viewer
            .load_decoration(Primitive::cylinder(2.0, 30.0, 32).to_mesh())
            .unwrap();
        viewer.set_view_mode(ViewMode::Spin).unwrap();
        assert!(!viewer.ground_visible());

        viewer.tick(0.5);
        let rotation = viewer.node(viewer.decoration_root()).unwrap().transform.rotation;
        assert!((rotation.y - 0.4).abs() < 1e-12);

        viewer.set_view_mode(ViewMode::Table).unwrap();
        viewer.tick(0.5);
        let after = viewer.node(viewer.decoration_root()).unwrap().transform.rotation;
        assert_eq!(after, rotation);
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut viewer = Viewer::default();
        viewer.resize(500, 1000);
        assert_eq!(viewer.camera().aspect, 0.5);
        assert_eq!(viewer.viewport().shorter_side(), 500);
    }
}
