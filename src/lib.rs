// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe Viewer
//!
//! Model viewing core: ingests STL, OBJ, 3MF and glTF models, picks a
//! resting orientation, centers the model on the ground and frames the
//! camera around it. Rendering is left to the host; this crate owns the
//! scene state the renderer draws.

pub mod camera;
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod gizmo;
pub mod io;
pub mod loader;
pub mod orientation;
pub mod placement;
pub mod scene;
pub mod utils;
pub mod view_mode;
pub mod viewer;

pub use camera::{Camera, Framing, OrbitControls, Viewport};
pub use config::ViewerConfig;
pub use error::{Result, ViewerError};
pub use geometry::{BoundingBox, Mesh, Primitive, Transform};
pub use gizmo::{GizmoBackend, GizmoMode, GizmoSpace, GizmoState};
pub use io::{Asset, MeshTree};
pub use loader::{LoadEvent, LoadTicket};
pub use orientation::{CandidateRotation, OrientationChoice, CANDIDATE_ROTATIONS};
pub use scene::{NodeId, SceneNode};
pub use view_mode::ViewMode;
pub use viewer::Viewer;

/// Parse a model and run it through a default viewer's load pipeline
pub fn view_bytes(name: &str, bytes: &[u8]) -> Result<Viewer> {
    let mut viewer = Viewer::default();
    viewer.load_file(name, bytes)?;
    Ok(viewer)
}
