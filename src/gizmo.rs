// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Transform gizmo selection state
//!
//! The widget that draws handles and turns drags into transform edits lives
//! outside this crate behind [`GizmoBackend`]. This module owns only what is
//! attached and how it is configured.

use crate::scene::NodeId;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GizmoMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GizmoSpace {
    #[default]
    World,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GizmoAttachment {
    pub target: NodeId,
    pub mode: GizmoMode,
    pub space: GizmoSpace,
    /// Snap increment in world units (or radians when rotating)
    pub snap: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum GizmoState {
    #[default]
    Detached,
    Attached(GizmoAttachment),
}

/// The external manipulator widget
pub trait GizmoBackend: Send {
    fn attach(&mut self, attachment: &GizmoAttachment);
    fn detach(&mut self);
    /// Called whenever mode, space or snap change while attached
    fn configure(&mut self, attachment: &GizmoAttachment);
}

/// Backend that draws nothing, for headless use
#[derive(Debug, Default)]
pub struct NullGizmo;

impl GizmoBackend for NullGizmo {
    fn attach(&mut self, _attachment: &GizmoAttachment) {}
    fn detach(&mut self) {}
    fn configure(&mut self, _attachment: &GizmoAttachment) {}
}

pub struct GizmoAdapter {
    backend: Box<dyn GizmoBackend>,
    state: GizmoState,
    // Settings survive a detach and are reused by the next attach
    last_mode: GizmoMode,
    last_space: GizmoSpace,
    last_snap: Option<f64>,
    dragging: bool,
}

impl GizmoAdapter {
    pub fn new(backend: Box<dyn GizmoBackend>) -> Self {
        Self {
            backend,
            state: GizmoState::Detached,
            last_mode: GizmoMode::default(),
            last_space: GizmoSpace::default(),
            last_snap: None,
            dragging: false,
        }
    }

    pub fn state(&self) -> GizmoState {
        self.state
    }

    pub fn target(&self) -> Option<NodeId> {
        match self.state {
            GizmoState::Attached(attachment) => Some(attachment.target),
            GizmoState::Detached => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Orbit controls must stay off while a handle is being dragged
    pub fn blocks_orbit(&self) -> bool {
        self.dragging && self.target().is_some()
    }

    pub fn attach(&mut self, target: NodeId) {
        let attachment = GizmoAttachment {
            target,
            mode: self.last_mode,
            space: self.last_space,
            snap: self.last_snap,
        };
        debug!(node = %target, mode = ?attachment.mode, "gizmo attached");
        self.state = GizmoState::Attached(attachment);
        self.dragging = false;
        self.backend.attach(&attachment);
    }

    pub fn detach(&mut self) {
        if let GizmoState::Attached(attachment) = self.state {
            debug!(node = %attachment.target, "gizmo detached");
        }
        self.state = GizmoState::Detached;
        self.dragging = false;
        self.backend.detach();
    }

    pub fn set_mode(&mut self, mode: GizmoMode) {
        self.update(|attachment| attachment.mode = mode);
    }

    pub fn set_space(&mut self, space: GizmoSpace) {
        self.update(|attachment| attachment.space = space);
    }

    pub fn set_snap(&mut self, snap: Option<f64>) {
        let snap = snap.filter(|step| step.is_finite() && *step > 0.0);
        self.update(|attachment| attachment.snap = snap);
    }

    /// Drag notifications from the widget; ignored while detached
    pub fn set_dragging(&mut self, dragging: bool) {
        if self.target().is_some() {
            self.dragging = dragging;
        }
    }

    fn update(&mut self, edit: impl FnOnce(&mut GizmoAttachment)) {
        let GizmoState::Attached(attachment) = &mut self.state else {
            return;
        };
        edit(attachment);
        self.last_mode = attachment.mode;
        self.last_space = attachment.space;
        self.last_snap = attachment.snap;
        let attachment = *attachment;
        self.backend.configure(&attachment);
    }
}

impl Default for GizmoAdapter {
    fn default() -> Self {
        Self::new(Box::new(NullGizmo))
    }
}

impl std::fmt::Debug for GizmoAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GizmoAdapter")
            .field("state", &self.state)
            .field("dragging", &self.dragging)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl GizmoBackend for Recorder {
        fn attach(&mut self, attachment: &GizmoAttachment) {
            self.calls.lock().unwrap().push(format!("attach {:?}", attachment.mode));
        }
        fn detach(&mut self) {
            self.calls.lock().unwrap().push("detach".into());
        }
        fn configure(&mut self, attachment: &GizmoAttachment) {
            self.calls.lock().unwrap().push(format!("configure {:?}", attachment.mode));
        }
    }

    fn node() -> NodeId {
        Scene::default().model_root()
    }

    #[test]
    fn test_attach_defaults() {
        let mut gizmo = GizmoAdapter::default();
        gizmo.attach(node());
        assert_eq!(
            gizmo.state(),
            GizmoState::Attached(GizmoAttachment {
                target: node(),
                mode: GizmoMode::Translate,
                space: GizmoSpace::World,
                snap: None,
            })
        );
    }

    #[test]
    fn test_settings_survive_detach() {
        let mut gizmo = GizmoAdapter::default();
        gizmo.attach(node());
        gizmo.set_mode(GizmoMode::Rotate);
        gizmo.set_space(GizmoSpace::Local);
        gizmo.set_snap(Some(0.5));
        gizmo.detach();
        assert_eq!(gizmo.state(), GizmoState::Detached);

        gizmo.attach(node());
        let GizmoState::Attached(attachment) = gizmo.state() else {
            panic!("gizmo should be attached");
        };
        assert_eq!(attachment.mode, GizmoMode::Rotate);
        assert_eq!(attachment.space, GizmoSpace::Local);
        assert_eq!(attachment.snap, Some(0.5));
    }

    #[test]
    fn test_setters_ignored_while_detached() {
        let mut gizmo = GizmoAdapter::default();
        gizmo.set_mode(GizmoMode::Scale);
        gizmo.set_dragging(true);
        assert_eq!(gizmo.state(), GizmoState::Detached);
        assert!(!gizmo.is_dragging());

        gizmo.attach(node());
        let GizmoState::Attached(attachment) = gizmo.state() else {
            panic!("gizmo should be attached");
        };
        assert_eq!(attachment.mode, GizmoMode::Translate);
    }

    #[test]
    fn test_dragging_blocks_orbit_until_detach() {
        let mut gizmo = GizmoAdapter::default();
        gizmo.attach(node());
        gizmo.set_dragging(true);
        assert!(gizmo.blocks_orbit());
        gizmo.detach();
        assert!(!gizmo.blocks_orbit());
    }

    #[test]
    fn test_backend_is_notified() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut gizmo = GizmoAdapter::new(Box::new(Recorder {
            calls: Arc::clone(&calls),
        }));
        gizmo.attach(node());
        gizmo.set_mode(GizmoMode::Scale);
        gizmo.detach();
        gizmo.detach();

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["attach Translate", "configure Scale", "detach", "detach"]
        );
    }
}
