// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Perspective camera, orbit controls and automatic framing

use crate::config::CameraConfig;
use crate::geometry::BoundingBox;
use nalgebra::{Matrix4, Point2, Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Extents below this are treated as zero when framing
const DEGENERATE_EXTENT: f64 = 1e-9;

/// Render surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn shorter_side(&self) -> u32 {
        self.width.min(self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Point3<f64>,
    pub target: Point3<f64>,
    /// Vertical field of view in degrees
    pub fov: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera {
    pub fn new(fov: f64, aspect: f64) -> Self {
        Self {
            position: Point3::new(70.0, 50.0, 100.0),
            target: Point3::origin(),
            fov,
            aspect,
            near: 0.1,
            far: 10_000.0,
        }
    }

    pub fn distance(&self) -> f64 {
        (self.position - self.target).norm()
    }

    pub fn view_matrix(&self) -> Matrix4<f64> {
        Matrix4::look_at_rh(&self.position, &self.target, &Vector3::y())
    }

    pub fn projection_matrix(&self) -> Matrix4<f64> {
        Matrix4::new_perspective(self.aspect, self.fov.to_radians(), self.near, self.far)
    }

    /// Project a world point to viewport pixels (origin top-left).
    ///
    /// Returns `None` for points behind the camera.
    pub fn project(&self, point: &Point3<f64>, viewport: &Viewport) -> Option<Point2<f64>> {
        let clip = self.projection_matrix() * self.view_matrix() * point.to_homogeneous();
        if clip.w <= 0.0 {
            return None;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        Some(Point2::new(
            (ndc_x + 1.0) * 0.5 * viewport.width as f64,
            (1.0 - ndc_y) * 0.5 * viewport.height as f64,
        ))
    }
}

/// Orbit controls around a target point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitControls {
    pub target: Point3<f64>,
    /// Cleared while a gizmo drag is in progress
    pub enabled: bool,
    pub auto_rotate: bool,
    /// Radians per second
    pub auto_rotate_speed: f64,
}

impl OrbitControls {
    pub fn new(auto_rotate_speed: f64) -> Self {
        Self {
            target: Point3::origin(),
            enabled: true,
            auto_rotate: false,
            auto_rotate_speed,
        }
    }

    /// Orbit the camera about the vertical axis through the target
    pub fn update(&self, camera: &mut Camera, dt: f64) {
        if !self.enabled || !self.auto_rotate || dt <= 0.0 {
            return;
        }
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), self.auto_rotate_speed * dt);
        let offset = camera.position - self.target;
        camera.position = self.target + rotation * offset;
        camera.target = self.target;
    }
}

/// Result of a framing pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Framing {
    pub center: Point3<f64>,
    pub distance: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CameraFramer {
    config: CameraConfig,
}

impl CameraFramer {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    /// Position the camera so `bounds` fills `1 / fill_ratio` of the view.
    ///
    /// `origin` is used as the center when the box is empty. In a portrait
    /// viewport the horizontal field of view is the limiting one.
    pub fn fit(
        &self,
        bounds: &BoundingBox,
        origin: Point3<f64>,
        fill_ratio: f64,
        camera: &mut Camera,
        orbit: &mut OrbitControls,
    ) -> Framing {
        let (center, max_dim) = if bounds.is_empty() {
            (origin, 1.0)
        } else {
            let extent = bounds.max_extent();
            let max_dim = if extent > DEGENERATE_EXTENT { extent } else { 1.0 };
            (bounds.center(), max_dim)
        };

        let tan_half_fov = (camera.fov.to_radians() / 2.0).tan() * camera.aspect.min(1.0);
        let distance = (max_dim / (2.0 * tan_half_fov) * fill_ratio).max(self.config.min_distance);

        let [ox, oy, oz] = self.config.offset;
        camera.position = center + Vector3::new(ox, oy, oz) * distance;
        camera.target = center;
        camera.near = distance / self.config.near_divisor;
        camera.far = distance * self.config.far_multiplier;
        orbit.target = center;

        debug!(distance, max_dim, "framed camera");
        Framing { center, distance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube_bounds(half: f64) -> BoundingBox {
        BoundingBox::new(Point3::new(-half, -half, -half), Point3::new(half, half, half))
    }

    #[test]
    fn test_fit_distance() {
        let mut camera = Camera::new(45.0, 16.0 / 9.0);
        let mut orbit = OrbitControls::new(0.5);
        let framing = CameraFramer::default().fit(
            &cube_bounds(10.0),
            Point3::origin(),
            1.6,
            &mut camera,
            &mut orbit,
        );

        let expected = 20.0 / (2.0 * (22.5f64).to_radians().tan()) * 1.6;
        assert_relative_eq!(framing.distance, expected, epsilon = 1e-9);
        assert_relative_eq!(camera.position.x, 0.7 * expected, epsilon = 1e-9);
        assert_relative_eq!(camera.position.y, 0.5 * expected, epsilon = 1e-9);
        assert_relative_eq!(camera.position.z, expected, epsilon = 1e-9);
        assert_relative_eq!(camera.near, expected / 100.0, epsilon = 1e-9);
        assert_relative_eq!(camera.far, expected * 100.0, epsilon = 1e-6);
        assert_eq!(orbit.target, Point3::origin());
    }

    #[test]
    fn test_empty_bounds_use_origin() {
        let mut camera = Camera::new(45.0, 1.0);
        let mut orbit = OrbitControls::new(0.5);
        let origin = Point3::new(1.0, 2.0, 3.0);
        let framing = CameraFramer::default().fit(
            &BoundingBox::empty(),
            origin,
            1.6,
            &mut camera,
            &mut orbit,
        );
        assert_eq!(framing.center, origin);
        assert!(framing.distance.is_finite() && framing.distance > 0.0);
    }

    #[test]
    fn test_degenerate_box_falls_back() {
        let point = Point3::new(5.0, 5.0, 5.0);
        let mut camera = Camera::new(45.0, 1.0);
        let mut orbit = OrbitControls::new(0.5);
        let framing = CameraFramer::default().fit(
            &BoundingBox::new(point, point),
            Point3::origin(),
            1.0,
            &mut camera,
            &mut orbit,
        );
        assert_relative_eq!(framing.distance, 1.0 / (2.0 * (22.5f64).to_radians().tan()), epsilon = 1e-9);
        assert_eq!(framing.center, point);
    }

    #[test]
    fn test_target_projects_to_center() {
        let viewport = Viewport::new(800, 600);
        let mut camera = Camera::new(45.0, viewport.aspect());
        let mut orbit = OrbitControls::new(0.5);
        let bounds = BoundingBox::new(Point3::new(2.0, 0.0, 2.0), Point3::new(6.0, 4.0, 6.0));
        CameraFramer::default().fit(&bounds, Point3::origin(), 1.6, &mut camera, &mut orbit);

        let screen = camera.project(&bounds.center(), &viewport).unwrap();
        assert_relative_eq!(screen.x, 400.0, epsilon = 1e-6);
        assert_relative_eq!(screen.y, 300.0, epsilon = 1e-6);
    }

    #[test]
    fn test_auto_rotate_keeps_distance() {
        let mut camera = Camera::new(45.0, 1.0);
        let mut orbit = OrbitControls::new(0.5);
        let before = camera.distance();
        let start = camera.position;

        orbit.update(&mut camera, 1.0);
        assert_eq!(camera.position, start);

        orbit.auto_rotate = true;
        orbit.update(&mut camera, 1.0);
        assert_ne!(camera.position, start);
        assert_relative_eq!(camera.distance(), before, epsilon = 1e-9);
        assert_relative_eq!(camera.position.y, start.y, epsilon = 1e-9);

        orbit.enabled = false;
        let frozen = camera.position;
        orbit.update(&mut camera, 1.0);
        assert_eq!(camera.position, frozen);
    }
}
