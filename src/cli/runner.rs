// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Headless pipeline runs for the CLI

use crate::config::ViewerConfig;
use crate::io::{self, Format};
use crate::orientation::SupportScore;
use crate::viewer::Viewer;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};

/// Outcome of running a file through ingestion, orientation, placement and framing
#[derive(Debug, Clone, Serialize)]
pub struct OrientReport {
    pub file: String,
    pub format: Format,
    pub vertices: usize,
    pub triangles: usize,
    pub rotation: String,
    pub rotation_degrees: [f64; 3],
    pub score: Option<SupportScore>,
    pub position: [f64; 3],
    pub bounds_min: [f64; 3],
    pub bounds_max: [f64; 3],
    pub camera_position: [f64; 3],
    pub camera_target: [f64; 3],
    pub camera_distance: f64,
    #[serde(skip)]
    pub duration: Duration,
}

/// Raw parse statistics, before any placement
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub file: String,
    pub format: Format,
    pub composite: bool,
    pub vertices: usize,
    pub triangles: usize,
    pub bounds_min: [f64; 3],
    pub bounds_max: [f64; 3],
    pub size: [f64; 3],
}

/// Runs files through a fresh viewer each time
pub struct Runner {
    config: ViewerConfig,
}

impl Runner {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }

    pub fn orient(&self, path: &Path) -> Result<OrientReport> {
        let (name, format, bytes) = read_model(path)?;
        let start = Instant::now();

        let asset = io::load_asset(&name, &bytes)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        let (vertices, triangles) = (asset.vertex_count(), asset.triangle_count());

        let mut viewer = Viewer::new(self.config.clone()).context("Invalid viewer configuration")?;
        let (root, choice) = viewer
            .load_asset(asset)
            .with_context(|| format!("Failed to place {}", path.display()))?;

        let position = viewer.node(root)?.transform.position;
        let bounds = viewer.world_bounds(root)?;
        let camera = viewer.camera();

        Ok(OrientReport {
            file: path.display().to_string(),
            format,
            vertices,
            triangles,
            rotation: choice.rotation.to_string(),
            rotation_degrees: choice.rotation.degrees(),
            score: choice.score,
            position: position.into(),
            bounds_min: bounds.min.coords.into(),
            bounds_max: bounds.max.coords.into(),
            camera_position: camera.position.coords.into(),
            camera_target: camera.target.coords.into(),
            camera_distance: camera.distance(),
            duration: start.elapsed(),
        })
    }

    pub fn inspect(&self, path: &Path) -> Result<InspectReport> {
        let (name, format, bytes) = read_model(path)?;
        let asset = io::load_asset(&name, &bytes)
            .with_context(|| format!("Failed to load {}", path.display()))?;

        let composite = asset.is_composite();
        let (vertices, triangles) = (asset.vertex_count(), asset.triangle_count());
        let bounds = asset.into_mesh()?.bounding_box();

        Ok(InspectReport {
            file: path.display().to_string(),
            format,
            composite,
            vertices,
            triangles,
            bounds_min: bounds.min.coords.into(),
            bounds_max: bounds.max.coords.into(),
            size: bounds.size().into(),
        })
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

fn read_model(path: &Path) -> Result<(String, Format, Vec<u8>)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file path: {}", path.display()))?;
    let format = Format::from_name(&name)?;
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok((name, format, bytes))
}
