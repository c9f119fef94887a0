// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Background, lighting and the ground reference

use crate::config::SceneConfig;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    /// Direction the light travels, normalized
    pub direction: Vector3<f64>,
}

/// Infinite tiled floor drawn at `y = 0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ground {
    pub visible: bool,
    pub tile_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub background: [f32; 3],
    pub ambient: AmbientLight,
    pub key_light: DirectionalLight,
    pub ground: Ground,
}

impl Environment {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            background: config.background,
            ambient: AmbientLight {
                color: [1.0, 1.0, 1.0],
                intensity: 0.6,
            },
            key_light: DirectionalLight {
                color: [1.0, 1.0, 1.0],
                intensity: 0.9,
                direction: Vector3::new(-0.5, -1.0, -0.75).normalize(),
            },
            ground: Ground {
                visible: true,
                tile_size: config.ground_tile_size,
            },
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(&SceneConfig::default())
    }
}
