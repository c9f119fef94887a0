// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Viewer configuration system
//!
//! The orientation and placement tolerances are empirically chosen values,
//! so they live here rather than as constants in the algorithms.

use crate::error::{Result, ViewerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up by [`ViewerConfig::load`]
pub const DEFAULT_CONFIG_FILE: &str = "viewer.toml";

/// Top-level viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub orientation: OrientationConfig,
    pub placement: PlacementConfig,
    pub camera: CameraConfig,
    pub view_mode: ViewModeConfig,
    pub scene: SceneConfig,
}

/// Support-score parameters for the orientation search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Minimum contact tolerance in world units
    pub abs_tolerance: f64,
    /// Contact tolerance as a fraction of the model height
    pub height_ratio: f64,
    /// Weight of the contact footprint area relative to the vertex count
    pub area_weight: f64,
    /// Score candidates on the rayon pool
    pub parallel: bool,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            abs_tolerance: 0.0005,
            height_ratio: 0.01,
            area_weight: 100.0,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Distance from the floor below which no vertical shift is applied
    pub floor_epsilon: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            floor_epsilon: 0.0005,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f64,
    /// Fill ratio used by the load pipeline
    pub fill_ratio: f64,
    /// Lower bound for the framing distance
    pub min_distance: f64,
    /// Camera offset from the framed center, in multiples of the distance
    pub offset: [f64; 3],
    pub near_divisor: f64,
    pub far_multiplier: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            fill_ratio: 1.6,
            min_distance: 0.001,
            offset: [0.7, 0.5, 1.0],
            near_divisor: 100.0,
            far_multiplier: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewModeConfig {
    /// Camera auto-rotation rate in spin mode (radians per second)
    pub auto_rotate_speed: f64,
    /// Decoration spin rate in spin mode (radians per second)
    pub decoration_spin_speed: f64,
    /// Fill ratio used when framing the decoration on spin entry
    pub spin_fill_ratio: f64,
}

impl Default for ViewModeConfig {
    fn default() -> Self {
        Self {
            auto_rotate_speed: 0.5,
            decoration_spin_speed: 0.8,
            spin_fill_ratio: 1.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Linear RGB clear color
    pub background: [f32; 3],
    /// Edge length of one ground tile
    pub ground_tile_size: f64,
    /// Initial viewport size in pixels
    pub viewport: [u32; 2],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: [0.96, 0.96, 0.97],
            ground_tile_size: 10.0,
            viewport: [1280, 720],
        }
    }
}

impl ViewerConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: ViewerConfig = toml::from_str(&content).map_err(|e| {
            ViewerError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `viewer.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `POLYFRAME_VIEWER_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Some(fov) = env_f64("POLYFRAME_VIEWER_FOV") {
            self.camera.fov_degrees = fov;
        }

        if let Some(ratio) = env_f64("POLYFRAME_VIEWER_FILL_RATIO") {
            self.camera.fill_ratio = ratio;
        }

        if let Some(weight) = env_f64("POLYFRAME_VIEWER_AREA_WEIGHT") {
            self.orientation.area_weight = weight;
        }

        if let Ok(parallel) = std::env::var("POLYFRAME_VIEWER_PARALLEL") {
            self.orientation.parallel = parallel.parse().unwrap_or(self.orientation.parallel);
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ViewerError::InvalidConfig(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Reject values the algorithms cannot work with
    pub fn validate(&self) -> Result<()> {
        let fov = self.camera.fov_degrees;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(ViewerError::InvalidConfig(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                fov
            )));
        }

        let positive = [
            ("camera.fill_ratio", self.camera.fill_ratio),
            ("camera.min_distance", self.camera.min_distance),
            ("camera.near_divisor", self.camera.near_divisor),
            ("camera.far_multiplier", self.camera.far_multiplier),
            ("view_mode.spin_fill_ratio", self.view_mode.spin_fill_ratio),
            ("scene.ground_tile_size", self.scene.ground_tile_size),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ViewerError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("orientation.abs_tolerance", self.orientation.abs_tolerance),
            ("orientation.height_ratio", self.orientation.height_ratio),
            ("orientation.area_weight", self.orientation.area_weight),
            ("placement.floor_epsilon", self.placement.floor_epsilon),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ViewerError::InvalidConfig(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

fn env_f64(name: &str) -> Option<f64> {
    std::env::var(name).ok().and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.orientation.abs_tolerance, 0.0005);
        assert_eq!(config.orientation.height_ratio, 0.01);
        assert_eq!(config.camera.offset, [0.7, 0.5, 1.0]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ViewerConfig = toml::from_str(
            r#"
            [camera]
            fov_degrees = 60.0

            [orientation]
            area_weight = 50.0
            "#,
        )
        .unwrap();

        assert_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.camera.fill_ratio, 1.6);
        assert_eq!(config.orientation.area_weight, 50.0);
        assert_eq!(config.placement.floor_epsilon, 0.0005);
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        let mut config = ViewerConfig::default();
        config.view_mode.auto_rotate_speed = 1.25;

        config.save(file.path())?;
        let reloaded = ViewerConfig::from_file(file.path())?;
        assert_eq!(reloaded, config);
        Ok(())
    }

    #[test]
    fn test_invalid_fov_rejected() {
        let mut config = ViewerConfig::default();
        config.camera.fov_degrees = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ViewerError::InvalidConfig(_))
        ));
    }
}
