// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Table / spin presentation modes

use crate::camera::OrbitControls;
use crate::config::ViewModeConfig;
use crate::scene::Ground;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Model resting on the visible ground
    #[default]
    Table,
    /// Ground hidden, camera orbiting and the decoration turning
    Spin,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Table => f.write_str("table"),
            ViewMode::Spin => f.write_str("spin"),
        }
    }
}

/// What the caller still has to do after a mode switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    Unchanged,
    EnteredTable,
    /// Spin was entered (or re-entered): the decoration must be re-centered
    /// and the camera re-framed on it
    EnteredSpin,
}

#[derive(Debug, Clone)]
pub struct ViewModeController {
    config: ViewModeConfig,
    mode: ViewMode,
}

impl ViewModeController {
    pub fn new(config: ViewModeConfig) -> Self {
        Self {
            config,
            mode: ViewMode::Table,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn spin_fill_ratio(&self) -> f64 {
        self.config.spin_fill_ratio
    }

    pub fn set_mode(
        &mut self,
        mode: ViewMode,
        ground: &mut Ground,
        orbit: &mut OrbitControls,
    ) -> ModeChange {
        if mode == ViewMode::Table && self.mode == ViewMode::Table {
            return ModeChange::Unchanged;
        }

        if mode != self.mode {
            info!(from = %self.mode, to = %mode, "view mode changed");
        }
        self.mode = mode;

        match mode {
            ViewMode::Table => {
                ground.visible = true;
                orbit.auto_rotate = false;
                ModeChange::EnteredTable
            }
            ViewMode::Spin => {
                ground.visible = false;
                orbit.auto_rotate = true;
                orbit.auto_rotate_speed = self.config.auto_rotate_speed;
                ModeChange::EnteredSpin
            }
        }
    }

    /// Decoration Y rotation to add for a frame of `dt` seconds
    pub fn decoration_spin(&self, dt: f64) -> Option<f64> {
        match self.mode {
            ViewMode::Spin if dt > 0.0 => Some(self.config.decoration_spin_speed * dt),
            _ => None,
        }
    }
}

impl Default for ViewModeController {
    fn default() -> Self {
        Self::new(ViewModeConfig::default())
    }
}
