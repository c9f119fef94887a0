// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Automatic resting-orientation search
//!
//! A finite set of axis-aligned candidate rotations is scored by how much of
//! the model touches the floor. The rotation with the strictly largest support
//! score wins; ties go to the candidate listed first, so an already
//! well-seated model keeps its authored orientation.

use crate::config::OrientationConfig;
use crate::error::Result;
use crate::geometry::{Mesh, Transform};
use crate::scene::{NodeId, Scene};
use nalgebra::{Matrix4, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::fmt;
use tracing::debug;

/// Rotation as quarter turns about X and Z, applied in XYZ Euler order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateRotation {
    pub x_quarters: i8,
    pub z_quarters: i8,
}

impl CandidateRotation {
    pub const IDENTITY: Self = Self::new(0, 0);

    pub const fn new(x_quarters: i8, z_quarters: i8) -> Self {
        Self {
            x_quarters,
            z_quarters,
        }
    }

    /// Euler angles in radians
    pub fn euler(&self) -> Vector3<f64> {
        Vector3::new(
            self.x_quarters as f64 * FRAC_PI_2,
            0.0,
            self.z_quarters as f64 * FRAC_PI_2,
        )
    }

    pub fn degrees(&self) -> [f64; 3] {
        [self.x_quarters as f64 * 90.0, 0.0, self.z_quarters as f64 * 90.0]
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl fmt::Display for CandidateRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identity() {
            return f.write_str("identity");
        }
        let mut parts = Vec::new();
        if self.x_quarters != 0 {
            parts.push(format!("X{:+}", self.x_quarters as i32 * 90));
        }
        if self.z_quarters != 0 {
            parts.push(format!("Z{:+}", self.z_quarters as i32 * 90));
        }
        f.write_str(&parts.join(" "))
    }
}

/// Candidate table in tie-break order
pub const CANDIDATE_ROTATIONS: [CandidateRotation; 11] = [
    CandidateRotation::new(0, 0),
    CandidateRotation::new(1, 0),
    CandidateRotation::new(-1, 0),
    CandidateRotation::new(2, 0),
    CandidateRotation::new(0, 1),
    CandidateRotation::new(0, -1),
    CandidateRotation::new(0, 2),
    CandidateRotation::new(1, 1),
    CandidateRotation::new(1, -1),
    CandidateRotation::new(-1, 1),
    CandidateRotation::new(-1, -1),
];

/// Floor contact measure for one pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportScore {
    /// Area of the X/Z rectangle spanned by the contact vertices
    pub area: f64,
    /// Number of vertices within tolerance of the lowest point
    pub count: usize,
    pub score: f64,
}

/// Outcome of a search, with the winning score for reporting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationChoice {
    pub rotation: CandidateRotation,
    pub score: Option<SupportScore>,
}

impl OrientationChoice {
    fn identity() -> Self {
        Self {
            rotation: CandidateRotation::IDENTITY,
            score: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrientationSolver {
    config: OrientationConfig,
}

impl OrientationSolver {
    pub fn new(config: OrientationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OrientationConfig {
        &self.config
    }

    /// Score one candidate pose.
    ///
    /// `parts` are meshes with their matrices into the posed node's local
    /// space; `base` is the node's current transform (only its rotation is
    /// replaced) and `parent_world` the world matrix of its parent. Returns
    /// `None` when there are no vertices.
    pub fn score(
        &self,
        parts: &[(Matrix4<f64>, &Mesh)],
        base: &Transform,
        parent_world: &Matrix4<f64>,
        candidate: CandidateRotation,
    ) -> Option<SupportScore> {
        let node_world = parent_world * base.with_rotation(candidate.euler()).matrix();
        let world: Vec<Matrix4<f64>> = parts.iter().map(|(m, _)| node_world * m).collect();

        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for ((_, mesh), matrix) in parts.iter().zip(&world) {
            for position in mesh.positions() {
                let y = matrix.transform_point(position).y;
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
        if !min_y.is_finite() {
            return None;
        }

        let tolerance = self
            .config
            .abs_tolerance
            .max((max_y - min_y) * self.config.height_ratio);
        let threshold = min_y + tolerance;

        let mut count = 0usize;
        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_z, mut max_z) = (f64::INFINITY, f64::NEG_INFINITY);
        for ((_, mesh), matrix) in parts.iter().zip(&world) {
            for position in mesh.positions() {
                let p = matrix.transform_point(position);
                if p.y <= threshold {
                    count += 1;
                    min_x = min_x.min(p.x);
                    max_x = max_x.max(p.x);
                    min_z = min_z.min(p.z);
                    max_z = max_z.max(p.z);
                }
            }
        }

        // The lowest vertex is always in the contact set, so count >= 1
        let area = (max_x - min_x) * (max_z - min_z);
        Some(SupportScore {
            area,
            count,
            score: area * self.config.area_weight + count as f64,
        })
    }

    /// Scores for every candidate, in table order
    pub fn score_candidates(
        &self,
        parts: &[(Matrix4<f64>, &Mesh)],
        base: &Transform,
        parent_world: &Matrix4<f64>,
    ) -> Vec<Option<SupportScore>> {
        if self.config.parallel {
            CANDIDATE_ROTATIONS
                .par_iter()
                .map(|&candidate| self.score(parts, base, parent_world, candidate))
                .collect()
        } else {
            CANDIDATE_ROTATIONS
                .iter()
                .map(|&candidate| self.score(parts, base, parent_world, candidate))
                .collect()
        }
    }

    /// Pick the winning candidate without touching any scene
    pub fn choose_for_parts(
        &self,
        parts: &[(Matrix4<f64>, &Mesh)],
        base: &Transform,
        parent_world: &Matrix4<f64>,
    ) -> OrientationChoice {
        let scores = self.score_candidates(parts, base, parent_world);

        let mut best = OrientationChoice::identity();
        for (candidate, score) in CANDIDATE_ROTATIONS.iter().zip(scores) {
            let Some(score) = score else {
                continue;
            };
            let better = match best.score {
                Some(current) => score.score > current.score,
                None => true,
            };
            if better {
                best = OrientationChoice {
                    rotation: *candidate,
                    score: Some(score),
                };
            }
        }
        best
    }

    /// Choose the resting orientation of `node` and apply it
    pub fn choose_orientation(&self, scene: &mut Scene, node: NodeId) -> Result<OrientationChoice> {
        let choice = {
            let base = scene.node(node)?.transform;
            let parent_world = scene.parent_world_matrix(node)?;
            let parts = scene.parts(node)?;
            self.choose_for_parts(&parts, &base, &parent_world)
        };

        debug!(
            node = %node,
            rotation = %choice.rotation,
            score = choice.score.map(|s| s.score),
            "chose orientation"
        );
        apply_rotation(scene, node, choice.rotation)?;
        Ok(choice)
    }
}

/// Replace the node's rotation with `rotation`, keeping position and scale
pub fn apply_rotation(scene: &mut Scene, node: NodeId, rotation: CandidateRotation) -> Result<()> {
    scene.node_mut(node)?.transform.rotation = rotation.euler();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    fn solve(mesh: &Mesh) -> OrientationChoice {
        let solver = OrientationSolver::default();
        let parts = [(Matrix4::identity(), mesh)];
        solver.choose_for_parts(&parts, &Transform::identity(), &Matrix4::identity())
    }

    #[test]
    fn test_candidate_table_order() {
        assert!(CANDIDATE_ROTATIONS[0].is_identity());
        assert_eq!(CANDIDATE_ROTATIONS[3].degrees(), [180.0, 0.0, 0.0]);
        assert_eq!(CANDIDATE_ROTATIONS[4].to_string(), "Z+90");
        assert_eq!(CANDIDATE_ROTATIONS[8].to_string(), "X+90 Z-90");
    }

    #[test]
    fn test_cube_keeps_identity() {
        let mesh = Primitive::cube(20.0).to_mesh();
        let choice = solve(&mesh);
        assert!(choice.rotation.is_identity());

        let score = choice.score.unwrap();
        assert_eq!(score.count, 4);
        assert_eq!(score.area, 400.0);
    }

    #[test]
    fn test_all_cube_faces_tie() {
        let mesh = Primitive::cube(20.0).to_mesh();
        let solver = OrientationSolver::default();
        let scores = solver.score_candidates(
            &[(Matrix4::identity(), &mesh)],
            &Transform::identity(),
            &Matrix4::identity(),
        );
        let first = scores[0].unwrap().score;
        assert!(scores.iter().all(|s| s.unwrap().score == first));
    }

    #[test]
    fn test_slab_lies_on_widest_face() {
        let mesh = Primitive::cuboid(Vector3::new(2.0, 20.0, 10.0)).to_mesh();
        let choice = solve(&mesh);
        assert_eq!(choice.rotation, CandidateRotation::new(0, 1));
        assert_eq!(choice.score.unwrap().area, 200.0);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let mesh = Primitive::cylinder(4.0, 10.0, 24).to_mesh();
        let parts = [(Matrix4::identity(), &mesh)];
        let parallel = OrientationSolver::default();
        let sequential = OrientationSolver::new(OrientationConfig {
            parallel: false,
            ..Default::default()
        });
        let base = Transform::identity();
        assert_eq!(
            parallel.choose_for_parts(&parts, &base, &Matrix4::identity()),
            sequential.choose_for_parts(&parts, &base, &Matrix4::identity())
        );
    }

    #[test]
    fn test_empty_parts_yield_identity() {
        let choice = OrientationSolver::default().choose_for_parts(
            &[],
            &Transform::identity(),
            &Matrix4::identity(),
        );
        assert!(choice.rotation.is_identity());
        assert!(choice.score.is_none());
    }

    #[test]
    fn test_choose_orientation_applies_winner() {
        let mut scene = Scene::default();
        let root = scene.model_root();
        scene
            .attach_mesh(root, Primitive::cuboid(Vector3::new(2.0, 20.0, 10.0)).to_mesh())
            .unwrap();
        scene.node_mut(root).unwrap().transform.position = Vector3::new(1.0, 2.0, 3.0);

        let choice = OrientationSolver::default()
            .choose_orientation(&mut scene, root)
            .unwrap();
        let transform = scene.node(root).unwrap().transform;
        assert_eq!(transform.rotation, choice.rotation.euler());
        assert_eq!(transform.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(scene.world_bounds(root).unwrap().size().y, 2.0);
    }
}
