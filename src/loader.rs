// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Background model loading
//!
//! Parsing and the orientation search run on the rayon pool; only the
//! thread that owns the viewer applies results. Every request bumps a
//! generation counter and a finished load is applied only if it still
//! carries the latest generation, so a slow early load can never replace a
//! newer one.

use crate::error::{Result, ViewerError};
use crate::geometry::Transform;
use crate::io::{self, Asset};
use crate::orientation::{OrientationChoice, OrientationSolver};
use crate::scene::NodeId;
use nalgebra::Matrix4;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, warn};

/// Handle returned by a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub generation: u64,
}

/// A parsed asset with its orientation already solved
#[derive(Debug)]
pub struct PreparedLoad {
    pub name: String,
    pub asset: Asset,
    pub orientation: OrientationChoice,
}

/// Outcome of a background load, reported by `Viewer::poll_loads`
#[derive(Debug)]
pub enum LoadEvent {
    Applied {
        generation: u64,
        root: NodeId,
        orientation: OrientationChoice,
    },
    /// The displayed model was left untouched
    Failed { generation: u64, error: ViewerError },
    /// Superseded by a newer request before it finished
    Discarded { generation: u64 },
}

impl LoadEvent {
    pub fn generation(&self) -> u64 {
        match self {
            LoadEvent::Applied { generation, .. }
            | LoadEvent::Failed { generation, .. }
            | LoadEvent::Discarded { generation } => *generation,
        }
    }
}

enum Source {
    Bytes { name: String, bytes: Vec<u8> },
    File(PathBuf),
}

struct Finished {
    generation: u64,
    result: Result<PreparedLoad>,
}

pub(crate) struct LoadQueue {
    solver: OrientationSolver,
    generation: u64,
    in_flight: usize,
    sender: Sender<Finished>,
    receiver: Receiver<Finished>,
}

impl LoadQueue {
    pub fn new(solver: OrientationSolver) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            solver,
            generation: 0,
            in_flight: 0,
            sender,
            receiver,
        }
    }

    pub fn latest_generation(&self) -> u64 {
        self.generation
    }

    /// Requests that have not reported back yet, stale ones included
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    pub fn request(&mut self, name: String, bytes: Vec<u8>) -> LoadTicket {
        self.spawn(Source::Bytes { name, bytes })
    }

    pub fn request_file(&mut self, path: PathBuf) -> LoadTicket {
        self.spawn(Source::File(path))
    }

    /// A synchronous load started; every pending request is now stale
    pub fn supersede(&mut self) {
        self.generation += 1;
        debug!(generation = self.generation, "pending loads superseded");
    }

    fn spawn(&mut self, source: Source) -> LoadTicket {
        self.generation += 1;
        self.in_flight += 1;
        let generation = self.generation;
        let solver = self.solver.clone();
        let sender = self.sender.clone();

        debug!(generation, "load requested");
        rayon::spawn(move || {
            let result = prepare(&solver, source);
            // The receiver only disappears with the viewer
            let _ = sender.send(Finished { generation, result });
        });

        LoadTicket { generation }
    }

    /// Collect finished loads in arrival order, stale ones included
    pub fn drain(&mut self) -> Vec<(u64, Result<PreparedLoad>)> {
        let mut current = Vec::new();
        while let Ok(finished) = self.receiver.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            current.push((finished.generation, finished.result));
        }
        current
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}

fn prepare(solver: &OrientationSolver, source: Source) -> Result<PreparedLoad> {
    let (name, asset) = match source {
        Source::Bytes { name, bytes } => {
            let asset = io::load_asset(&name, &bytes)?;
            (name, asset)
        }
        Source::File(path) => {
            let asset = io::load_file(&path).inspect_err(|e| {
                warn!(path = %path.display(), error = %e, "background file load failed");
            })?;
            (path.display().to_string(), asset)
        }
    };

    // A cleared model root has an identity transform and no parent
    let orientation = match &asset {
        Asset::Mesh(mesh) => solver.choose_for_parts(
            &[(Matrix4::identity(), mesh)],
            &Transform::identity(),
            &Matrix4::identity(),
        ),
        Asset::Composite(tree) => solver.choose_for_parts(
            &tree.parts(&Matrix4::identity()),
            &Transform::identity(),
            &Matrix4::identity(),
        ),
    };

    Ok(PreparedLoad {
        name,
        asset,
        orientation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    const TRIANGLE_OBJ: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    fn wait_for(queue: &mut LoadQueue, expected: usize) -> Vec<(u64, Result<PreparedLoad>)> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut results = Vec::new();
        while results.len() < expected && Instant::now() < deadline {
            results.extend(queue.drain());
            std::thread::sleep(Duration::from_millis(5));
        }
        results
    }

    #[test]
    fn test_generations_increase() {
        let mut queue = LoadQueue::new(OrientationSolver::default());
        let a = queue.request("a.obj".into(), TRIANGLE_OBJ.as_bytes().to_vec());
        let b = queue.request("b.obj".into(), TRIANGLE_OBJ.as_bytes().to_vec());
        assert!(b.generation > a.generation);
        assert!(queue.is_current(b.generation));
        assert!(!queue.is_current(a.generation));

        let results = wait_for(&mut queue, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_failure_is_reported() {
        let mut queue = LoadQueue::new(OrientationSolver::default());
        queue.request("broken.dxf".into(), Vec::new());
        let results = wait_for(&mut queue, 1);
        assert!(matches!(
            results[0].1,
            Err(ViewerError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_supersede_makes_pending_stale() {
        let mut queue = LoadQueue::new(OrientationSolver::default());
        let ticket = queue.request("a.obj".into(), TRIANGLE_OBJ.as_bytes().to_vec());
        queue.supersede();
        assert!(!queue.is_current(ticket.generation));
        assert_eq!(queue.pending(), 1);

        let results = wait_for(&mut queue, 1);
        assert_eq!(results.len(), 1);
        assert!(!queue.is_current(results[0].0));
    }
}
