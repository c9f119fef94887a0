// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation, bounds and transforms

mod bbox;
mod mesh;
mod primitives;
mod transform;

pub use bbox::BoundingBox;
pub use mesh::{Mesh, Triangle};
pub use primitives::Primitive;
pub use transform::Transform;
