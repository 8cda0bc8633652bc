// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Opening-Lite Geometry Kernel
//!
//! Closed triangle solids with exact mass properties, csgrs-backed boolean
//! intersection/union, a boolean-free overlap test, and nalgebra placements
//! for resolving the direction a building-service run points.

pub mod bbox;
pub mod contact;
pub mod csg;
pub mod error;
pub mod mesh;
pub mod primitives;
pub mod solid;
pub mod transform;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Unit, Vector2, Vector3};

pub use bbox::Aabb;
pub use contact::{point_in_solid, solids_intersect};
pub use csg::{CsgKernel, GeometryKernel};
pub use error::{Error, Result};
pub use mesh::Mesh;
pub use primitives::{box_solid, cylinder_along, prism_along};
pub use solid::Solid;
pub use transform::{rotation_about_axis, Placement};
pub use triangulation::{triangulate_oriented, triangulate_polygon};
