// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CSG (Constructive Solid Geometry) Operations
//!
//! Boolean intersection and union of closed solids on top of csgrs BSP
//! trees. Kernel failures (non-finite output, panics inside the BSP code)
//! surface as [`Error::BooleanFailed`] and never unwind into the caller.

use crate::contact::solids_intersect;
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::solid::Solid;
use crate::triangulation::{calculate_polygon_normal, triangulate_oriented};
use nalgebra::Point3;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Boolean geometry services consumed by the collision pipeline
///
/// Implementations may return an empty solid for "no overlap" and an error
/// for kernel failures; callers treat both as "no penetration".
pub trait GeometryKernel {
    /// Region common to both solids
    fn intersect(&self, a: &Solid, b: &Solid) -> Result<Solid>;

    /// Region covered by either solid
    fn union(&self, a: &Solid, b: &Solid) -> Result<Solid>;

    /// Cheap yes/no overlap test, no boolean evaluation
    fn intersects(&self, a: &Solid, b: &Solid) -> bool;
}

/// csgrs-backed kernel
#[derive(Debug, Clone, Copy, Default)]
pub struct CsgKernel;

impl CsgKernel {
    pub fn new() -> Self {
        Self
    }

    /// Convert a solid to csgrs polygons
    fn solid_to_csgrs(solid: &Solid) -> csgrs::mesh::Mesh<()> {
        use csgrs::mesh::{polygon::Polygon, vertex::Vertex, Mesh as CSGMesh};

        let mut polygons = Vec::with_capacity(solid.face_count());
        for [v0, v1, v2] in solid.triangles() {
            // Degenerate triangles would feed NaN planes into the BSP
            let face_normal = match (v1 - v0).cross(&(v2 - v0)).try_normalize(1e-12) {
                Some(n) => n,
                None => continue,
            };

            let vertices = vec![
                Vertex::new(v0, face_normal),
                Vertex::new(v1, face_normal),
                Vertex::new(v2, face_normal),
            ];
            polygons.push(Polygon::new(vertices, None));
        }

        CSGMesh::from_polygons(&polygons, None)
    }

    /// Convert csgrs polygons back into a triangulated solid
    fn csgrs_to_solid(csg_mesh: &csgrs::mesh::Mesh<()>) -> Result<Solid> {
        let mut mesh = Mesh::new();

        for polygon in &csg_mesh.polygons {
            let vertices = &polygon.vertices;
            if vertices.len() < 3 {
                continue;
            }

            let points: Vec<Point3<f64>> = vertices
                .iter()
                .map(|v| Point3::new(v.pos[0], v.pos[1], v.pos[2]))
                .collect();

            if points
                .iter()
                .any(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
            {
                return Err(Error::boolean("non-finite vertex in boolean result"));
            }

            let normal = match vertices[0].normal.try_normalize(1e-10) {
                Some(n) if n.iter().all(|c| c.is_finite()) => n,
                _ => match calculate_polygon_normal(&points).try_normalize(1e-10) {
                    Some(n) => n,
                    None => continue,
                },
            };

            let triangles = match triangulate_oriented(&points, &normal) {
                Ok(t) => t,
                Err(_) => continue,
            };

            let base = mesh.vertex_count() as u32;
            for p in &points {
                mesh.add_vertex(*p);
            }
            for [a, b, c] in triangles {
                mesh.add_triangle(base + a as u32, base + b as u32, base + c as u32);
            }
        }

        Ok(Solid::from_mesh(mesh))
    }

    /// Run a csgrs boolean, turning panics into errors
    fn run_boolean<F>(a: &Solid, b: &Solid, op_name: &str, op: F) -> Result<Solid>
    where
        F: Fn(&csgrs::mesh::Mesh<()>, &csgrs::mesh::Mesh<()>) -> csgrs::mesh::Mesh<()>,
    {
        let csg_a = Self::solid_to_csgrs(a);
        let csg_b = Self::solid_to_csgrs(b);

        let result = catch_unwind(AssertUnwindSafe(|| op(&csg_a, &csg_b)))
            .map_err(|_| Error::boolean(format!("{} panicked inside csgrs", op_name)))?;

        Self::csgrs_to_solid(&result)
    }
}

impl GeometryKernel for CsgKernel {
    fn intersect(&self, a: &Solid, b: &Solid) -> Result<Solid> {
        use csgrs::traits::CSG;

        if a.is_empty() || b.is_empty() {
            return Ok(Solid::empty());
        }
        match (a.bounds(), b.bounds()) {
            (Some(box_a), Some(box_b)) if box_a.intersects(&box_b) => {}
            _ => return Ok(Solid::empty()),
        }

        Self::run_boolean(a, b, "intersection", |x, y| x.intersection(y))
    }

    fn union(&self, a: &Solid, b: &Solid) -> Result<Solid> {
        use csgrs::traits::CSG;

        if a.is_empty() {
            return Ok(b.clone());
        }
        if b.is_empty() {
            return Ok(a.clone());
        }

        Self::run_boolean(a, b, "union", |x, y| x.union(y))
    }

    fn intersects(&self, a: &Solid, b: &Solid) -> bool {
        solids_intersect(a, b)
    }
}
