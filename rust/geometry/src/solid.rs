// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Closed triangulated solids
//!
//! A [`Solid`] is a closed, outward-oriented triangle mesh. Mass properties
//! use the divergence theorem over signed tetrahedra against the origin, so
//! they are exact for any closed polyhedron regardless of convexity.

use crate::bbox::Aabb;
use crate::mesh::Mesh;
use nalgebra::{Matrix4, Point3, Vector3};
use rustc_hash::FxHashMap;

/// Normal quantisation step used when grouping coplanar triangles
const NORMAL_QUANTUM: f64 = 0.01;

/// Closed triangle solid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solid {
    mesh: Mesh,
}

impl Solid {
    /// Wrap a mesh that is expected to be closed and outward-oriented
    pub fn from_mesh(mesh: Mesh) -> Self {
        Self { mesh }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of triangular faces
    #[inline]
    pub fn face_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }

    /// A solid with no faces or with volume at or below `tolerance`
    pub fn is_degenerate(&self, tolerance: f64) -> bool {
        self.face_count() == 0 || self.volume() <= tolerance
    }

    /// Signed volume; negative when the winding points inward
    pub fn signed_volume(&self) -> f64 {
        self.mesh
            .triangles()
            .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)) / 6.0)
            .sum()
    }

    /// Enclosed volume
    #[inline]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Volume centroid
    ///
    /// Falls back to the vertex average for flat or empty input so callers
    /// always get a finite point.
    pub fn centroid(&self) -> Point3<f64> {
        let mut weighted = Vector3::zeros();
        let mut total = 0.0;
        for [a, b, c] in self.mesh.triangles() {
            let v = a.coords.dot(&b.coords.cross(&c.coords)) / 6.0;
            // Tetrahedron (origin, a, b, c) centroid
            weighted += (a.coords + b.coords + c.coords) * (v / 4.0);
            total += v;
        }

        if total.abs() > 1e-12 {
            return Point3::from(weighted / total);
        }
        self.vertex_average()
    }

    fn vertex_average(&self) -> Point3<f64> {
        let count = self.mesh.vertex_count();
        if count == 0 {
            return Point3::origin();
        }
        let sum = self
            .mesh
            .vertices()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / count as f64)
    }

    /// Axis-aligned bounds, `None` for an empty solid
    #[inline]
    pub fn bounds(&self) -> Option<Aabb> {
        self.mesh.bounds()
    }

    /// All vertex positions
    pub fn vertices(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.mesh.vertices()
    }

    /// Triangles as vertex triples
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.mesh.triangles()
    }

    /// Copy of the solid with an affine transform applied
    ///
    /// Mirroring transforms flip orientation; winding is restored so the
    /// result stays outward-facing.
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Solid {
        let mut mesh = self.mesh.transformed(matrix);
        if matrix.fixed_view::<3, 3>(0, 0).clone_owned().determinant() < 0.0 {
            mesh.flip_winding();
        }
        Solid { mesh }
    }

    /// Normal of the dominant upward-facing planar face
    ///
    /// Triangles are grouped by quantised normal; among groups pointing up
    /// the one with the largest area wins. This is the "top face" of a slab
    /// or roof, tilted for sloped roofs.
    pub fn dominant_up_normal(&self) -> Option<Vector3<f64>> {
        let mut groups: FxHashMap<(i32, i32, i32), (f64, Vector3<f64>)> = FxHashMap::default();

        for [a, b, c] in self.mesh.triangles() {
            let cross = (b - a).cross(&(c - a));
            let area = cross.norm() * 0.5;
            let normal = match cross.try_normalize(1e-12) {
                Some(n) => n,
                None => continue,
            };
            if normal.z <= 1e-6 {
                continue;
            }
            let key = (
                (normal.x / NORMAL_QUANTUM).round() as i32,
                (normal.y / NORMAL_QUANTUM).round() as i32,
                (normal.z / NORMAL_QUANTUM).round() as i32,
            );
            let entry = groups.entry(key).or_insert((0.0, Vector3::zeros()));
            entry.0 += area;
            entry.1 += normal * area;
        }

        groups
            .into_values()
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .and_then(|(_, sum)| sum.try_normalize(1e-12))
    }
}

impl From<Mesh> for Solid {
    fn from(mesh: Mesh) -> Self {
        Solid::from_mesh(mesh)
    }
}
