// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid-vs-solid intersection test
//!
//! A boolean-free "do these touch" query: cheaper than a full intersection
//! and used to narrow bounding-box candidates before any CSG work.

use crate::bbox::Aabb;
use crate::solid::Solid;
use nalgebra::{Point3, Vector3};

const RAY_EPSILON: f64 = 1e-9;

/// Segment/triangle intersection (Moller-Trumbore restricted to t in [0, 1])
///
/// Parallel (coplanar) segments never report a hit.
pub fn segment_hits_triangle(
    start: &Point3<f64>,
    end: &Point3<f64>,
    tri: &[Point3<f64>; 3],
) -> bool {
    let dir = end - start;
    matches!(ray_triangle(start, &dir, tri), Some(t) if (0.0..=1.0).contains(&t))
}

/// Ray parameter of the hit, if any
fn ray_triangle(origin: &Point3<f64>, dir: &Vector3<f64>, tri: &[Point3<f64>; 3]) -> Option<f64> {
    let edge1 = tri[1] - tri[0];
    let edge2 = tri[2] - tri[0];
    let h = dir.cross(&edge2);
    let det = edge1.dot(&h);

    let scale = edge1.norm() * edge2.norm() * dir.norm();
    if scale <= 0.0 || det.abs() <= RAY_EPSILON * scale {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = origin - tri[0];
    let u = inv_det * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = inv_det * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    Some(inv_det * edge2.dot(&q))
}

/// Point containment by ray parity
///
/// The ray direction is deliberately skewed so it rarely grazes edges of
/// axis-aligned geometry.
pub fn point_in_solid(point: &Point3<f64>, solid: &Solid) -> bool {
    let Some(bounds) = solid.bounds() else {
        return false;
    };
    if !bounds.contains_point(point) {
        return false;
    }

    let dir = Vector3::new(0.5773, 0.5821, 0.5724);
    let crossings = solid
        .triangles()
        .filter_map(|tri| ray_triangle(point, &dir, &tri))
        .filter(|&t| t > RAY_EPSILON)
        .count();
    crossings % 2 == 1
}

fn triangle_bounds(tri: &[Point3<f64>; 3]) -> Aabb {
    let mut aabb = Aabb::new(tri[0], tri[1]);
    aabb.include_point(&tri[2]);
    aabb
}

/// Any edge of `a` (inside the overlap box) piercing any face of `b`
fn edges_pierce(a: &Solid, b: &Solid, overlap: &Aabb) -> bool {
    let b_tris: Vec<([Point3<f64>; 3], Aabb)> = b
        .triangles()
        .map(|t| (t, triangle_bounds(&t)))
        .filter(|(_, bb)| bb.intersects(overlap))
        .collect();
    if b_tris.is_empty() {
        return false;
    }

    for tri in a.triangles() {
        if !triangle_bounds(&tri).intersects(overlap) {
            continue;
        }
        for (start, end) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let edge_box = Aabb::new(start, end);
            for (other, other_box) in &b_tris {
                if edge_box.intersects(other_box) && segment_hits_triangle(&start, &end, other) {
                    return true;
                }
            }
        }
    }
    false
}

/// True when two closed solids share any volume or boundary crossing
pub fn solids_intersect(a: &Solid, b: &Solid) -> bool {
    let (Some(box_a), Some(box_b)) = (a.bounds(), b.bounds()) else {
        return false;
    };
    if !box_a.intersects(&box_b) {
        return false;
    }

    // Overlap region of the two boxes
    let overlap = Aabb::new(
        Point3::new(
            box_a.min.x.max(box_b.min.x),
            box_a.min.y.max(box_b.min.y),
            box_a.min.z.max(box_b.min.z),
        ),
        Point3::new(
            box_a.max.x.min(box_b.max.x),
            box_a.max.y.min(box_b.max.y),
            box_a.max.z.min(box_b.max.z),
        ),
    );

    if edges_pierce(a, b, &overlap) || edges_pierce(b, a, &overlap) {
        return true;
    }

    // No boundary crossing: either disjoint or one fully inside the other
    a.vertices().take(1).any(|p| point_in_solid(&p, b))
        || b.vertices().take(1).any(|p| point_in_solid(&p, a))
}
