// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primitive solid builders
//!
//! Boxes for host outlines and walls, rectangular prisms and faceted
//! cylinders for duct/pipe runs laid along an arbitrary axis.

use crate::bbox::Aabb;
use crate::mesh::Mesh;
use crate::solid::Solid;
use nalgebra::{Matrix4, Point3, Vector3};
use std::f64::consts::TAU;

/// Box solid from AABB bounds
///
/// 12 triangles, counter-clockwise when viewed from outside.
pub fn box_solid(aabb: &Aabb) -> Solid {
    let (min, max) = (aabb.min, aabb.max);
    let mut mesh = Mesh::with_capacity(8, 36);

    let v0 = mesh.add_vertex(Point3::new(min.x, min.y, min.z)); // front-bottom-left
    let v1 = mesh.add_vertex(Point3::new(max.x, min.y, min.z)); // front-bottom-right
    let v2 = mesh.add_vertex(Point3::new(max.x, max.y, min.z)); // front-top-right
    let v3 = mesh.add_vertex(Point3::new(min.x, max.y, min.z)); // front-top-left
    let v4 = mesh.add_vertex(Point3::new(min.x, min.y, max.z)); // back-bottom-left
    let v5 = mesh.add_vertex(Point3::new(max.x, min.y, max.z)); // back-bottom-right
    let v6 = mesh.add_vertex(Point3::new(max.x, max.y, max.z)); // back-top-right
    let v7 = mesh.add_vertex(Point3::new(min.x, max.y, max.z)); // back-top-left

    // -Z
    mesh.add_triangle(v0, v2, v1);
    mesh.add_triangle(v0, v3, v2);
    // +Z
    mesh.add_triangle(v4, v5, v6);
    mesh.add_triangle(v4, v6, v7);
    // -X
    mesh.add_triangle(v0, v4, v7);
    mesh.add_triangle(v0, v7, v3);
    // +X
    mesh.add_triangle(v1, v2, v6);
    mesh.add_triangle(v1, v6, v5);
    // -Y
    mesh.add_triangle(v0, v1, v5);
    mesh.add_triangle(v0, v5, v4);
    // +Y
    mesh.add_triangle(v3, v7, v6);
    mesh.add_triangle(v3, v6, v2);

    Solid::from_mesh(mesh)
}

/// Right-handed frame whose Y column is the run axis
///
/// X is the width direction, Z the height direction (as close to world up
/// as the axis allows). `None` for a zero axis.
fn run_frame(center: &Point3<f64>, axis: &Vector3<f64>) -> Option<Matrix4<f64>> {
    let along = axis.try_normalize(1e-12)?;
    let up_hint = if along.z.abs() > 0.999 {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let height = (up_hint - along * up_hint.dot(&along)).normalize();
    let width = along.cross(&height);

    Some(Matrix4::new(
        width.x, along.x, height.x, center.x,
        width.y, along.y, height.y, center.y,
        width.z, along.z, height.z, center.z,
        0.0, 0.0, 0.0, 1.0,
    ))
}

/// Rectangular run of `width` x `height` section and `length` along `axis`
///
/// Empty solid for a zero axis.
pub fn prism_along(
    center: &Point3<f64>,
    axis: &Vector3<f64>,
    width: f64,
    height: f64,
    length: f64,
) -> Solid {
    let Some(frame) = run_frame(center, axis) else {
        return Solid::empty();
    };
    let local = Aabb::new(
        Point3::new(-width / 2.0, -length / 2.0, -height / 2.0),
        Point3::new(width / 2.0, length / 2.0, height / 2.0),
    );
    box_solid(&local).transformed(&frame)
}

/// Faceted cylinder of `diameter` and `length` along `axis`
///
/// `segments` is clamped to at least 3. Empty solid for a zero axis.
pub fn cylinder_along(
    center: &Point3<f64>,
    axis: &Vector3<f64>,
    diameter: f64,
    length: f64,
    segments: usize,
) -> Solid {
    let Some(frame) = run_frame(center, axis) else {
        return Solid::empty();
    };
    let n = segments.max(3);
    let r = diameter / 2.0;
    let h = length / 2.0;

    let mut mesh = Mesh::with_capacity(2 * n + 2, 12 * n);
    let bottom_center = mesh.add_vertex(Point3::new(0.0, -h, 0.0));
    let top_center = mesh.add_vertex(Point3::new(0.0, h, 0.0));

    let mut bottom = Vec::with_capacity(n);
    let mut top = Vec::with_capacity(n);
    for i in 0..n {
        let theta = TAU * i as f64 / n as f64;
        let (s, c) = theta.sin_cos();
        bottom.push(mesh.add_vertex(Point3::new(r * c, -h, r * s)));
        top.push(mesh.add_vertex(Point3::new(r * c, h, r * s)));
    }

    for i in 0..n {
        let j = (i + 1) % n;
        // Side
        mesh.add_triangle(bottom[i], top[i], bottom[j]);
        mesh.add_triangle(bottom[j], top[i], top[j]);
        // Caps
        mesh.add_triangle(bottom_center, bottom[i], bottom[j]);
        mesh.add_triangle(top_center, top[j], top[i]);
    }

    Solid::from_mesh(mesh).transformed(&frame)
}
