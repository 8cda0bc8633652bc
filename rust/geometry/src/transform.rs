// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placements and rotations
//!
//! A point-placed element carries a local coordinate system; its X basis is
//! the direction a family instance "runs" along.

use crate::error::{Error, Result};
use nalgebra::{Matrix4, Point3, Rotation3, Translation3, Unit, Vector3};

/// Local coordinate system of a point-placed element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    matrix: Matrix4<f64>,
}

impl Placement {
    /// Build an orthonormal placement from a location, Z axis and X reference
    ///
    /// X is re-orthogonalised against Z; if the two are parallel a default
    /// perpendicular is chosen. Fails only when Z itself is zero.
    pub fn from_axes(
        location: Point3<f64>,
        z_axis: Vector3<f64>,
        x_axis: Vector3<f64>,
    ) -> Result<Self> {
        let z_axis_final = z_axis
            .try_normalize(1e-12)
            .ok_or_else(|| Error::InvalidTransform("zero-length Z axis".to_string()))?;

        // Project X onto the plane perpendicular to Z
        let x_axis_orthogonal = x_axis - z_axis_final * x_axis.dot(&z_axis_final);
        let x_axis_final = match x_axis_orthogonal.try_normalize(1e-6) {
            Some(x) => x,
            None => {
                if z_axis_final.z.abs() < 0.9 {
                    Vector3::z().cross(&z_axis_final).normalize()
                } else {
                    Vector3::x().cross(&z_axis_final).normalize()
                }
            }
        };

        // Right-hand rule: Y = Z x X
        let y_axis = z_axis_final.cross(&x_axis_final).normalize();

        Ok(Self {
            matrix: Matrix4::new(
                x_axis_final.x, y_axis.x, z_axis_final.x, location.x,
                x_axis_final.y, y_axis.y, z_axis_final.y, location.y,
                x_axis_final.z, y_axis.z, z_axis_final.z, location.z,
                0.0, 0.0, 0.0, 1.0,
            ),
        })
    }

    /// Local X basis in world space, not normalised
    #[inline]
    pub fn basis_x(&self) -> Vector3<f64> {
        Vector3::new(self.matrix[(0, 0)], self.matrix[(1, 0)], self.matrix[(2, 0)])
    }
}

/// Rotation by `angle` radians about an axis through `center`
pub fn rotation_about_axis(
    center: &Point3<f64>,
    axis: &Unit<Vector3<f64>>,
    angle: f64,
) -> Matrix4<f64> {
    let to_origin = Translation3::from(-center.coords).to_homogeneous();
    let back = Translation3::from(center.coords).to_homogeneous();
    let rot = Rotation3::from_axis_angle(axis, angle).to_homogeneous();
    back * rot * to_origin
}
