// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Directional compatibility between a host's normal and a run's axis
//!
//! A run only counts as a penetration when it crosses the host roughly
//! along the host normal. Runs lying in the host's plane are embedded, not
//! penetrating.

use crate::document::Location;
use opening_lite_geometry::Vector3;

/// Below this length a direction is treated as the zero vector
pub const AXIS_EPSILON: f64 = 1e-9;

/// True when `candidate_axis` is within `threshold_degrees` of `host_normal`
///
/// Either direction of the axis is accepted. A zero normal or axis is never
/// compatible. The comparison is strict, so an axis exactly at the threshold
/// is rejected.
pub fn is_compatible(
    host_normal: &Vector3<f64>,
    candidate_axis: &Vector3<f64>,
    threshold_degrees: f64,
) -> bool {
    let (Some(n), Some(a)) = (
        host_normal.try_normalize(AXIS_EPSILON),
        candidate_axis.try_normalize(AXIS_EPSILON),
    ) else {
        return false;
    };
    n.dot(&a).abs() > threshold_degrees.to_radians().cos()
}

/// Principal axis of a candidate, normalized
///
/// Point-placed instances use their placement X basis; curve-based runs use
/// the direction of their location curve. `None` for a degenerate placement
/// or a zero-length curve.
pub fn resolve_candidate_axis(location: &Location) -> Option<Vector3<f64>> {
    let axis = match location {
        Location::Point(placement) => placement.basis_x(),
        Location::Curve { start, end } => end - start,
    };
    if !axis.iter().all(|c| c.is_finite()) {
        return None;
    }
    axis.try_normalize(AXIS_EPSILON)
}

/// Canonical sign of a direction, so `v` and `-v` map to the same vector
///
/// The first significant component in Y, X, Z order is made positive. In
/// plan this keeps the angle from +X in `[0, pi)`.
pub fn reset_direction_to_positive(direction: &Vector3<f64>) -> Vector3<f64> {
    let flip = if direction.y.abs() > AXIS_EPSILON {
        direction.y < 0.0
    } else if direction.x.abs() > AXIS_EPSILON {
        direction.x < 0.0
    } else {
        direction.z < 0.0
    };
    let v = if flip { -direction } else { *direction };
    // No negative zeros, they would turn atan2 of a vertical axis into -pi
    v.map(|c| if c == 0.0 { 0.0 } else { c })
}

/// Angle between the host normal and the run axis, folded into `[0, pi/2]`
pub fn penetration_angle(host_normal: &Vector3<f64>, candidate_axis: &Vector3<f64>) -> Option<f64> {
    let n = host_normal.try_normalize(AXIS_EPSILON)?;
    let a = candidate_axis.try_normalize(AXIS_EPSILON)?;
    Some(n.dot(&a).abs().clamp(0.0, 1.0).acos())
}
