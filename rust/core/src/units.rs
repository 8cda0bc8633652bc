// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length snapping and angle display units

use serde::{Deserialize, Serialize};

/// Snap `value` to the nearest multiple of `grid`
///
/// Ties round away from zero (`f64::round`), so repeated runs never drift
/// the way banker's rounding would. A non-positive grid leaves the value
/// untouched. Idempotent: `round_to_grid(round_to_grid(x, g), g)` equals
/// `round_to_grid(x, g)`.
#[inline]
pub fn round_to_grid(value: f64, grid: f64) -> f64 {
    if grid.is_nan() || grid <= 0.0 || !value.is_finite() {
        return value;
    }
    (value / grid).round() * grid
}

/// Unit angles are shown in when logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnit {
    /// Convert an angle in radians to this unit
    #[inline]
    pub fn from_radians(self, radians: f64) -> f64 {
        match self {
            AngleUnit::Degrees => radians.to_degrees(),
            AngleUnit::Radians => radians,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AngleUnit::Degrees => "deg",
            AngleUnit::Radians => "rad",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deg" | "degree" | "degrees" => Some(AngleUnit::Degrees),
            "rad" | "radian" | "radians" => Some(AngleUnit::Radians),
            _ => None,
        }
    }
}
