// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Opening sizing engine
//!
//! Resolution order for one penetration:
//!
//! 1. Type size cache, keyed by the type fingerprint
//! 2. Dimension parameters for categories with a manufactured profile
//! 3. Bounding box of the intersection solid, measured in a frame where the
//!    run axis is +Y: width is the X extent, height the Z extent
//!
//! Raw sizes are snapped to the grid before caching. Cut offset and the
//! minimum side are applied on top of the cached value, so the snapshot
//! stays independent of per-session padding.

use crate::cache::TypeSizeCache;
use crate::context::CandidateElement;
use crate::direction::reset_direction_to_positive;
use crate::document::ElementType;
use opening_lite_core::{
    round_to_grid, ElementTypeData, OpeningShape, ParametricProfile, ScanConfig, SizingStrategy,
};
use opening_lite_geometry::{
    rotation_about_axis, Aabb, Matrix4, Point3, Solid, Vector3,
};
use std::f64::consts::FRAC_PI_2;

/// Size of one penetration
#[derive(Debug, Clone, PartialEq)]
pub struct SizeResult {
    pub fingerprint: String,
    /// Raw snapped size as stored in the cache
    pub data: ElementTypeData,
    /// Final width with cut offset and minimum side applied
    pub width: f64,
    /// Final height with cut offset and minimum side applied
    pub height: f64,
    pub shape: OpeningShape,
    pub from_cache: bool,
}

/// Snapped dimensions read from instance parameters
#[derive(Debug, Clone, Copy, PartialEq)]
enum ParametricSize {
    Round { diameter: f64 },
    Rectangular { width: f64, height: f64 },
}

impl ParametricSize {
    fn read(profile: ParametricProfile, candidate: &CandidateElement, grid: f64) -> Option<Self> {
        let positive = |id| {
            candidate
                .parameter(id)
                .filter(|v| v.is_finite() && *v > 0.0)
                .map(|v| round_to_grid(v, grid))
        };
        match profile {
            ParametricProfile::Round { diameter } => {
                positive(diameter).map(|diameter| ParametricSize::Round { diameter })
            }
            ParametricProfile::Rectangular { width, height } => Some(ParametricSize::Rectangular {
                width: positive(width)?,
                height: positive(height)?,
            }),
            ParametricProfile::RoundOrRectangular {
                diameter,
                width,
                height,
            } => match positive(diameter) {
                Some(diameter) => Some(ParametricSize::Round { diameter }),
                None => Some(ParametricSize::Rectangular {
                    width: positive(width)?,
                    height: positive(height)?,
                }),
            },
        }
    }

    fn width_height(&self) -> (f64, f64) {
        match *self {
            ParametricSize::Round { diameter } => (diameter, diameter),
            ParametricSize::Rectangular { width, height } => (width, height),
        }
    }

    fn is_round(&self) -> bool {
        matches!(self, ParametricSize::Round { .. })
    }
}

/// Rotation taking `axis` to +Y about `center`
///
/// The axis is first reset to its positive sign, so `axis` and `-axis`
/// give the same frame. The first turn is about Z by the plan angle, the
/// second about X by the elevation angle.
pub fn canonical_rotation(axis: &Vector3<f64>, center: &Point3<f64>) -> Matrix4<f64> {
    let Some(unit) = axis.try_normalize(1e-12) else {
        return Matrix4::identity();
    };
    let a = reset_direction_to_positive(&unit);

    let horizontal = a.y.atan2(a.x);
    let vertical = a.z.clamp(-1.0, 1.0).asin();

    let plan = rotation_about_axis(center, &Vector3::z_axis(), FRAC_PI_2 - horizontal);
    let elevation = rotation_about_axis(center, &Vector3::x_axis(), -vertical);
    elevation * plan
}

/// Width (X extent) and height (Z extent) of `points` seen through `frame`
pub fn measure_in_frame<I>(points: I, frame: &Matrix4<f64>) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = Point3<f64>>,
{
    let bounds = Aabb::from_points(points.into_iter().map(|p| frame.transform_point(&p)))?;
    let size = bounds.size();
    Some((size.x.abs(), size.z.abs()))
}

/// Raw side plus cut offset on both sides, raised to the minimum side
#[inline]
pub fn padded_side(raw: f64, config: &ScanConfig) -> f64 {
    (raw + 2.0 * config.cut_offset).max(config.min_side_size)
}

fn mm_key(value: f64, config: &ScanConfig) -> String {
    format!("{}", (config.to_mm(value) * 10.0).round() / 10.0)
}

fn fingerprint(element_type: &ElementType, parametric: Option<&ParametricSize>, config: &ScanConfig) -> String {
    match parametric {
        None => element_type.unique_id.clone(),
        Some(ParametricSize::Round { diameter }) => {
            format!("{}|D{}", element_type.unique_id, mm_key(*diameter, config))
        }
        Some(ParametricSize::Rectangular { width, height }) => format!(
            "{}|{}x{}",
            element_type.unique_id,
            mm_key(*width, config),
            mm_key(*height, config)
        ),
    }
}

pub struct SizingEngine<'a> {
    config: &'a ScanConfig,
    cache: &'a TypeSizeCache,
}

impl<'a> SizingEngine<'a> {
    pub fn new(config: &'a ScanConfig, cache: &'a TypeSizeCache) -> Self {
        Self { config, cache }
    }

    /// Resolve the opening size of `candidate` crossing a host
    ///
    /// `intersection` is only measured when neither the cache nor the
    /// parameters answer. `None` when the measured size snaps to zero.
    pub fn resolve_size(
        &self,
        element_type: &ElementType,
        candidate: &CandidateElement,
        intersection: &Solid,
        axis: &Vector3<f64>,
    ) -> Option<SizeResult> {
        let grid = self.config.snap_grid();
        let parametric = match SizingStrategy::for_category(candidate.category) {
            SizingStrategy::Parametric(profile) => {
                let size = ParametricSize::read(profile, candidate, grid);
                if size.is_none() {
                    tracing::debug!(
                        candidate = %candidate.id,
                        "Dimension parameters missing, measuring geometry"
                    );
                }
                size
            }
            SizingStrategy::GeometricFallback => None,
        };
        let key = fingerprint(element_type, parametric.as_ref(), self.config);

        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(fingerprint = %key, "Type size cache hit");
            return Some(self.finish(key, cached, true));
        }

        let (width, height, round) = match parametric {
            Some(size) => {
                let (w, h) = size.width_height();
                (w, h, size.is_round())
            }
            None => {
                let frame = canonical_rotation(axis, &intersection.centroid());
                let (w, h) = measure_in_frame(intersection.vertices(), &frame)?;
                (round_to_grid(w, grid), round_to_grid(h, grid), false)
            }
        };
        if width <= 0.0 || height <= 0.0 {
            tracing::debug!(
                candidate = %candidate.id,
                width,
                height,
                "Penetration snaps to zero size"
            );
            return None;
        }

        let data = ElementTypeData::new(
            candidate.category,
            element_type.family_name.clone(),
            element_type.symbol_name.clone(),
            width,
            height,
            ElementTypeData::describe(self.config.to_mm(width), self.config.to_mm(height)),
        )
        .with_round(round);

        let outcome = self.cache.insert_if_absent(key.clone(), data);
        if outcome.is_inserted() {
            tracing::debug!(fingerprint = %key, width, height, "Type size cached");
            if self.config.persist_cache_on_insert {
                if let Err(e) = self.cache.flush() {
                    tracing::warn!(error = %e, "Failed to persist type size cache");
                }
            }
        }

        Some(self.finish(key, outcome.into_value(), false))
    }

    fn finish(&self, fingerprint: String, data: ElementTypeData, from_cache: bool) -> SizeResult {
        SizeResult {
            fingerprint,
            width: padded_side(data.width, self.config),
            height: padded_side(data.height, self.config),
            shape: data.shape(),
            data,
            from_cache,
        }
    }
}
