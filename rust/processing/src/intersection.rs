// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Intersection solid builder
//!
//! Intersects the host solid with every solid of a candidate. Booleans that
//! fail or come back degenerate are dropped and the next solid is tried;
//! nothing here is ever surfaced as an error.

use opening_lite_geometry::{Aabb, GeometryKernel, Point3, Solid};

/// Penetration region of one (host, candidate) pair
#[derive(Debug, Clone)]
pub struct IntersectionResult {
    pub solid: Solid,
    pub centroid: Point3<f64>,
    pub volume: f64,
    pub bounds: Aabb,
}

impl IntersectionResult {
    fn from_solid(solid: Solid) -> Option<Self> {
        let bounds = solid.bounds()?;
        Some(Self {
            centroid: solid.centroid(),
            volume: solid.volume(),
            bounds,
            solid,
        })
    }
}

pub struct IntersectionBuilder<'k, K: GeometryKernel> {
    kernel: &'k K,
    tolerance: f64,
}

impl<'k, K: GeometryKernel> IntersectionBuilder<'k, K> {
    /// `tolerance` is the smallest volume kept, in cubic model units
    pub fn new(kernel: &'k K, tolerance: f64) -> Self {
        Self { kernel, tolerance }
    }

    /// Region shared by `host` and `candidate_solids`
    ///
    /// Several non-trivial pieces are unioned into one solid. If that union
    /// fails the largest piece is kept. `None` when nothing exceeds the
    /// volume tolerance.
    pub fn intersect(&self, host: &Solid, candidate_solids: &[Solid]) -> Option<IntersectionResult> {
        let mut pieces: Vec<Solid> = Vec::with_capacity(candidate_solids.len());

        for (index, solid) in candidate_solids.iter().enumerate() {
            if solid.face_count() == 0 {
                continue;
            }
            match self.kernel.intersect(host, solid) {
                Ok(piece) if !piece.is_degenerate(0.0) => pieces.push(piece),
                Ok(_) => {
                    tracing::trace!(solid = index, "Degenerate intersection piece dropped");
                }
                Err(e) => {
                    tracing::warn!(solid = index, error = %e, "Boolean intersection failed, skipping solid");
                }
            }
        }

        let solid = match pieces.len() {
            0 => return None,
            1 => pieces.pop()?,
            _ => self.union_pieces(pieces)?,
        };

        let volume = solid.volume();
        if volume <= self.tolerance {
            tracing::trace!(volume, tolerance = self.tolerance, "Intersection below tolerance");
            return None;
        }
        IntersectionResult::from_solid(solid)
    }

    fn union_pieces(&self, pieces: Vec<Solid>) -> Option<Solid> {
        let largest = pieces
            .iter()
            .max_by(|a, b| a.volume().total_cmp(&b.volume()))
            .cloned();

        let mut iter = pieces.into_iter();
        let mut acc = iter.next()?;
        for piece in iter {
            match self.kernel.union(&acc, &piece) {
                Ok(merged) if !merged.is_degenerate(0.0) => acc = merged,
                Ok(_) | Err(_) => {
                    tracing::warn!("Union of intersection pieces failed, keeping largest piece");
                    return largest;
                }
            }
        }
        Some(acc)
    }
}
