// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Proximity merge for openings found on one host
//!
//! Runs whose penetration centroids are closer than the merge distance share
//! one opening. The merged opening is sized from the raw extents of both
//! penetration regions, measured in the first run's canonical frame.

use crate::sizing::{measure_in_frame, padded_side};
use opening_lite_core::{round_to_grid, ElementId, ElementTypeData, OpeningDescriptor, OpeningShape, ScanConfig};
use opening_lite_geometry::{Matrix4, Point3};

/// Opening waiting for the rest of its host to be scanned
#[derive(Debug, Clone)]
pub struct PendingOpening {
    pub descriptor: OpeningDescriptor,
    /// Penetration volume, weights the merged centroid
    pub volume: f64,
    /// Canonical frame of the run
    pub frame: Matrix4<f64>,
    /// Vertices of the penetration region, world space
    pub points: Vec<Point3<f64>>,
}

/// Result of [`ProximityMerge::accept`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Accepted,
    /// Folded into the opening first found for this candidate
    Merged { into: ElementId },
}

impl MergeOutcome {
    pub fn is_merged(&self) -> bool {
        matches!(self, MergeOutcome::Merged { .. })
    }
}

/// Openings of one host, merged as they arrive
pub struct ProximityMerge<'a> {
    config: &'a ScanConfig,
    min_distance: f64,
    openings: Vec<PendingOpening>,
}

impl<'a> ProximityMerge<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self {
            config,
            min_distance: config.merge_distance(),
            openings: Vec::new(),
        }
    }

    pub fn min_distance(&self) -> f64 {
        self.min_distance
    }

    pub fn len(&self) -> usize {
        self.openings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.openings.is_empty()
    }

    /// Add an opening, merging it into the first accepted one strictly
    /// closer than the merge distance
    pub fn accept(&mut self, opening: PendingOpening) -> MergeOutcome {
        let origin = opening.descriptor.origin;
        let min_distance = self.min_distance;
        let target = self
            .openings
            .iter_mut()
            .find(|o| (o.descriptor.origin - origin).norm() < min_distance);

        match target {
            Some(existing) => {
                let into = existing.descriptor.candidate_id;
                tracing::debug!(
                    candidate = %opening.descriptor.candidate_id,
                    into = %into,
                    "Merging nearby penetration"
                );
                merge_into(existing, opening, self.config);
                MergeOutcome::Merged { into }
            }
            None => {
                self.openings.push(opening);
                MergeOutcome::Accepted
            }
        }
    }

    pub fn into_openings(self) -> Vec<OpeningDescriptor> {
        self.openings.into_iter().map(|o| o.descriptor).collect()
    }
}

fn merge_into(existing: &mut PendingOpening, other: PendingOpening, config: &ScanConfig) {
    let total = existing.volume + other.volume;
    let origin = if total > 0.0 {
        Point3::from(
            (existing.descriptor.origin.coords * existing.volume
                + other.descriptor.origin.coords * other.volume)
                / total,
        )
    } else {
        Point3::from((existing.descriptor.origin.coords + other.descriptor.origin.coords) * 0.5)
    };

    existing.points.extend(other.points);
    existing.volume = total;

    let d = &mut existing.descriptor;
    d.origin = origin;
    d.merged_candidates.extend(other.descriptor.candidate_ids());
    d.shape = OpeningShape::Rectangular;

    if let Some((w, h)) = measure_in_frame(existing.points.iter().copied(), &existing.frame) {
        let grid = config.snap_grid();
        let (w, h) = (round_to_grid(w, grid), round_to_grid(h, grid));
        d.width = padded_side(w, config);
        d.height = padded_side(h, config);
        d.description = ElementTypeData::describe(config.to_mm(w), config.to_mm(h));
    }
}
