// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial candidate filter
//!
//! Bounding-volume query first, then the exact solid contact test.

use crate::context::{CandidateElement, HostContext};
use crate::document::HostDocument;
use opening_lite_core::BuiltInCategory;
use opening_lite_geometry::GeometryKernel;
use rustc_hash::FxHashSet;

pub struct SpatialFilter<'k, K: GeometryKernel> {
    kernel: &'k K,
    tolerance: f64,
}

impl<'k, K: GeometryKernel> SpatialFilter<'k, K> {
    pub fn new(kernel: &'k K, tolerance: f64) -> Self {
        Self { kernel, tolerance }
    }

    /// Candidates of `category` whose solids touch the host's solid
    ///
    /// Empty when the host solid is degenerate. Order follows the document;
    /// each id appears once.
    pub fn candidates<D: HostDocument + ?Sized>(
        &self,
        document: &D,
        host: &HostContext,
        category: BuiltInCategory,
    ) -> Vec<CandidateElement> {
        if host.solid.is_degenerate(self.tolerance) {
            return Vec::new();
        }

        let mut seen = FxHashSet::default();
        let mut result = Vec::new();

        for id in document.candidates_in_box(category, &host.bounds) {
            if !seen.insert(id) {
                continue;
            }
            let Some(raw) = document.candidate_element(id) else {
                tracing::debug!(candidate = %id, "Candidate vanished from document");
                continue;
            };
            let Some(candidate) = CandidateElement::from_raw(raw) else {
                tracing::debug!(candidate = %id, "Candidate has no solid geometry");
                continue;
            };
            if !candidate.bounds.intersects(&host.bounds) {
                continue;
            }
            let touches = candidate
                .solids
                .iter()
                .any(|solid| self.kernel.intersects(&host.solid, solid));
            if touches {
                result.push(candidate);
            }
        }

        result
    }
}
