// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-iteration wrappers around host and candidate elements

use crate::direction::{resolve_candidate_axis, AXIS_EPSILON};
use crate::document::{HostElement, HostKind, RawCandidate};
use opening_lite_core::{BuiltInCategory, ElementId, ElementTypeId, LevelId, ParameterId};
use opening_lite_geometry::{Aabb, Solid, Vector3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Host under test for one iteration of the scan
#[derive(Debug, Clone)]
pub struct HostContext {
    pub id: ElementId,
    pub level_id: LevelId,
    pub kind: HostKind,
    pub bounds: Aabb,
    pub solid: Solid,
    /// Wall orientation, or the dominant upward face normal for slabs
    pub normal: Vector3<f64>,
}

impl HostContext {
    /// Wrap a host element
    ///
    /// `None` when the solid is degenerate (volume at or below `tolerance`)
    /// or no reference normal can be resolved; such a host cannot be
    /// penetrated.
    pub fn from_element(element: HostElement, tolerance: f64) -> Option<Self> {
        if element.solid.is_degenerate(tolerance) {
            return None;
        }
        let bounds = element.solid.bounds()?;
        let normal = match element.kind {
            HostKind::Wall { orientation } => orientation.try_normalize(AXIS_EPSILON)?,
            HostKind::Floor | HostKind::Roof | HostKind::Ceiling => {
                element.solid.dominant_up_normal()?
            }
        };

        Some(Self {
            id: element.id,
            level_id: element.level_id,
            kind: element.kind,
            bounds,
            solid: element.solid,
            normal,
        })
    }
}

/// Penetrating element for one (host, candidate) pair
#[derive(Debug, Clone)]
pub struct CandidateElement {
    pub id: ElementId,
    pub category: BuiltInCategory,
    pub type_id: ElementTypeId,
    /// Normalized principal axis, `None` for a degenerate placement
    pub axis: Option<Vector3<f64>>,
    pub bounds: Aabb,
    pub solids: SmallVec<[Solid; 2]>,
    pub parameters: FxHashMap<ParameterId, f64>,
}

impl CandidateElement {
    /// Wrap a raw candidate, dropping solids without faces
    ///
    /// `None` when nothing with geometry is left.
    pub fn from_raw(raw: RawCandidate) -> Option<Self> {
        let axis = resolve_candidate_axis(&raw.location);
        let solids: SmallVec<[Solid; 2]> = raw
            .solids
            .into_iter()
            .filter(|s| s.face_count() > 0)
            .collect();
        let bounds = solids
            .iter()
            .filter_map(Solid::bounds)
            .reduce(|a, b| a.union(&b))?;

        Some(Self {
            id: raw.id,
            category: raw.category,
            type_id: raw.type_id,
            axis,
            bounds,
            solids,
            parameters: raw.parameters,
        })
    }

    pub fn parameter(&self, id: ParameterId) -> Option<f64> {
        self.parameters.get(&id).copied()
    }
}
