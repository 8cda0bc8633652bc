// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host model access
//!
//! The scan only reads the model through [`HostDocument`]. Everything it
//! returns is owned, so geometry fetched for one host or candidate is freed
//! as soon as that step is done with it.

use opening_lite_core::{BuiltInCategory, ElementId, ElementTypeId, LevelId, ParameterId};
use opening_lite_geometry::{Aabb, Placement, Point3, Solid, Vector3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Structural kind of a host element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostKind {
    /// Orientation is the wall's exterior-facing normal
    Wall { orientation: Vector3<f64> },
    Floor,
    Roof,
    Ceiling,
}

impl HostKind {
    pub fn name(&self) -> &'static str {
        match self {
            HostKind::Wall { .. } => "wall",
            HostKind::Floor => "floor",
            HostKind::Roof => "roof",
            HostKind::Ceiling => "ceiling",
        }
    }
}

/// Structural element as stored in the host model
#[derive(Debug, Clone)]
pub struct HostElement {
    pub id: ElementId,
    pub level_id: LevelId,
    pub kind: HostKind,
    pub solid: Solid,
}

/// Where a penetrating element is placed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Location {
    /// Family instance placed by a transform
    Point(Placement),
    /// Run along a location curve
    Curve {
        start: Point3<f64>,
        end: Point3<f64>,
    },
}

/// Penetrating element as stored in the host model
#[derive(Debug, Clone)]
pub struct RawCandidate {
    pub id: ElementId,
    pub category: BuiltInCategory,
    pub type_id: ElementTypeId,
    pub location: Location,
    /// Compound families may carry several disjoint solids
    pub solids: SmallVec<[Solid; 2]>,
    /// Instance dimension parameters in model units
    pub parameters: FxHashMap<ParameterId, f64>,
}

impl RawCandidate {
    /// Union of the bounding boxes of every solid
    pub fn bounds(&self) -> Option<Aabb> {
        self.solids
            .iter()
            .filter_map(Solid::bounds)
            .reduce(|a, b| a.union(&b))
    }

    pub fn parameter(&self, id: ParameterId) -> Option<f64> {
        self.parameters.get(&id).copied()
    }
}

/// Element type (family symbol)
#[derive(Debug, Clone, PartialEq)]
pub struct ElementType {
    pub id: ElementTypeId,
    /// Stable identity across sessions
    pub unique_id: String,
    pub category: BuiltInCategory,
    pub family_name: String,
    pub symbol_name: String,
}

/// Read access to the host model
pub trait HostDocument {
    /// False once the model has been closed or is otherwise unreachable
    fn is_available(&self) -> bool;

    /// Short name used in diagnostics
    fn title(&self) -> &str {
        "document"
    }

    fn host_element(&self, id: ElementId) -> Option<HostElement>;

    /// Ids of elements of `category` whose bounding box touches `bounds`
    ///
    /// A bounding-volume query only; callers confirm real contact
    /// themselves.
    fn candidates_in_box(&self, category: BuiltInCategory, bounds: &Aabb) -> Vec<ElementId>;

    fn candidate_element(&self, id: ElementId) -> Option<RawCandidate>;

    fn element_type(&self, id: ElementTypeId) -> Option<ElementType>;
}

/// In-memory [`HostDocument`]
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    title: String,
    available: bool,
    hosts: FxHashMap<ElementId, HostElement>,
    candidates: FxHashMap<ElementId, RawCandidate>,
    types: FxHashMap<ElementTypeId, ElementType>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl MemoryDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            available: true,
            hosts: FxHashMap::default(),
            candidates: FxHashMap::default(),
            types: FxHashMap::default(),
        }
    }

    pub fn add_host(&mut self, host: HostElement) -> &mut Self {
        self.hosts.insert(host.id, host);
        self
    }

    pub fn add_candidate(&mut self, candidate: RawCandidate) -> &mut Self {
        self.candidates.insert(candidate.id, candidate);
        self
    }

    pub fn add_type(&mut self, element_type: ElementType) -> &mut Self {
        self.types.insert(element_type.id, element_type);
        self
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Host ids on `level`, sorted
    pub fn hosts_on_level(&self, level: LevelId) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = self
            .hosts
            .values()
            .filter(|h| h.level_id == level)
            .map(|h| h.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl HostDocument for MemoryDocument {
    fn is_available(&self) -> bool {
        self.available
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn host_element(&self, id: ElementId) -> Option<HostElement> {
        self.hosts.get(&id).cloned()
    }

    fn candidates_in_box(&self, category: BuiltInCategory, bounds: &Aabb) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = self
            .candidates
            .values()
            .filter(|c| c.category == category)
            .filter(|c| c.bounds().is_some_and(|b| b.intersects(bounds)))
            .map(|c| c.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn candidate_element(&self, id: ElementId) -> Option<RawCandidate> {
        self.candidates.get(&id).cloned()
    }

    fn element_type(&self, id: ElementTypeId) -> Option<ElementType> {
        self.types.get(&id).cloned()
    }
}
