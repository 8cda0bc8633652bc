// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cached type sizes and emitted opening descriptors

use crate::category::BuiltInCategory;
use crate::ids::{ElementId, LevelId};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Size record for one element type, keyed by fingerprint in the cache
///
/// Width and height are raw snapped sizes without cut offset, in model
/// units. The description is in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementTypeData {
    pub category_id: BuiltInCategory,
    pub category_name: String,
    pub family_name: String,
    pub symbol_name: String,
    pub height: f64,
    pub width: f64,
    pub description: String,
    /// Size came from a diameter parameter
    #[serde(default)]
    pub round: bool,
}

impl ElementTypeData {
    pub fn new(
        category: BuiltInCategory,
        family_name: impl Into<String>,
        symbol_name: impl Into<String>,
        width: f64,
        height: f64,
        description: String,
    ) -> Self {
        Self {
            category_id: category,
            category_name: category.name().to_string(),
            family_name: family_name.into(),
            symbol_name: symbol_name.into(),
            height,
            width,
            description,
            round: false,
        }
    }

    pub fn with_round(mut self, round: bool) -> Self {
        self.round = round;
        self
    }

    /// Both sides strictly positive; anything else is a corrupt entry.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// `"{width}x{height}(h)"` with trailing zeros dropped
    pub fn describe(width: f64, height: f64) -> String {
        format!("{}x{}(h)", format_dimension(width), format_dimension(height))
    }

    pub fn shape(&self) -> OpeningShape {
        if self.round {
            OpeningShape::Round
        } else {
            OpeningShape::Rectangular
        }
    }
}

fn format_dimension(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", rounded)
    }
}

/// Cross-section of the opening to cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpeningShape {
    Round,
    Rectangular,
}

/// One opening found by a scan, handed to the caller.
///
/// `width`/`height` include the cut offset and the size limits; `description`
/// names the raw penetration size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningDescriptor {
    pub host_id: ElementId,
    pub candidate_id: ElementId,
    /// Other candidates folded into this opening by the proximity merge
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_candidates: Vec<ElementId>,
    pub level_id: LevelId,
    pub origin: Point3<f64>,
    pub host_normal: Vector3<f64>,
    pub run_direction: Vector3<f64>,
    pub width: f64,
    pub height: f64,
    pub shape: OpeningShape,
    pub description: String,
    /// Cache key of the type that sized this opening
    pub type_fingerprint: String,
    /// UI state only
    #[serde(default)]
    pub selected: bool,
}

impl OpeningDescriptor {
    pub fn toggle_selected(&mut self) {
        self.selected = !self.selected;
    }

    pub fn select(&mut self) {
        self.selected = true;
    }

    pub fn deselect(&mut self) {
        self.selected = false;
    }

    /// Every candidate this opening serves, primary first
    pub fn candidate_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        std::iter::once(self.candidate_id).chain(self.merged_candidates.iter().copied())
    }

    pub fn is_merged(&self) -> bool {
        !self.merged_candidates.is_empty()
    }
}
