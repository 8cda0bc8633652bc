// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Penetrating-element categories and how each one is sized
//!
//! Categories with a manufactured profile (round pipe, rectangular duct,
//! cable tray...) carry authoritative dimension parameters; everything else
//! is measured from its intersection geometry.

use serde::{Deserialize, Serialize};

/// Host-model category of a penetrating element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum BuiltInCategory {
    Pipes,
    PipeFittings,
    FlexPipes,
    Ducts,
    DuctFittings,
    FlexDucts,
    Conduits,
    CableTrays,
    MechanicalEquipment,
    GenericModels,
    /// Any category without special handling, by raw id
    Other(i64),
}

/// (category, raw id, display name)
const CATEGORY_IDS: &[(BuiltInCategory, i64, &str)] = &[
    (BuiltInCategory::Pipes, -2008044, "Pipes"),
    (BuiltInCategory::PipeFittings, -2008049, "Pipe Fittings"),
    (BuiltInCategory::FlexPipes, -2008050, "Flex Pipes"),
    (BuiltInCategory::Ducts, -2008000, "Ducts"),
    (BuiltInCategory::DuctFittings, -2008010, "Duct Fittings"),
    (BuiltInCategory::FlexDucts, -2008020, "Flex Ducts"),
    (BuiltInCategory::Conduits, -2008132, "Conduits"),
    (BuiltInCategory::CableTrays, -2008130, "Cable Trays"),
    (BuiltInCategory::MechanicalEquipment, -2001140, "Mechanical Equipment"),
    (BuiltInCategory::GenericModels, -2000151, "Generic Models"),
];

impl BuiltInCategory {
    /// Raw host-model id
    pub fn id(self) -> i64 {
        if let BuiltInCategory::Other(id) = self {
            return id;
        }
        CATEGORY_IDS
            .iter()
            .find(|(c, _, _)| *c == self)
            .map(|(_, id, _)| *id)
            .unwrap_or_default()
    }

    pub fn from_id(id: i64) -> Self {
        CATEGORY_IDS
            .iter()
            .find(|(_, raw, _)| *raw == id)
            .map(|(c, _, _)| *c)
            .unwrap_or(BuiltInCategory::Other(id))
    }

    pub fn name(self) -> &'static str {
        CATEGORY_IDS
            .iter()
            .find(|(c, _, _)| *c == self)
            .map(|(_, _, name)| *name)
            .unwrap_or("Other")
    }
}

impl From<i64> for BuiltInCategory {
    fn from(id: i64) -> Self {
        BuiltInCategory::from_id(id)
    }
}

impl From<BuiltInCategory> for i64 {
    fn from(category: BuiltInCategory) -> Self {
        category.id()
    }
}

/// Dimension parameters read on the parametric fast path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterId {
    PipeOuterDiameter,
    ConduitOuterDiameter,
    DuctDiameter,
    DuctWidth,
    DuctHeight,
    CableTrayWidth,
    CableTrayHeight,
}

/// Which parameters describe a manufactured profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParametricProfile {
    Round {
        diameter: ParameterId,
    },
    Rectangular {
        width: ParameterId,
        height: ParameterId,
    },
    /// Ducts: round when a diameter is present, rectangular otherwise
    RoundOrRectangular {
        diameter: ParameterId,
        width: ParameterId,
        height: ParameterId,
    },
}

/// How an element's opening size is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingStrategy {
    Parametric(ParametricProfile),
    GeometricFallback,
}

const STRATEGY_TABLE: &[(BuiltInCategory, SizingStrategy)] = &[
    (
        BuiltInCategory::Pipes,
        SizingStrategy::Parametric(ParametricProfile::Round {
            diameter: ParameterId::PipeOuterDiameter,
        }),
    ),
    (
        BuiltInCategory::FlexPipes,
        SizingStrategy::Parametric(ParametricProfile::Round {
            diameter: ParameterId::PipeOuterDiameter,
        }),
    ),
    (
        BuiltInCategory::Conduits,
        SizingStrategy::Parametric(ParametricProfile::Round {
            diameter: ParameterId::ConduitOuterDiameter,
        }),
    ),
    (
        BuiltInCategory::Ducts,
        SizingStrategy::Parametric(ParametricProfile::RoundOrRectangular {
            diameter: ParameterId::DuctDiameter,
            width: ParameterId::DuctWidth,
            height: ParameterId::DuctHeight,
        }),
    ),
    (
        BuiltInCategory::FlexDucts,
        SizingStrategy::Parametric(ParametricProfile::RoundOrRectangular {
            diameter: ParameterId::DuctDiameter,
            width: ParameterId::DuctWidth,
            height: ParameterId::DuctHeight,
        }),
    ),
    (
        BuiltInCategory::CableTrays,
        SizingStrategy::Parametric(ParametricProfile::Rectangular {
            width: ParameterId::CableTrayWidth,
            height: ParameterId::CableTrayHeight,
        }),
    ),
];

impl SizingStrategy {
    /// Table lookup; categories not listed are measured geometrically
    pub fn for_category(category: BuiltInCategory) -> SizingStrategy {
        STRATEGY_TABLE
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, s)| *s)
            .unwrap_or(SizingStrategy::GeometricFallback)
    }
}
