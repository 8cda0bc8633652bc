// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Opening-Lite Core
//!
//! Geometry-free domain model for finding openings where building-service
//! runs (pipes, ducts, conduits, cable trays) pass through walls, floors and
//! roofs.
//!
//! ## Overview
//!
//! - **Identifiers**: element, level and type ids handed out by the host model
//! - **Categories**: built-in categories and the table deciding how each one
//!   is sized (dimension parameters or measured geometry)
//! - **Type data**: the per-type size record stored in the size cache
//! - **Descriptors**: the openings a scan emits
//! - **Configuration**: side limits, cut offset, parallelism threshold, snap grid
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use opening_lite_core::{round_to_grid, ScanConfig};
//!
//! let config = ScanConfig::from_env();
//! config.validate()?;
//! let side = round_to_grid(102.4, config.snap_grid());
//! assert_eq!(side, 100.0);
//! ```

pub mod category;
pub mod config;
pub mod error;
pub mod ids;
pub mod opening;
pub mod units;

pub use category::{BuiltInCategory, ParameterId, ParametricProfile, SizingStrategy};
pub use config::ScanConfig;
pub use error::{Error, Result};
pub use ids::{ElementId, ElementTypeId, LevelId};
pub use opening::{ElementTypeData, OpeningDescriptor, OpeningShape};
pub use units::{round_to_grid, AngleUnit};
