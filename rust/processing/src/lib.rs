// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Opening-Lite Processing
//!
//! Finds where building-service runs pass through walls, floors and roofs
//! and sizes the opening each penetration needs.
//!
//! ## Pipeline
//!
//! For every host on every requested level:
//!
//! 1. [`SpatialFilter`]: bounding-box query, then exact solid contact
//! 2. [`is_compatible`]: the run must cross roughly along the host normal
//! 3. [`IntersectionBuilder`]: boolean intersection of host and run solids
//! 4. [`SizingEngine`]: type size cache, dimension parameters, or measured
//!    geometry
//! 5. [`ProximityMerge`]: nearby penetrations on the same host share one
//!    opening
//!
//! [`CollisionSession::scan`] drives the pipeline and yields
//! [`OpeningDescriptor`]s lazily.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use opening_lite_processing::{
//!     BuiltInCategory, CancellationToken, CollisionSession, LevelHosts, ScanConfig,
//! };
//!
//! let session = CollisionSession::new(ScanConfig::from_env())?;
//! let levels = vec![LevelHosts::new(level_id, wall_ids)];
//! for opening in session.scan(&document, levels, BuiltInCategory::Ducts, CancellationToken::new()) {
//!     let opening = opening?;
//!     println!("{} at {} ({})", opening.host_id, opening.origin, opening.description);
//! }
//! ```

pub mod cache;
pub mod context;
pub mod direction;
pub mod document;
pub mod intersection;
pub mod merge;
pub mod orchestrator;
pub mod sizing;
pub mod spatial;

pub use opening_lite_core::{
    BuiltInCategory, ElementId, ElementTypeData, ElementTypeId, Error, LevelId, OpeningDescriptor,
    OpeningShape, ParameterId, Result, ScanConfig,
};

pub use cache::{CacheInsert, TypeSizeCache};
pub use context::{CandidateElement, HostContext};
pub use direction::{
    is_compatible, penetration_angle, reset_direction_to_positive, resolve_candidate_axis,
};
pub use document::{ElementType, HostDocument, HostElement, HostKind, Location, MemoryDocument, RawCandidate};
pub use intersection::{IntersectionBuilder, IntersectionResult};
pub use merge::{MergeOutcome, PendingOpening, ProximityMerge};
pub use orchestrator::{CancellationToken, CollisionSession, LevelHosts, OpeningScan, ScanStats};
pub use sizing::{canonical_rotation, SizeResult, SizingEngine};
pub use spatial::SpatialFilter;
