// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collision scan session
//!
//! A [`CollisionSession`] owns the configuration, the geometry kernel and
//! a handle to the shared type size cache. [`CollisionSession::scan`]
//! returns an [`OpeningScan`], a lazy iterator that walks levels, hosts and
//! candidates in order:
//!
//! ```text
//! Idle -> PerLevel -> PerHost -> PerCandidate -> Emitting -> PerHost ... -> Done
//! ```
//!
//! All openings of a host are collected and merged before the first of them
//! is yielded. The scan cannot be resumed after cancellation; call
//! [`CollisionSession::scan`] again to start over from the first host.

use crate::cache::TypeSizeCache;
use crate::context::{CandidateElement, HostContext};
use crate::direction::{is_compatible, penetration_angle, reset_direction_to_positive};
use crate::document::HostDocument;
use crate::intersection::IntersectionBuilder;
use crate::merge::{PendingOpening, ProximityMerge};
use crate::sizing::{canonical_rotation, SizingEngine};
use crate::spatial::SpatialFilter;
use opening_lite_core::{
    BuiltInCategory, ElementId, Error, LevelId, OpeningDescriptor, Result, ScanConfig,
};
use opening_lite_geometry::{CsgKernel, GeometryKernel};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop signal, checked between hosts and between candidates
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Hosts to scan on one building level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelHosts {
    pub level_id: LevelId,
    pub host_ids: Vec<ElementId>,
}

impl LevelHosts {
    pub fn new(level_id: LevelId, host_ids: Vec<ElementId>) -> Self {
        Self { level_id, host_ids }
    }
}

/// Counters for one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub hosts_scanned: usize,
    pub hosts_skipped: usize,
    pub candidates_tested: usize,
    pub rejected_by_direction: usize,
    pub no_intersection: usize,
    pub missing_type: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub merged: usize,
    pub oversize_rejected: usize,
    pub emitted: usize,
}

pub struct CollisionSession<K: GeometryKernel = CsgKernel> {
    config: ScanConfig,
    kernel: K,
    cache: Arc<TypeSizeCache>,
    owns_cache: bool,
}

impl CollisionSession<CsgKernel> {
    /// Session with the csgrs kernel and its own cache
    ///
    /// The cache snapshot at `config.cache_path` is loaded now; an
    /// unreadable snapshot is logged and the cache starts empty.
    pub fn new(config: ScanConfig) -> Result<Self> {
        Self::with_kernel(config, CsgKernel::new())
    }
}

impl<K: GeometryKernel> CollisionSession<K> {
    /// Session with a custom kernel and its own cache
    pub fn with_kernel(config: ScanConfig, kernel: K) -> Result<Self> {
        config.validate()?;
        let cache = match &config.cache_path {
            Some(path) => TypeSizeCache::with_path(path),
            None => TypeSizeCache::in_memory(),
        };
        if let Err(e) = cache.load() {
            tracing::warn!(error = %e, "Could not load type size snapshot, starting empty");
        }
        Ok(Self {
            config,
            kernel,
            cache: Arc::new(cache),
            owns_cache: true,
        })
    }

    /// Session sharing a cache owned elsewhere
    ///
    /// The cache is neither loaded nor cleared by this session.
    pub fn with_cache(config: ScanConfig, kernel: K, cache: Arc<TypeSizeCache>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            kernel,
            cache,
            owns_cache: false,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn cache(&self) -> &Arc<TypeSizeCache> {
        &self.cache
    }

    /// Lazily scan `levels` for openings made by elements of `category`
    pub fn scan<'s, D: HostDocument + ?Sized>(
        &'s self,
        document: &'s D,
        levels: Vec<LevelHosts>,
        category: BuiltInCategory,
        cancel: CancellationToken,
    ) -> OpeningScan<'s, D, K> {
        OpeningScan {
            session: self,
            document,
            category,
            levels: levels.into_iter(),
            current_level: None,
            hosts: Vec::new().into_iter(),
            pending: VecDeque::new(),
            cancel,
            stats: ScanStats::default(),
            started: false,
            finished: false,
            span: tracing::info_span!(
                "opening_scan",
                document = document.title(),
                category = category.name()
            ),
        }
    }
}

impl<K: GeometryKernel> Drop for CollisionSession<K> {
    fn drop(&mut self) {
        if self.owns_cache {
            self.cache.clear();
        }
    }
}

/// Lazy sequence of openings from one scan
///
/// Yields `Err` at most once and then ends: for an unavailable document, or
/// for a cancellation that came before any opening was emitted.
pub struct OpeningScan<'s, D: HostDocument + ?Sized, K: GeometryKernel> {
    session: &'s CollisionSession<K>,
    document: &'s D,
    category: BuiltInCategory,
    levels: std::vec::IntoIter<LevelHosts>,
    current_level: Option<LevelId>,
    hosts: std::vec::IntoIter<ElementId>,
    pending: VecDeque<OpeningDescriptor>,
    cancel: CancellationToken,
    stats: ScanStats,
    started: bool,
    finished: bool,
    span: tracing::Span,
}

impl<'s, D: HostDocument + ?Sized, K: GeometryKernel> OpeningScan<'s, D, K> {
    /// Counters so far
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    fn finish(&mut self) {
        self.finished = true;
        self.pending.clear();
        tracing::info!(
            hosts_scanned = self.stats.hosts_scanned,
            hosts_skipped = self.stats.hosts_skipped,
            candidates_tested = self.stats.candidates_tested,
            rejected_by_direction = self.stats.rejected_by_direction,
            no_intersection = self.stats.no_intersection,
            missing_type = self.stats.missing_type,
            cache_hits = self.stats.cache_hits,
            cache_misses = self.stats.cache_misses,
            merged = self.stats.merged,
            oversize_rejected = self.stats.oversize_rejected,
            emitted = self.stats.emitted,
            "Opening scan finished"
        );
    }

    fn unavailable(&self) -> Error {
        Error::DocumentUnavailable(format!("{} is no longer available", self.document.title()))
    }

    /// Every opening on one host, or `None` when cancelled midway
    fn scan_host(&mut self, host_id: ElementId, level_id: LevelId) -> Option<Vec<OpeningDescriptor>> {
        let session = self.session;
        let config = &session.config;
        let _span = tracing::debug_span!("host", id = %host_id, level = %level_id).entered();

        let Some(element) = self.document.host_element(host_id) else {
            tracing::warn!("Host not found in document");
            self.stats.hosts_skipped += 1;
            return Some(Vec::new());
        };
        if element.level_id != level_id {
            tracing::warn!(host_level = %element.level_id, "Host is not on the scanned level, skipping");
            self.stats.hosts_skipped += 1;
            return Some(Vec::new());
        }
        let Some(host) = HostContext::from_element(element, config.volume_tolerance) else {
            tracing::debug!("Host has no usable solid or normal");
            self.stats.hosts_skipped += 1;
            return Some(Vec::new());
        };
        self.stats.hosts_scanned += 1;

        let candidates = SpatialFilter::new(&session.kernel, config.volume_tolerance)
            .candidates(self.document, &host, self.category);
        tracing::debug!(kind = host.kind.name(), count = candidates.len(), "Candidates touching host");

        let mut merge = ProximityMerge::new(config);
        for candidate in candidates {
            if self.cancel.is_cancelled() {
                tracing::debug!("Cancelled, discarding partial host results");
                return None;
            }
            self.stats.candidates_tested += 1;
            if let Some(opening) = self.process_candidate(&host, &candidate) {
                if merge.accept(opening).is_merged() {
                    self.stats.merged += 1;
                }
            }
        }

        let mut openings = merge.into_openings();
        let before = openings.len();
        openings.retain(|o| {
            let fits = o.width <= config.max_side_size && o.height <= config.max_side_size;
            if !fits {
                tracing::warn!(
                    candidate = %o.candidate_id,
                    width = o.width,
                    height = o.height,
                    max = config.max_side_size,
                    "Opening exceeds maximum side, dropped"
                );
            }
            fits
        });
        self.stats.oversize_rejected += before - openings.len();
        Some(openings)
    }

    /// One (host, candidate) pair; `None` when it yields no opening
    fn process_candidate(
        &mut self,
        host: &HostContext,
        candidate: &CandidateElement,
    ) -> Option<PendingOpening> {
        let session = self.session;
        let config = &session.config;

        let Some(axis) = candidate.axis else {
            tracing::debug!(candidate = %candidate.id, "Degenerate run axis");
            self.stats.rejected_by_direction += 1;
            return None;
        };
        if let Some(angle) = penetration_angle(&host.normal, &axis) {
            tracing::trace!(
                candidate = %candidate.id,
                angle = config.angle_display_unit.from_radians(angle),
                unit = config.angle_display_unit.symbol(),
                "Penetration angle"
            );
        }
        if !is_compatible(&host.normal, &axis, config.parallelism_threshold_degrees) {
            tracing::debug!(candidate = %candidate.id, "Run not parallel to host normal");
            self.stats.rejected_by_direction += 1;
            return None;
        }

        let builder = IntersectionBuilder::new(&session.kernel, config.volume_tolerance);
        let Some(intersection) = builder.intersect(&host.solid, &candidate.solids) else {
            tracing::debug!(candidate = %candidate.id, "No intersection above tolerance");
            self.stats.no_intersection += 1;
            return None;
        };

        let Some(element_type) = self.document.element_type(candidate.type_id) else {
            tracing::warn!(candidate = %candidate.id, type_id = %candidate.type_id, "Element type missing");
            self.stats.missing_type += 1;
            return None;
        };

        let Some(size) = SizingEngine::new(config, &session.cache).resolve_size(
            &element_type,
            candidate,
            &intersection.solid,
            &axis,
        ) else {
            self.stats.no_intersection += 1;
            return None;
        };
        if size.from_cache {
            self.stats.cache_hits += 1;
        } else {
            self.stats.cache_misses += 1;
        }

        let run_direction = reset_direction_to_positive(&axis);
        Some(PendingOpening {
            descriptor: OpeningDescriptor {
                host_id: host.id,
                candidate_id: candidate.id,
                merged_candidates: Vec::new(),
                level_id: host.level_id,
                origin: intersection.centroid,
                host_normal: host.normal,
                run_direction,
                width: size.width,
                height: size.height,
                shape: size.shape,
                description: size.data.description,
                type_fingerprint: size.fingerprint,
                selected: false,
            },
            volume: intersection.volume,
            frame: canonical_rotation(&axis, &intersection.centroid),
            points: intersection.solid.vertices().collect(),
        })
    }
}

impl<'s, D: HostDocument + ?Sized, K: GeometryKernel> Iterator for OpeningScan<'s, D, K> {
    type Item = Result<OpeningDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        let span = self.span.clone();
        let _enter = span.enter();

        loop {
            if self.finished {
                return None;
            }

            if let Some(opening) = self.pending.pop_front() {
                self.stats.emitted += 1;
                return Some(Ok(opening));
            }

            if self.cancel.is_cancelled() {
                let nothing_emitted = self.stats.emitted == 0;
                tracing::info!("Opening scan cancelled");
                self.finish();
                return nothing_emitted.then_some(Err(Error::Cancelled));
            }

            if !self.started {
                self.started = true;
                if !self.document.is_available() {
                    let err = self.unavailable();
                    tracing::warn!(error = %err, "Opening scan cannot start");
                    self.finish();
                    return Some(Err(err));
                }
                tracing::info!(
                    levels = self.levels.len(),
                    merge_distance = self.session.config.merge_distance(),
                    "Opening scan started"
                );
            }

            if let (Some(level_id), Some(host_id)) = (self.current_level, self.hosts.next()) {
                if let Some(openings) = self.scan_host(host_id, level_id) {
                    self.pending.extend(openings);
                }
                continue;
            }

            match self.levels.next() {
                Some(level) => {
                    if !self.document.is_available() {
                        let err = self.unavailable();
                        tracing::warn!(error = %err, level = %level.level_id, "Document lost during scan");
                        self.finish();
                        return Some(Err(err));
                    }
                    tracing::debug!(level = %level.level_id, hosts = level.host_ids.len(), "Scanning level");
                    self.current_level = Some(level.level_id);
                    self.hosts = level.host_ids.into_iter();
                }
                None => {
                    self.finish();
                    return None;
                }
            }
        }
    }
}
